pub mod config;
pub mod crop;
pub mod device;
pub mod pixel;
pub mod reference_set;
pub mod scan_result;
