pub mod alphabet_loader;
pub mod camera;
pub mod capture_loop;
pub mod config;
pub mod decoder;
pub mod frame_source;
pub mod logging;
pub mod pipeline;
pub mod scan;
pub mod template_loader;
