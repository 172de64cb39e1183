pub mod camera;
pub mod scanner;
