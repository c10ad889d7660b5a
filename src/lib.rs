pub mod acquisition;
pub mod display;
pub mod image_pipeline;
pub mod logger;
pub mod save;
pub mod session;
