//! TIFF writing module
//!
//! Encodes saved frames as TIFF with the configured compression.

mod standard_tiff_writer;
pub mod types;
mod writer;

pub use standard_tiff_writer::StandardTiffWriter;
pub use types::{SaveConfig, SaveConfigBuilder, SaveImage, TiffCompression};
pub use writer::ImageWriter;
