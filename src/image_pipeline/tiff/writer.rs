use std::io::Write;

use crate::image_pipeline::common::error::SaveResult;
use crate::image_pipeline::tiff::types::{SaveConfig, SaveImage};

pub trait ImageWriter {
    /// File extension, without the dot.
    fn extension(&self) -> &'static str {
        "tif"
    }

    /// Encodes `image` into `output` and returns the number of bytes written.
    fn write_image(&self, image: &SaveImage<'_>, output: &mut dyn Write, config: &SaveConfig) -> SaveResult<u64>;
}
