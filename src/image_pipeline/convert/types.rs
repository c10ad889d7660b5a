use crate::image_pipeline::format::PixelEncoding;

/// A frame ready for the renderer: a view onto either the acquisition
/// buffer or the plan's scratch buffer.
#[derive(Debug, Clone, Copy)]
pub struct DisplayBuffer<'a> {
    pub encoding: PixelEncoding,
    /// Bits per pixel the renderer should assume.
    pub depth_bits: u32,
    pub width: u32,
    pub height: u32,
    pub data: &'a [u8],
}
