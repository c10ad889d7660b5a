use std::borrow::Cow;
use std::io::{Cursor, Write};

use tiff::encoder::colortype::{ColorType, Gray16, Gray8, RGB16, RGB8, RGBA8};
use tiff::encoder::compression::DeflateLevel;
use tiff::encoder::{Compression, TiffEncoder, TiffValue};
use tiff::tags::Predictor;
use tracing::debug;

use crate::image_pipeline::common::error::{SaveError, SaveResult};
use crate::image_pipeline::format::{ColorOrder, PixelEncoding};
use crate::image_pipeline::tiff::types::{SaveConfig, SaveImage, TiffCompression};
use crate::image_pipeline::tiff::writer::ImageWriter;

/// Writes grayscale (8/16-bit), RGB (8/16-bit) and RGBA8 frames. Samples
/// narrower than 16 bits are shifted up to fill the 16-bit range.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardTiffWriter;

fn compression_of(compression: TiffCompression) -> Compression {
    match compression {
        TiffCompression::None => Compression::Uncompressed,
        TiffCompression::Lzw => Compression::Lzw,
        TiffCompression::DeflateFast => Compression::Deflate(DeflateLevel::Fast),
        TiffCompression::DeflateBalanced => Compression::Deflate(DeflateLevel::Balanced),
        TiffCompression::DeflateBest => Compression::Deflate(DeflateLevel::Best),
    }
}

/// Little-endian 16-bit samples, shifted left by `shift`.
fn widen(data: &[u8], shift: u32) -> Vec<u16> {
    data.chunks_exact(2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]) << shift)
        .collect()
}

fn swap_red_blue<T: Copy>(samples: &mut [T], components: usize) {
    for px in samples.chunks_exact_mut(components) {
        px.swap(0, 2);
    }
}

impl StandardTiffWriter {
    fn encode<C>(&self, width: u32, height: u32, data: &[C::Inner], config: &SaveConfig) -> SaveResult<Vec<u8>>
    where
        C: ColorType,
        [C::Inner]: TiffValue,
    {
        let mut buffer = Vec::new();
        {
            let mut encoder = TiffEncoder::new(Cursor::new(&mut buffer))
                .map_err(|e| SaveError::EncodeError(e.to_string()))?
                .with_compression(compression_of(config.compression));

            if let Some(predictor_val) = config.predictor {
                let predictor = match predictor_val {
                    2 => Predictor::Horizontal,
                    _ => Predictor::None,
                };
                encoder = encoder.with_predictor(predictor);
            }

            encoder
                .write_image::<C>(width, height, data)
                .map_err(|e| SaveError::EncodeError(e.to_string()))?;
        }
        Ok(buffer)
    }
}

impl ImageWriter for StandardTiffWriter {
    fn write_image(&self, image: &SaveImage<'_>, output: &mut dyn Write, config: &SaveConfig) -> SaveResult<u64> {
        let (width, height) = (image.width, image.height);
        debug!("Encoding TIFF image: {}x{} {}", width, height, image.encoding);

        if width == 0 || height == 0 {
            return Err(SaveError::InvalidDimensions(width, height));
        }
        let needed = image.encoding.frame_len(width, height);
        if image.data.len() < needed {
            return Err(SaveError::ShortBuffer {
                expected: needed,
                actual: image.data.len(),
            });
        }
        let data = &image.data[..needed];

        let buffer = match image.encoding {
            PixelEncoding::Mono { depth: 1..=8, packed: false }
            | PixelEncoding::Bayer { depth: 1..=8, packed: false, .. } => {
                self.encode::<Gray8>(width, height, data, config)?
            }
            PixelEncoding::Mono { depth: depth @ 9..=16, packed: false }
            | PixelEncoding::Bayer { depth: depth @ 9..=16, packed: false, .. } => {
                let samples = widen(data, 16 - depth as u32);
                self.encode::<Gray16>(width, height, &samples, config)?
            }
            PixelEncoding::Rgb { order, depth: 8 } => {
                let mut rgb = Cow::Borrowed(data);
                if order == ColorOrder::Bgr {
                    swap_red_blue(rgb.to_mut(), 3);
                }
                self.encode::<RGB8>(width, height, &rgb, config)?
            }
            PixelEncoding::Rgb { order, depth: depth @ 9..=16 } => {
                let mut samples = widen(data, 16 - depth as u32);
                if order == ColorOrder::Bgr {
                    swap_red_blue(&mut samples, 3);
                }
                self.encode::<RGB16>(width, height, &samples, config)?
            }
            PixelEncoding::Rgba8 { order } => {
                let mut rgba = Cow::Borrowed(data);
                if order == ColorOrder::Bgr {
                    swap_red_blue(rgba.to_mut(), 4);
                }
                self.encode::<RGBA8>(width, height, &rgba, config)?
            }
            other => return Err(SaveError::UnsupportedFormat(other.to_string())),
        };

        output.write_all(&buffer)?;

        debug!("TIFF encoding complete");
        Ok(buffer.len() as u64)
    }
}
