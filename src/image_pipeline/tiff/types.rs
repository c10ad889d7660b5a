//! Image save configuration types

use std::path::PathBuf;

use crate::image_pipeline::format::PixelEncoding;

/// TIFF compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TiffCompression {
    /// No compression (fastest, largest file)
    None,
    /// LZW compression
    Lzw,
    /// Deflate compression - fast level
    DeflateFast,
    /// Deflate compression - best compression (slower)
    DeflateBest,
    /// Deflate compression - balanced
    DeflateBalanced,
}

/// A frame ready for the encoder: byte-aligned samples, little-endian when
/// wider than 8 bits.
#[derive(Debug, Clone, Copy)]
pub struct SaveImage<'a> {
    pub encoding: PixelEncoding,
    pub width: u32,
    pub height: u32,
    pub data: &'a [u8],
}

/// Configuration for saving acquired frames
#[derive(Debug, Clone)]
pub struct SaveConfig {
    pub compression: TiffCompression,
    /// Predictor value for compression (2 for horizontal differencing)
    pub predictor: Option<u16>,
    /// Directory the files are written to
    pub output_dir: PathBuf,
    /// File name prefix; a timestamp suffix is appended per save
    pub base_name: String,
    /// Whether CFA frames are demosaiced to RGB before saving (true) or
    /// written as grayscale mosaics (false)
    pub bayer_conversion: bool,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            compression: TiffCompression::None,
            predictor: None,
            output_dir: PathBuf::from("."),
            base_name: "img".to_string(),
            bayer_conversion: true,
        }
    }
}

impl SaveConfig {
    pub fn builder() -> SaveConfigBuilder {
        SaveConfigBuilder::default()
    }
}

/// Builder for SaveConfig
#[derive(Default)]
pub struct SaveConfigBuilder {
    compression: Option<TiffCompression>,
    predictor: Option<Option<u16>>,
    output_dir: Option<PathBuf>,
    base_name: Option<String>,
    bayer_conversion: Option<bool>,
}

impl SaveConfigBuilder {
    pub fn compression(mut self, compression: TiffCompression) -> Self {
        self.compression = Some(compression);
        self
    }

    pub fn predictor(mut self, predictor: Option<u16>) -> Self {
        self.predictor = Some(predictor);
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn base_name(mut self, name: impl Into<String>) -> Self {
        self.base_name = Some(name.into());
        self
    }

    pub fn bayer_conversion(mut self, enable: bool) -> Self {
        self.bayer_conversion = Some(enable);
        self
    }

    pub fn build(self) -> SaveConfig {
        let default = SaveConfig::default();
        SaveConfig {
            compression: self.compression.unwrap_or(default.compression),
            predictor: self.predictor.unwrap_or(default.predictor),
            output_dir: self.output_dir.unwrap_or(default.output_dir),
            base_name: self.base_name.unwrap_or(default.base_name),
            bayer_conversion: self.bayer_conversion.unwrap_or(default.bayer_conversion),
        }
    }
}
