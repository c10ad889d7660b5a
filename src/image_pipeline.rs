//! Image processing pipeline module
//!
//! Pixel format decoding, display-format planning, per-frame conversion,
//! demosaicing and TIFF writing.

pub mod common;
pub mod convert;
pub mod debayer;
pub mod format;
pub mod planner;
pub mod tiff;

pub use common::{PipelineError, Result, SaveError, SaveResult};

pub use format::{CfaPattern, ColorOrder, EncodingFamily, PixelEncoding};

pub use planner::{ConversionPlan, DisplayCapabilities, FramePolicy, PixelFormatPlanner};

pub use convert::{DisplayBuffer, FrameConverter};

pub use debayer::CpuDebayer;

pub use tiff::{
    ImageWriter,
    SaveConfig,
    SaveConfigBuilder,
    SaveImage,
    StandardTiffWriter,
    TiffCompression,
};
