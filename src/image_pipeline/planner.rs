//! Display-format planning
//!
//! Run once at stream setup: classifies the device encoding against what the
//! renderer accepts and sizes the conversion scratch buffer for the stream.

mod pixel_format_planner;
pub mod types;

pub use pixel_format_planner::PixelFormatPlanner;
pub use types::{ConversionPlan, DisplayCapabilities, FramePolicy};
