//! Frame conversion for display
//!
//! Unpacking, colour reordering, bit-depth resampling and demosaicing of
//! acquired frames into the plan's scratch buffer.

pub mod color;
mod frame_converter;
pub mod types;
pub mod unpack;

#[cfg(test)]
mod tests;

pub use frame_converter::FrameConverter;
pub use types::DisplayBuffer;
pub use unpack::SampleLayout;
