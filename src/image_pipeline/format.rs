//! Device pixel format decoding.

pub mod types;

pub use types::{
    CfaPattern, ColorOrder, EncodingFamily, PixelEncoding, BGRA8, MONO16, MONO8, RGB8, RGBA8,
};
