//! Types for display-format planning

use crate::image_pipeline::format::{ColorOrder, PixelEncoding};

/// What the rendering backend can consume without transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayCapabilities {
    /// 8-bit monochrome.
    pub mono8: bool,
    /// Unpacked monochrome of 9 to 16 bits in `u16` containers.
    pub mono16: bool,
    /// 24-bit interleaved colour in `preferred_order`.
    pub rgb24: bool,
    /// 32-bit colour with alpha in `preferred_order`.
    pub rgb32: bool,
    pub preferred_order: ColorOrder,
}

impl DisplayCapabilities {
    /// A little-endian X11 TrueColor visual.
    pub fn x11() -> Self {
        Self {
            mono8: true,
            mono16: true,
            rgb24: false,
            rgb32: true,
            preferred_order: ColorOrder::Bgr,
        }
    }

    /// Whether `encoding` can be handed to the renderer as-is.
    pub fn displays(&self, encoding: PixelEncoding) -> bool {
        match encoding {
            PixelEncoding::Mono { depth: 8, packed: false } => self.mono8,
            PixelEncoding::Mono { depth: 9..=16, packed: false } => self.mono16,
            PixelEncoding::Rgb { order, depth: 8 } => self.rgb24 && order == self.preferred_order,
            PixelEncoding::Rgba8 { order } => self.rgb32 && order == self.preferred_order,
            _ => false,
        }
    }

    /// The 32-bit colour encoding conversions target.
    pub fn rgb32_encoding(&self) -> PixelEncoding {
        PixelEncoding::Rgba8 { order: self.preferred_order }
    }
}

impl Default for DisplayCapabilities {
    fn default() -> Self {
        Self::x11()
    }
}

/// How every frame of a stream is handled on the display path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePolicy {
    /// Rendered straight from the acquisition buffer.
    Displayable,
    /// Demosaiced, reordered, resampled or gray-replicated to 32-bit colour.
    NeedsRgbConversion { target: PixelEncoding },
    /// Packed or too-deep monochrome brought to a displayable mono layout.
    NeedsUnpack { target: PixelEncoding },
    /// Dropped silently.
    Unsupported,
}

/// Result of planning a stream: policy plus the scratch buffer it needs.
#[derive(Debug)]
pub struct ConversionPlan {
    pub source: PixelEncoding,
    /// Encoding handed to the renderer. For CFA data shown without
    /// demosaicing this is the monochrome view of the source.
    pub target: PixelEncoding,
    pub target_depth_bits: u32,
    pub policy: FramePolicy,
    pub width: u32,
    pub height: u32,
    pub capabilities: DisplayCapabilities,
    /// Present iff `needs_conversion()`.
    pub(crate) scratch: Option<Vec<u8>>,
}

impl ConversionPlan {
    pub fn needs_conversion(&self) -> bool {
        matches!(
            self.policy,
            FramePolicy::NeedsRgbConversion { .. } | FramePolicy::NeedsUnpack { .. }
        )
    }

    pub fn is_displayable(&self) -> bool {
        self.policy != FramePolicy::Unsupported
    }

    pub fn scratch_len(&self) -> usize {
        self.scratch.as_ref().map_or(0, Vec::len)
    }

    /// Bytes a converted `width` x `height` frame occupies.
    pub fn converted_len(&self, width: u32, height: u32) -> usize {
        width as usize * height as usize * self.target_depth_bits.div_ceil(8) as usize
    }

    /// Whether a frame in `encoding` can go to the renderer without conversion.
    pub fn displays_as_is(&self, encoding: PixelEncoding) -> bool {
        self.policy == FramePolicy::Displayable
            && (encoding == self.source || self.capabilities.displays(encoding))
    }
}
