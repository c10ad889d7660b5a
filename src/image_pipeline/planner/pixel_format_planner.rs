use tracing::{debug, info};

use crate::image_pipeline::format::{EncodingFamily, PixelEncoding, MONO8};
use crate::image_pipeline::planner::types::{ConversionPlan, DisplayCapabilities, FramePolicy};

/// Decides once per stream how frames reach the display.
#[derive(Debug, Clone, Copy)]
pub struct PixelFormatPlanner {
    bayer_conversion: bool,
}

impl PixelFormatPlanner {
    /// `bayer_conversion` selects demosaicing for CFA formats; without it CFA
    /// data is shown as monochrome.
    pub fn new(bayer_conversion: bool) -> Self {
        Self { bayer_conversion }
    }

    pub fn classify(&self, encoding: PixelEncoding, capabilities: &DisplayCapabilities) -> FramePolicy {
        if capabilities.displays(encoding) {
            return FramePolicy::Displayable;
        }

        match encoding.family() {
            EncodingFamily::Bayer if self.bayer_conversion => Self::rgb_policy(capabilities),
            EncodingFamily::Bayer => Self::mono_policy(encoding.as_mono(), capabilities),
            EncodingFamily::Monochrome => Self::mono_policy(encoding, capabilities),
            EncodingFamily::Rgb => Self::rgb_policy(capabilities),
            EncodingFamily::Yuv | EncodingFamily::Unknown => FramePolicy::Unsupported,
        }
    }

    fn rgb_policy(capabilities: &DisplayCapabilities) -> FramePolicy {
        if capabilities.rgb32 {
            FramePolicy::NeedsRgbConversion { target: capabilities.rgb32_encoding() }
        } else {
            FramePolicy::Unsupported
        }
    }

    fn mono_policy(mono: PixelEncoding, capabilities: &DisplayCapabilities) -> FramePolicy {
        let unpacked = mono.unpacked();
        if capabilities.displays(unpacked) {
            if unpacked == mono {
                FramePolicy::Displayable
            } else {
                FramePolicy::NeedsUnpack { target: unpacked }
            }
        } else if capabilities.mono8 {
            FramePolicy::NeedsUnpack { target: MONO8 }
        } else {
            Self::rgb_policy(capabilities)
        }
    }

    /// Builds the stream's plan and allocates its scratch buffer.
    pub fn plan(
        &self,
        encoding: PixelEncoding,
        capabilities: &DisplayCapabilities,
        width: u32,
        height: u32,
    ) -> ConversionPlan {
        let policy = self.classify(encoding, capabilities);
        let target = match policy {
            FramePolicy::NeedsRgbConversion { target } | FramePolicy::NeedsUnpack { target } => target,
            FramePolicy::Displayable if !capabilities.displays(encoding) => encoding.as_mono(),
            FramePolicy::Displayable | FramePolicy::Unsupported => encoding,
        };
        let target_depth_bits = target.bits_per_pixel();

        let mut plan = ConversionPlan {
            source: encoding,
            target,
            target_depth_bits,
            policy,
            width,
            height,
            capabilities: *capabilities,
            scratch: None,
        };
        if plan.needs_conversion() {
            plan.scratch = Some(vec![0u8; plan.converted_len(width, height)]);
        }

        match policy {
            FramePolicy::Unsupported => info!(
                "{} frames cannot be displayed; they will be skipped", encoding
            ),
            _ => info!(
                source = %encoding,
                target = %target,
                depth = target_depth_bits,
                scratch_bytes = plan.scratch_len(),
                "Display format planned"
            ),
        }
        debug!(?policy, width, height, "Conversion plan");
        plan
    }
}
