use anyhow::{bail, ensure, Result};
use tracing::trace;

use crate::acquisition::RawFrame;
use crate::image_pipeline::convert::color::{
    expand_rgb_to_rgba_in_place, mono_to_rgba, rgb_to_rgba, rgba_reorder,
};
use crate::image_pipeline::convert::types::DisplayBuffer;
use crate::image_pipeline::convert::unpack::{for_each_sample, to_u8, unpack_mono, SampleLayout};
use crate::image_pipeline::debayer::CpuDebayer;
use crate::image_pipeline::format::PixelEncoding;
use crate::image_pipeline::planner::{ConversionPlan, FramePolicy};

/// Turns acquired frames into renderer input according to a [`ConversionPlan`].
///
/// Holds no per-stream state; the only thing written is the plan's scratch
/// buffer, so one plan must not be shared between threads.
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameConverter {
    debayer: CpuDebayer,
}

impl FrameConverter {
    pub fn new() -> Self {
        Self { debayer: CpuDebayer::new() }
    }

    /// Returns `None` when the frame cannot be shown; callers skip it.
    pub fn convert<'a>(
        &self,
        frame: &'a RawFrame,
        plan: &'a mut ConversionPlan,
    ) -> Option<DisplayBuffer<'a>> {
        let (width, height) = (frame.width, frame.height);

        match plan.policy {
            FramePolicy::Displayable => {
                if !plan.displays_as_is(frame.encoding) {
                    trace!(encoding = %frame.encoding, "Frame encoding differs from plan, skipped");
                    return None;
                }
                let needed = frame.encoding.frame_len(width, height);
                if frame.data.len() < needed {
                    trace!(needed, actual = frame.data.len(), "Short frame buffer, skipped");
                    return None;
                }
                let encoding = if plan.capabilities.displays(frame.encoding) {
                    frame.encoding
                } else {
                    plan.target
                };
                Some(DisplayBuffer {
                    encoding,
                    depth_bits: encoding.bits_per_pixel(),
                    width,
                    height,
                    data: &frame.data,
                })
            }
            FramePolicy::NeedsRgbConversion { target } | FramePolicy::NeedsUnpack { target } => {
                let len = plan.converted_len(width, height);
                let depth_bits = plan.target_depth_bits;
                let scratch = plan.scratch.as_mut()?;
                if len > scratch.len() {
                    trace!(len, scratch = scratch.len(), "Frame larger than scratch buffer, skipped");
                    return None;
                }
                if let Err(e) = self.transform(frame, target, &mut scratch[..len]) {
                    trace!("Conversion to {} failed, frame skipped: {}", target, e);
                    return None;
                }
                Some(DisplayBuffer {
                    encoding: target,
                    depth_bits,
                    width,
                    height,
                    data: &scratch[..len],
                })
            }
            FramePolicy::Unsupported => None,
        }
    }

    fn transform(&self, frame: &RawFrame, target: PixelEncoding, dst: &mut [u8]) -> Result<()> {
        let (width, height) = (frame.width as usize, frame.height as usize);
        let count = width * height;
        let src: &[u8] = &frame.data;

        match (frame.encoding, target) {
            (PixelEncoding::Bayer { cfa, depth, .. }, PixelEncoding::Rgba8 { order }) => {
                let layout = SampleLayout::of(frame.encoding)
                    .ok_or_else(|| anyhow::anyhow!("{} has no sample layout", frame.encoding))?;
                if layout == SampleLayout::U8 {
                    ensure!(src.len() >= count, "CFA buffer holds {} bytes, {} needed", src.len(), count);
                    return self.debayer.demosaic_rgba8(&src[..count], width, height, cfa, order, dst);
                }
                // Stage the 8-bit mosaic in the last quarter of the output
                // (the alpha share) and demosaic into the front.
                ensure!(dst.len() >= count * 4, "RGBA buffer too small");
                let (rgb, tail) = dst.split_at_mut(count * 3);
                let depth = depth as u32;
                for_each_sample(src, layout, count, |i, v| tail[i] = to_u8(v, depth))?;
                self.debayer.demosaic_rgb8(&tail[..count], width, height, cfa, rgb)?;
                expand_rgb_to_rgba_in_place(dst, count, order);
                Ok(())
            }
            (
                PixelEncoding::Mono { .. } | PixelEncoding::Bayer { .. },
                PixelEncoding::Mono { depth, packed: false },
            ) => unpack_mono(src, frame.encoding, count, dst, depth as u32),
            (PixelEncoding::Mono { .. }, PixelEncoding::Rgba8 { order }) => {
                mono_to_rgba(src, frame.encoding, count, dst, order)
            }
            (PixelEncoding::Rgb { order: source_order, depth }, PixelEncoding::Rgba8 { order }) => {
                rgb_to_rgba(src, source_order, depth as u32, count, dst, order)
            }
            (PixelEncoding::Rgba8 { order: source_order }, PixelEncoding::Rgba8 { order }) => {
                rgba_reorder(src, source_order, count, dst, order)
            }
            (source, target) => bail!("no conversion from {} to {}", source, target),
        }
    }
}
