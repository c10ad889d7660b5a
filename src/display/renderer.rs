use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::image_pipeline::convert::DisplayBuffer;
use crate::image_pipeline::format::{ColorOrder, PixelEncoding};

/// Display backend. Lives on the display thread only.
pub trait Renderer {
    fn render(&mut self, frame: &DisplayBuffer<'_>);
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn render(&mut self, frame: &DisplayBuffer<'_>) {
        (**self).render(frame)
    }
}

/// Headless backend: counts frames and reports the rate at debug level.
#[derive(Debug)]
pub struct TracingRenderer {
    report_every: Duration,
    window_start: Instant,
    frames_in_window: u64,
    total: u64,
}

impl Default for TracingRenderer {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl TracingRenderer {
    pub fn new(report_every: Duration) -> Self {
        Self {
            report_every,
            window_start: Instant::now(),
            frames_in_window: 0,
            total: 0,
        }
    }

    pub fn frames_rendered(&self) -> u64 {
        self.total
    }
}

impl Renderer for TracingRenderer {
    fn render(&mut self, frame: &DisplayBuffer<'_>) {
        self.total += 1;
        self.frames_in_window += 1;
        trace!(
            width = frame.width,
            height = frame.height,
            depth = frame.depth_bits,
            bytes = frame.data.len(),
            "Frame rendered"
        );

        let elapsed = self.window_start.elapsed();
        if elapsed >= self.report_every {
            let fps = self.frames_in_window as f64 / elapsed.as_secs_f64();
            debug!(fps = format!("{:.1}", fps), total = self.total, encoding = %frame.encoding, "Display rate");
            self.window_start = Instant::now();
            self.frames_in_window = 0;
        }
    }
}

/// Packs a display buffer into `0RGB` words, one per pixel.
///
/// Returns `false` for layouts a 32-bit framebuffer cannot take directly.
pub fn pack_0rgb(frame: &DisplayBuffer<'_>, out: &mut Vec<u32>) -> bool {
    let count = frame.width as usize * frame.height as usize;
    out.clear();
    out.reserve(count);

    let gray = |g: u8| (g as u32) << 16 | (g as u32) << 8 | g as u32;
    let rgb = |r: u8, g: u8, b: u8| (r as u32) << 16 | (g as u32) << 8 | b as u32;

    match frame.encoding {
        PixelEncoding::Mono { depth: 1..=8, packed: false } if frame.data.len() >= count => {
            out.extend(frame.data[..count].iter().map(|&g| gray(g)));
        }
        PixelEncoding::Mono { depth, packed: false } if frame.data.len() >= count * 2 => {
            let shift = depth.saturating_sub(8);
            out.extend(
                frame.data[..count * 2]
                    .chunks_exact(2)
                    .map(|b| gray((u16::from_le_bytes([b[0], b[1]]) >> shift) as u8)),
            );
        }
        PixelEncoding::Rgba8 { order } if frame.data.len() >= count * 4 => {
            out.extend(frame.data[..count * 4].chunks_exact(4).map(|p| match order {
                ColorOrder::Rgb => rgb(p[0], p[1], p[2]),
                ColorOrder::Bgr => rgb(p[2], p[1], p[0]),
            }));
        }
        PixelEncoding::Rgb { order, depth: 8 } if frame.data.len() >= count * 3 => {
            out.extend(frame.data[..count * 3].chunks_exact(3).map(|p| match order {
                ColorOrder::Rgb => rgb(p[0], p[1], p[2]),
                ColorOrder::Bgr => rgb(p[2], p[1], p[0]),
            }));
        }
        _ => return false,
    }
    true
}

#[cfg(feature = "window")]
pub use window::WindowRenderer;

#[cfg(feature = "window")]
mod window {
    use minifb::{Window, WindowOptions};
    use tracing::{trace, warn};

    use super::{pack_0rgb, Renderer};
    use crate::image_pipeline::common::error::{PipelineError, Result};
    use crate::image_pipeline::convert::DisplayBuffer;

    /// On-screen backend. `minifb` windows are not `Send`, so build this on
    /// the display thread.
    pub struct WindowRenderer {
        window: Window,
        pixels: Vec<u32>,
    }

    impl WindowRenderer {
        pub fn open(title: &str, width: u32, height: u32) -> Result<Self> {
            let window = Window::new(
                title,
                width as usize,
                height as usize,
                WindowOptions {
                    resize: true,
                    ..WindowOptions::default()
                },
            )
            .map_err(|e| PipelineError::DeviceOpen(format!("window: {}", e)))?;
            Ok(Self {
                window,
                pixels: Vec::new(),
            })
        }
    }

    impl Renderer for WindowRenderer {
        fn render(&mut self, frame: &DisplayBuffer<'_>) {
            if !self.window.is_open() {
                return;
            }
            if !pack_0rgb(frame, &mut self.pixels) {
                trace!(encoding = %frame.encoding, "Layout not drawable, frame skipped");
                return;
            }
            if let Err(e) = self.window.update_with_buffer(
                &self.pixels,
                frame.width as usize,
                frame.height as usize,
            ) {
                warn!("Window update failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::format::{BGRA8, MONO16, MONO8};

    fn buffer(encoding: PixelEncoding, data: &[u8]) -> DisplayBuffer<'_> {
        DisplayBuffer {
            encoding,
            depth_bits: encoding.bits_per_pixel(),
            width: 2,
            height: 1,
            data,
        }
    }

    #[test]
    fn test_pack_gray_and_bgra() {
        let mut out = Vec::new();
        assert!(pack_0rgb(&buffer(MONO8, &[0x10, 0xFF]), &mut out));
        assert_eq!(out, vec![0x0010_1010, 0x00FF_FFFF]);

        assert!(pack_0rgb(&buffer(BGRA8, &[1, 2, 3, 0xFF, 4, 5, 6, 0xFF]), &mut out));
        assert_eq!(out, vec![0x0003_0201, 0x0006_0504]);
    }

    #[test]
    fn test_pack_deep_mono_keeps_high_bits() {
        let mut out = Vec::new();
        assert!(pack_0rgb(&buffer(MONO16, &[0x00, 0xAB, 0xFF, 0x01]), &mut out));
        assert_eq!(out, vec![0x00AB_ABAB, 0x0001_0101]);
    }

    #[test]
    fn test_pack_rejects_short_or_packed() {
        let mut out = Vec::new();
        assert!(!pack_0rgb(&buffer(BGRA8, &[0; 4]), &mut out));
        let packed = PixelEncoding::Mono { depth: 12, packed: true };
        assert!(!pack_0rgb(&buffer(packed, &[0; 3]), &mut out));
    }

    #[test]
    fn test_tracing_renderer_counts() {
        let mut renderer = TracingRenderer::new(Duration::from_millis(0));
        renderer.render(&buffer(MONO8, &[0, 0]));
        renderer.render(&buffer(MONO8, &[0, 0]));
        assert_eq!(renderer.frames_rendered(), 2);
    }
}
