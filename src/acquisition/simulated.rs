//! In-process camera producing test-pattern frames.
//!
//! Stands in for a GigE Vision device: a feature map, snap/continuous
//! transfers paced by a frame interval, and a recycled buffer pool.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, info};

use crate::acquisition::device::{Camera, DeviceInfo, FeatureAccess, FrameCount, TransferControl};
use crate::acquisition::feed::AcquisitionFeed;
use crate::acquisition::pool::{BufferPool, PoolStats};
use crate::acquisition::types::{FeedEvent, FrameStatus, RawFrame};
use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::convert::unpack::{rescale, store_sample, SampleLayout};
use crate::image_pipeline::format::{CfaPattern, ColorOrder, PixelEncoding};

const TURBO_AVAILABLE: &str = "transferTurboCurrentlyAbailable";
const TURBO_SELECTOR: &str = "transferTurboCapabilitySelector";
const TURBO_MODE: &str = "transferTurboMode";

#[derive(Debug, Clone)]
pub struct SimulatedCameraConfig {
    pub width: u32,
    pub height: u32,
    pub encoding: PixelEncoding,
    pub frame_interval: Duration,
    /// Every n-th frame is delivered with `FrameStatus::Incomplete`.
    pub incomplete_every: Option<u64>,
    pub turbo_capable: bool,
    pub buffer_count: usize,
    pub info: DeviceInfo,
}

impl Default for SimulatedCameraConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            encoding: PixelEncoding::Bayer { cfa: CfaPattern::Rggb, depth: 8, packed: false },
            frame_interval: Duration::from_millis(33),
            incomplete_every: None,
            turbo_capable: true,
            buffer_count: 8,
            info: DeviceInfo {
                manufacturer: "Simulated".to_string(),
                model: "TestPattern".to_string(),
                serial: "S0000001".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                mac_high: 0x0001,
                mac_low: 0x0D12_3456,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Feature {
    Int(u32),
    /// Enumeration: numeric value plus symbolic name.
    Enum { value: u32, name: String },
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transfer {
    Idle,
    Snap { remaining: u32 },
    Continuous,
}

impl Transfer {
    fn is_active(&self) -> bool {
        !matches!(self, Transfer::Idle)
    }

    fn delivered_one(self) -> Self {
        match self {
            Transfer::Snap { remaining } if remaining > 1 => Transfer::Snap { remaining: remaining - 1 },
            Transfer::Snap { .. } => Transfer::Idle,
            other => other,
        }
    }
}

struct State {
    transfer: Transfer,
    next_due: Instant,
    sequence: u64,
    features: HashMap<String, Feature>,
    closed: bool,
}

struct Shared {
    config: SimulatedCameraConfig,
    state: Mutex<State>,
    wake: Condvar,
    pool: BufferPool,
}

pub struct SimulatedCamera {
    shared: Arc<Shared>,
}

impl SimulatedCamera {
    pub fn open(config: SimulatedCameraConfig) -> Result<Self> {
        if config.width == 0 || config.height == 0 {
            return Err(PipelineError::InvalidDimensions(config.width, config.height));
        }
        let frame_bytes = config.encoding.frame_len(config.width, config.height);
        if frame_bytes == 0 {
            return Err(PipelineError::DeviceOpen(format!(
                "cannot generate frames in {}",
                config.encoding
            )));
        }

        let mut features = HashMap::new();
        features.insert("Width".to_string(), Feature::Int(config.width));
        features.insert("Height".to_string(), Feature::Int(config.height));
        features.insert("PayloadSize".to_string(), Feature::Int(frame_bytes as u32));
        features.insert(
            "PixelFormat".to_string(),
            Feature::Enum {
                value: config.encoding.code(),
                name: config.encoding.to_string(),
            },
        );
        features.insert("DeviceModelName".to_string(), Feature::Str(config.info.model.clone()));
        if config.turbo_capable {
            features.insert(TURBO_AVAILABLE.to_string(), Feature::Int(1));
            features.insert(TURBO_MODE.to_string(), Feature::Int(0));
        }

        info!(
            width = config.width,
            height = config.height,
            encoding = %config.encoding,
            frame_bytes,
            "Simulated camera opened"
        );

        let pool = BufferPool::new(frame_bytes, config.buffer_count);
        Ok(Self {
            shared: Arc::new(Shared {
                config,
                state: Mutex::new(State {
                    transfer: Transfer::Idle,
                    next_due: Instant::now(),
                    sequence: 0,
                    features,
                    closed: false,
                }),
                wake: Condvar::new(),
                pool,
            }),
        })
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.shared.pool.stats()
    }

    /// Ends every open feed with `EndOfStream`.
    pub fn close(&self) {
        self.shared.state.lock().closed = true;
        self.shared.wake.notify_all();
    }

    fn set_transfer(&self, transfer: Transfer) -> Result<()> {
        let mut state = self.shared.state.lock();
        if state.closed {
            return Err(PipelineError::TransferCommand("camera closed".to_string()));
        }
        state.transfer = transfer;
        state.next_due = Instant::now();
        drop(state);
        self.shared.wake.notify_all();
        Ok(())
    }
}

impl TransferControl for SimulatedCamera {
    fn start_transfer(&self, count: FrameCount) -> Result<()> {
        let transfer = match count {
            FrameCount::Snap(0) => {
                return Err(PipelineError::TransferCommand("snap of zero frames".to_string()));
            }
            FrameCount::Snap(n) => Transfer::Snap { remaining: n },
            FrameCount::Continuous => Transfer::Continuous,
        };
        debug!(?count, "Transfer started");
        self.set_transfer(transfer)
    }

    fn stop_transfer(&self) -> Result<()> {
        debug!("Transfer stopped");
        self.set_transfer(Transfer::Idle)
    }

    fn abort_transfer(&self) -> Result<()> {
        debug!("Transfer aborted");
        self.set_transfer(Transfer::Idle)
    }
}

impl FeatureAccess for SimulatedCamera {
    fn get_u32(&self, name: &str) -> Result<u32> {
        match self.shared.state.lock().features.get(name) {
            Some(Feature::Int(v)) | Some(Feature::Enum { value: v, .. }) => Ok(*v),
            Some(Feature::Str(_)) => Err(PipelineError::feature(name, "not an integer feature")),
            None => Err(PipelineError::feature(name, "not present")),
        }
    }

    fn set_u32(&self, name: &str, value: u32) -> Result<()> {
        let mut state = self.shared.state.lock();
        match state.features.get_mut(name) {
            Some(Feature::Int(v)) if name == TURBO_MODE => {
                *v = u32::from(value != 0);
                Ok(())
            }
            Some(_) => Err(PipelineError::feature(name, "read-only")),
            None => Err(PipelineError::feature(name, "not present")),
        }
    }

    fn get_string(&self, name: &str) -> Result<String> {
        match self.shared.state.lock().features.get(name) {
            Some(Feature::Str(s)) | Some(Feature::Enum { name: s, .. }) => Ok(s.clone()),
            Some(Feature::Int(v)) => Ok(v.to_string()),
            None => Err(PipelineError::feature(name, "not present")),
        }
    }

    fn set_string(&self, name: &str, value: &str) -> Result<()> {
        let mut state = self.shared.state.lock();
        if name == TURBO_SELECTOR && self.shared.config.turbo_capable {
            state.features.insert(name.to_string(), Feature::Str(value.to_string()));
            return Ok(());
        }
        match state.features.get(name) {
            Some(Feature::Enum { name: current, .. }) if current == value => Ok(()),
            Some(_) => Err(PipelineError::feature(name, "read-only")),
            None => Err(PipelineError::feature(name, "not present")),
        }
    }
}

impl Camera for SimulatedCamera {
    type Feed = SimulatedFeed;

    fn info(&self) -> DeviceInfo {
        self.shared.config.info.clone()
    }

    fn open_feed(&self) -> Result<SimulatedFeed> {
        Ok(SimulatedFeed { shared: Arc::clone(&self.shared) })
    }
}

pub struct SimulatedFeed {
    shared: Arc<Shared>,
}

impl AcquisitionFeed for SimulatedFeed {
    fn next_frame(&mut self, timeout: Duration) -> Result<FeedEvent> {
        let shared = &*self.shared;
        let deadline = Instant::now() + timeout;
        let mut state = shared.state.lock();

        loop {
            if state.closed {
                return Ok(FeedEvent::EndOfStream);
            }
            let now = Instant::now();
            if state.transfer.is_active() && now >= state.next_due {
                break;
            }
            if now >= deadline {
                return Ok(FeedEvent::Timeout);
            }
            let wake_at = if state.transfer.is_active() {
                state.next_due.min(deadline)
            } else {
                deadline
            };
            shared.wake.wait_until(&mut state, wake_at);
        }

        let sequence = state.sequence;
        state.sequence += 1;
        state.transfer = state.transfer.delivered_one();
        let interval = match state.features.get(TURBO_MODE) {
            Some(Feature::Int(1)) => shared.config.frame_interval / 2,
            _ => shared.config.frame_interval,
        };
        state.next_due = Instant::now() + interval;
        drop(state);

        Ok(FeedEvent::Frame(shared.render(sequence)))
    }

    fn release(&mut self, frame: RawFrame) {
        self.shared.pool.recycle(frame.data);
    }
}

impl Shared {
    fn render(&self, sequence: u64) -> RawFrame {
        let config = &self.config;
        let mut buf = self.pool.acquire();
        fill_test_pattern(&mut buf, config.encoding, config.width, config.height, sequence);

        let status = match config.incomplete_every {
            Some(n) if n > 0 && (sequence + 1) % n == 0 => FrameStatus::Incomplete,
            _ => FrameStatus::Ok,
        };

        RawFrame {
            encoding: config.encoding,
            width: config.width,
            height: config.height,
            status,
            sequence,
            data: buf.freeze(),
        }
    }
}

/// Colour at CFA site (x, y): 0 red, 1 green, 2 blue.
fn cfa_channel(cfa: CfaPattern, x: usize, y: usize) -> usize {
    let site = (y % 2) * 2 + x % 2;
    let layout = match cfa {
        CfaPattern::Rggb => [0, 1, 1, 2],
        CfaPattern::Grbg => [1, 0, 2, 1],
        CfaPattern::Gbrg => [1, 2, 0, 1],
        CfaPattern::Bggr => [2, 1, 1, 0],
    };
    layout[site]
}

/// Horizontal red ramp scrolling with the sequence, vertical green ramp,
/// blue as the red complement.
fn pattern_rgb(x: usize, y: usize, width: usize, height: usize, sequence: u64) -> [u8; 3] {
    let shift = (sequence.wrapping_mul(4) & 0xFF) as usize;
    let r = ((x * 256 / width.max(1) + shift) & 0xFF) as u8;
    let g = ((y * 256 / height.max(1)) & 0xFF) as u8;
    [r, g, 255 - r]
}

fn fill_test_pattern(buf: &mut [u8], encoding: PixelEncoding, width: u32, height: u32, sequence: u64) {
    let (w, h) = (width as usize, height as usize);
    let depth = encoding.bits_per_component();

    match encoding {
        PixelEncoding::Mono { .. } | PixelEncoding::Bayer { .. } => {
            let Some(layout) = SampleLayout::of(encoding) else {
                buf.fill(0);
                return;
            };
            for y in 0..h {
                for x in 0..w {
                    let rgb = pattern_rgb(x, y, w, h, sequence);
                    let level = match encoding {
                        PixelEncoding::Bayer { cfa, .. } => rgb[cfa_channel(cfa, x, y)],
                        _ => ((rgb[0] as u16 + rgb[1] as u16 + rgb[2] as u16) / 3) as u8,
                    };
                    store_sample(buf, layout, y * w + x, rescale(level as u16, 8, depth));
                }
            }
        }
        PixelEncoding::Rgb { order, .. } | PixelEncoding::Rgba8 { order } => {
            let bpp = encoding.bytes_per_pixel();
            let wide = depth > 8;
            for y in 0..h {
                for x in 0..w {
                    let mut rgb = pattern_rgb(x, y, w, h, sequence);
                    if order == ColorOrder::Bgr {
                        rgb.swap(0, 2);
                    }
                    let px = &mut buf[(y * w + x) * bpp..(y * w + x + 1) * bpp];
                    if wide {
                        for (c, v) in rgb.iter().enumerate() {
                            let v = rescale(*v as u16, 8, depth);
                            px[c * 2..c * 2 + 2].copy_from_slice(&v.to_le_bytes());
                        }
                    } else {
                        px[..3].copy_from_slice(&rgb);
                        if bpp == 4 {
                            px[3] = 0xFF;
                        }
                    }
                }
            }
        }
        PixelEncoding::Yuv422 => buf.fill(0x80),
        PixelEncoding::Other(_) => buf.fill(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera(encoding: PixelEncoding) -> SimulatedCamera {
        SimulatedCamera::open(SimulatedCameraConfig {
            width: 8,
            height: 4,
            encoding,
            frame_interval: Duration::from_millis(1),
            ..Default::default()
        })
        .unwrap()
    }

    fn next(feed: &mut SimulatedFeed) -> FeedEvent {
        feed.next_frame(Duration::from_millis(200)).unwrap()
    }

    #[test]
    fn test_setup_features() {
        let cam = camera(PixelEncoding::Mono { depth: 12, packed: true });
        assert_eq!(cam.get_u32("Width").unwrap(), 8);
        assert_eq!(cam.get_u32("Height").unwrap(), 4);
        assert_eq!(cam.get_u32("PayloadSize").unwrap(), 48);
        assert_eq!(cam.get_u32("PixelFormat").unwrap(), 0x010C_0006);
        assert_eq!(cam.get_string("PixelFormat").unwrap(), "Mono12Packed");
        assert!(cam.get_u32("Gain").is_err());
    }

    #[test]
    fn test_idle_feed_times_out() {
        let cam = camera(PixelEncoding::Mono { depth: 8, packed: false });
        let mut feed = cam.open_feed().unwrap();
        let start = Instant::now();
        let event = feed.next_frame(Duration::from_millis(20)).unwrap();
        assert!(matches!(event, FeedEvent::Timeout));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_snap_delivers_exact_count() {
        let cam = camera(PixelEncoding::Mono { depth: 8, packed: false });
        let mut feed = cam.open_feed().unwrap();
        cam.start_transfer(FrameCount::Snap(3)).unwrap();

        for expected in 0..3 {
            match next(&mut feed) {
                FeedEvent::Frame(frame) => {
                    assert_eq!(frame.sequence, expected);
                    assert_eq!(frame.data.len(), 32);
                    feed.release(frame);
                }
                other => panic!("expected frame, got {:?}", other),
            }
        }
        assert!(matches!(feed.next_frame(Duration::from_millis(20)).unwrap(), FeedEvent::Timeout));
    }

    #[test]
    fn test_incomplete_frames_are_flagged() {
        let cam = SimulatedCamera::open(SimulatedCameraConfig {
            width: 4,
            height: 4,
            frame_interval: Duration::from_millis(1),
            incomplete_every: Some(2),
            ..Default::default()
        })
        .unwrap();
        let mut feed = cam.open_feed().unwrap();
        cam.start_transfer(FrameCount::Continuous).unwrap();

        let statuses: Vec<FrameStatus> = (0..4)
            .map(|_| match next(&mut feed) {
                FeedEvent::Frame(frame) => frame.status,
                other => panic!("expected frame, got {:?}", other),
            })
            .collect();
        assert_eq!(
            statuses,
            vec![FrameStatus::Ok, FrameStatus::Incomplete, FrameStatus::Ok, FrameStatus::Incomplete]
        );
    }

    #[test]
    fn test_close_ends_stream() {
        let cam = camera(PixelEncoding::Mono { depth: 8, packed: false });
        let mut feed = cam.open_feed().unwrap();
        cam.close();
        assert!(matches!(next(&mut feed), FeedEvent::EndOfStream));
        assert!(cam.start_transfer(FrameCount::Continuous).is_err());
    }

    #[test]
    fn test_released_buffers_are_reused() {
        let cam = camera(PixelEncoding::Mono { depth: 8, packed: false });
        let mut feed = cam.open_feed().unwrap();
        cam.start_transfer(FrameCount::Continuous).unwrap();
        for _ in 0..20 {
            if let FeedEvent::Frame(frame) = next(&mut feed) {
                feed.release(frame);
            }
        }
        let stats = cam.pool_stats();
        assert_eq!(stats.alloc_count, stats.capacity);
        assert_eq!(stats.acquire_count, 20);
    }

    #[test]
    fn test_turbo_features() {
        let cam = camera(PixelEncoding::Mono { depth: 8, packed: false });
        assert_eq!(cam.get_u32(TURBO_AVAILABLE).unwrap(), 1);
        cam.set_u32(TURBO_MODE, 1).unwrap();
        assert_eq!(cam.get_u32(TURBO_MODE).unwrap(), 1);
        assert!(cam.set_u32("Width", 16).is_err());
    }

    #[test]
    fn test_bayer_pattern_follows_cfa() {
        let buf_len = 4 * 2;
        let mut buf = vec![0u8; buf_len];
        let enc = PixelEncoding::Bayer { cfa: CfaPattern::Rggb, depth: 8, packed: false };
        fill_test_pattern(&mut buf, enc, 4, 2, 0);
        // red site at (0,0), blue site at (1,1)
        let rgb00 = pattern_rgb(0, 0, 4, 2, 0);
        let rgb11 = pattern_rgb(1, 1, 4, 2, 0);
        assert_eq!(buf[0], rgb00[0]);
        assert_eq!(buf[5], rgb11[2]);
    }
}
