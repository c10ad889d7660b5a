use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use bytes::Bytes;

use crate::acquisition::{AcquisitionFeed, FeedEvent, FrameStatus, RawFrame};
use crate::display::{
    DisplayConfig, DisplayLoop, DisplayState, LatestFrameRegistry, Renderer,
};
use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::convert::DisplayBuffer;
use crate::image_pipeline::format::{PixelEncoding, BGRA8, RGB8};
use crate::image_pipeline::planner::{ConversionPlan, DisplayCapabilities, PixelFormatPlanner};

struct ScriptedFeed {
    events: VecDeque<Result<FeedEvent>>,
    released: Arc<Mutex<Vec<u64>>>,
}

impl ScriptedFeed {
    fn new(events: Vec<Result<FeedEvent>>) -> (Self, Arc<Mutex<Vec<u64>>>) {
        let released = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                events: events.into(),
                released: released.clone(),
            },
            released,
        )
    }
}

impl AcquisitionFeed for ScriptedFeed {
    fn next_frame(&mut self, _timeout: Duration) -> Result<FeedEvent> {
        self.events.pop_front().unwrap_or(Ok(FeedEvent::EndOfStream))
    }

    fn release(&mut self, frame: RawFrame) {
        self.released.lock().unwrap().push(frame.sequence);
    }
}

/// Never produces a frame; each poll waits out its timeout.
struct IdleFeed;

impl AcquisitionFeed for IdleFeed {
    fn next_frame(&mut self, timeout: Duration) -> Result<FeedEvent> {
        thread::sleep(timeout);
        Ok(FeedEvent::Timeout)
    }
}

#[derive(Clone, Default)]
struct RecordingRenderer {
    rendered: Arc<Mutex<Vec<(PixelEncoding, usize, u8)>>>,
}

impl Renderer for RecordingRenderer {
    fn render(&mut self, frame: &DisplayBuffer<'_>) {
        self.rendered
            .lock()
            .unwrap()
            .push((frame.encoding, frame.data.len(), frame.data[0]));
    }
}

fn rgb_frame(sequence: u64, status: FrameStatus) -> RawFrame {
    RawFrame {
        encoding: RGB8,
        width: 4,
        height: 4,
        status,
        sequence,
        data: Bytes::from(vec![(sequence * 10 + 1) as u8; 4 * 4 * 3]),
    }
}

fn rgb_plan() -> ConversionPlan {
    PixelFormatPlanner::new(true).plan(RGB8, &DisplayCapabilities::x11(), 4, 4)
}

#[test]
fn test_only_complete_frames_render_in_order() {
    let frames: Vec<RawFrame> = (0..5)
        .map(|i| {
            let status = if i % 2 == 0 { FrameStatus::Ok } else { FrameStatus::Incomplete };
            rgb_frame(i, status)
        })
        .collect();
    let last_ok = frames[4].data.clone();
    let (feed, released) =
        ScriptedFeed::new(frames.into_iter().map(|f| Ok(FeedEvent::Frame(f))).collect());
    let renderer = RecordingRenderer::default();
    let registry = Arc::new(LatestFrameRegistry::new());

    let stats = DisplayLoop::new(
        feed,
        renderer.clone(),
        rgb_plan(),
        registry.clone(),
        DisplayConfig::default(),
    )
    .run();

    let rendered = renderer.rendered.lock().unwrap();
    assert_eq!(
        *rendered,
        vec![(BGRA8, 64, 1), (BGRA8, 64, 21), (BGRA8, 64, 41)]
    );
    assert_eq!(stats.rendered, 3);
    assert_eq!(stats.dropped_incomplete, 2);

    let latest = registry.get().unwrap();
    assert_eq!(latest.sequence, 4);
    assert_eq!(latest.data.as_ptr(), last_ok.as_ptr());
    // Each complete frame is held until the next one replaces it.
    assert_eq!(*released.lock().unwrap(), vec![1, 0, 3, 2, 4]);
}

#[test]
fn test_displaced_frame_released_unshared() {
    struct UniqueCheckFeed {
        events: VecDeque<FeedEvent>,
        unique_on_release: Arc<Mutex<Vec<(u64, bool)>>>,
    }

    impl AcquisitionFeed for UniqueCheckFeed {
        fn next_frame(&mut self, _timeout: Duration) -> Result<FeedEvent> {
            Ok(self.events.pop_front().unwrap_or(FeedEvent::EndOfStream))
        }

        fn release(&mut self, frame: RawFrame) {
            let sequence = frame.sequence;
            let unique = frame.data.try_into_mut().is_ok();
            self.unique_on_release.lock().unwrap().push((sequence, unique));
        }
    }

    let log = Arc::new(Mutex::new(Vec::new()));
    let feed = UniqueCheckFeed {
        events: (0..3).map(|i| FeedEvent::Frame(rgb_frame(i, FrameStatus::Ok))).collect(),
        unique_on_release: log.clone(),
    };
    let registry = Arc::new(LatestFrameRegistry::new());

    DisplayLoop::new(feed, RecordingRenderer::default(), rgb_plan(), registry.clone(), DisplayConfig::default())
        .run();

    // The last frame is still registered when the loop hands it back.
    assert_eq!(*log.lock().unwrap(), vec![(0, true), (1, true), (2, false)]);
    assert_eq!(registry.get().unwrap().sequence, 2);
}

#[test]
fn test_incomplete_frames_never_reach_registry() {
    let events = [FrameStatus::Incomplete, FrameStatus::TimedOut, FrameStatus::Overflow]
        .into_iter()
        .enumerate()
        .map(|(i, status)| Ok(FeedEvent::Frame(rgb_frame(i as u64, status))))
        .collect();
    let (feed, _) = ScriptedFeed::new(events);
    let renderer = RecordingRenderer::default();
    let registry = Arc::new(LatestFrameRegistry::new());

    let stats = DisplayLoop::new(feed, renderer.clone(), rgb_plan(), registry.clone(), DisplayConfig::default())
        .run();

    assert!(registry.get().is_none());
    assert!(renderer.rendered.lock().unwrap().is_empty());
    assert_eq!(stats.dropped_incomplete, 3);
}

#[test]
fn test_timeouts_and_feed_errors_keep_loop_alive() {
    let (feed, _) = ScriptedFeed::new(vec![
        Ok(FeedEvent::Timeout),
        Err(PipelineError::Acquisition("link down".to_string())),
        Ok(FeedEvent::Frame(rgb_frame(7, FrameStatus::Ok))),
    ]);
    let renderer = RecordingRenderer::default();
    let registry = Arc::new(LatestFrameRegistry::new());

    let stats = DisplayLoop::new(feed, renderer.clone(), rgb_plan(), registry.clone(), DisplayConfig::default())
        .run();

    assert_eq!(stats.timeouts, 1);
    assert_eq!(stats.feed_errors, 1);
    assert_eq!(stats.rendered, 1);
    assert_eq!(registry.get().unwrap().sequence, 7);
}

#[test]
fn test_undisplayable_frames_still_register() {
    let yuv = RawFrame {
        encoding: PixelEncoding::Yuv422,
        width: 2,
        height: 2,
        status: FrameStatus::Ok,
        sequence: 0,
        data: Bytes::from(vec![0x80; 8]),
    };
    let plan = PixelFormatPlanner::new(true).plan(PixelEncoding::Yuv422, &DisplayCapabilities::x11(), 2, 2);
    let (feed, _) = ScriptedFeed::new(vec![Ok(FeedEvent::Frame(yuv))]);
    let renderer = RecordingRenderer::default();
    let registry = Arc::new(LatestFrameRegistry::new());

    let stats = DisplayLoop::new(feed, renderer.clone(), plan, registry.clone(), DisplayConfig::default()).run();

    assert_eq!(stats.skipped, 1);
    assert!(renderer.rendered.lock().unwrap().is_empty());
    assert!(registry.get().is_some());
}

#[test]
fn test_stop_within_one_poll_timeout() {
    let poll = Duration::from_millis(50);
    let handle = DisplayLoop::spawn(
        IdleFeed,
        || Ok(RecordingRenderer::default()),
        rgb_plan(),
        Arc::new(LatestFrameRegistry::new()),
        DisplayConfig::default().with_poll_timeout(poll),
    )
    .unwrap();
    assert_eq!(handle.state(), DisplayState::Running);

    thread::sleep(Duration::from_millis(20));
    let signal = handle.stop_signal();
    let start = Instant::now();
    let stats = handle.stop().unwrap();

    assert!(start.elapsed() < poll + Duration::from_millis(250));
    assert_eq!(signal.state(), DisplayState::Stopped);
    assert!(stats.timeouts >= 1);
}

#[test]
fn test_renderer_failure_prevents_start() {
    let result = DisplayLoop::<IdleFeed, RecordingRenderer>::spawn(
        IdleFeed,
        || Err(PipelineError::DeviceOpen("no display".to_string())),
        rgb_plan(),
        Arc::new(LatestFrameRegistry::new()),
        DisplayConfig::default(),
    );
    assert!(matches!(result, Err(PipelineError::DeviceOpen(_))));
}

#[test]
fn test_dropping_handle_joins_loop() {
    let signal = {
        let handle = DisplayLoop::spawn(
            IdleFeed,
            || Ok(RecordingRenderer::default()),
            rgb_plan(),
            Arc::new(LatestFrameRegistry::new()),
            DisplayConfig::default().with_poll_timeout(Duration::from_millis(10)),
        )
        .unwrap();
        handle.stop_signal()
    };
    assert_eq!(signal.state(), DisplayState::Stopped);
}
