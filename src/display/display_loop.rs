use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;

use tracing::{debug, info, trace, warn};

use crate::acquisition::{AcquisitionFeed, FeedEvent, RawFrame};
use crate::display::registry::LatestFrameRegistry;
use crate::display::renderer::Renderer;
use crate::display::types::{DisplayConfig, DisplayState, DisplayStats, StopSignal};
use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::convert::FrameConverter;
use crate::image_pipeline::planner::ConversionPlan;

/// Consumer side of the pipeline: polls the feed, publishes complete frames
/// to the registry, converts them and hands them to the renderer.
///
/// Owns the feed and the plan's scratch buffer, so both are released only
/// after the loop has finished. The registered frame is held back from the
/// feed until a newer complete frame displaces it.
pub struct DisplayLoop<F, R> {
    feed: F,
    held: Option<RawFrame>,
    renderer: R,
    plan: ConversionPlan,
    converter: FrameConverter,
    registry: Arc<LatestFrameRegistry>,
    config: DisplayConfig,
    signal: StopSignal,
    stats: DisplayStats,
}

impl<F: AcquisitionFeed, R: Renderer> DisplayLoop<F, R> {
    pub fn new(
        feed: F,
        renderer: R,
        plan: ConversionPlan,
        registry: Arc<LatestFrameRegistry>,
        config: DisplayConfig,
    ) -> Self {
        Self::with_signal(feed, renderer, plan, registry, config, StopSignal::new())
    }

    fn with_signal(
        feed: F,
        renderer: R,
        plan: ConversionPlan,
        registry: Arc<LatestFrameRegistry>,
        config: DisplayConfig,
        signal: StopSignal,
    ) -> Self {
        Self {
            feed,
            held: None,
            renderer,
            plan,
            converter: FrameConverter::new(),
            registry,
            config,
            signal,
            stats: DisplayStats::default(),
        }
    }

    /// Runs until a stop is requested or the feed ends.
    pub fn run(mut self) -> DisplayStats {
        debug!(timeout_ms = self.config.poll_timeout.as_millis() as u64, "Display loop running");

        while !self.signal.is_stop_requested() {
            match self.feed.next_frame(self.config.poll_timeout) {
                Ok(FeedEvent::Frame(frame)) => self.handle_frame(frame),
                Ok(FeedEvent::Timeout) => {
                    self.stats.timeouts += 1;
                    trace!("No frame within poll timeout");
                }
                Ok(FeedEvent::EndOfStream) => {
                    info!("Acquisition feed ended");
                    break;
                }
                Err(e) => {
                    self.stats.feed_errors += 1;
                    warn!("Acquisition feed error: {}", e);
                }
            }
        }

        if let Some(frame) = self.held.take() {
            self.feed.release(frame);
        }
        self.signal.mark_stopped();
        info!(
            rendered = self.stats.rendered,
            incomplete = self.stats.dropped_incomplete,
            skipped = self.stats.skipped,
            "Display loop stopped"
        );
        self.stats
    }

    fn handle_frame(&mut self, frame: RawFrame) {
        self.stats.frames_received += 1;

        if !frame.is_complete() {
            self.stats.dropped_incomplete += 1;
            trace!(sequence = frame.sequence, status = ?frame.status, "Frame not complete, dropped");
            self.feed.release(frame);
            return;
        }

        let displaced = self.registry.set(&frame);

        match self.converter.convert(&frame, &mut self.plan) {
            Some(buffer) => {
                self.renderer.render(&buffer);
                self.stats.rendered += 1;
            }
            None => self.stats.skipped += 1,
        }

        // The displaced snapshot must go first, or the buffer is still shared.
        drop(displaced);
        if let Some(previous) = self.held.replace(frame) {
            self.feed.release(previous);
        }
    }
}

impl<F, R> DisplayLoop<F, R>
where
    F: AcquisitionFeed + Send + 'static,
    R: Renderer + 'static,
{
    /// Starts the loop on its own thread.
    ///
    /// `make_renderer` runs on the new thread; its failure is returned here
    /// and the loop never starts.
    pub fn spawn<M>(
        feed: F,
        make_renderer: M,
        plan: ConversionPlan,
        registry: Arc<LatestFrameRegistry>,
        config: DisplayConfig,
    ) -> Result<DisplayHandle>
    where
        M: FnOnce() -> Result<R> + Send + 'static,
    {
        let signal = StopSignal::new();
        let thread_signal = signal.clone();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<()>>();

        let thread = std::thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || {
                let renderer = match make_renderer() {
                    Ok(renderer) => renderer,
                    Err(e) => {
                        thread_signal.mark_stopped();
                        let _ = ready_tx.send(Err(e));
                        return DisplayStats::default();
                    }
                };
                let _ = ready_tx.send(Ok(()));
                DisplayLoop::with_signal(feed, renderer, plan, registry, config, thread_signal).run()
            })
            .map_err(|e| PipelineError::ThreadSpawn(e.to_string()))?;

        let ready = ready_rx
            .recv()
            .map_err(|_| PipelineError::ThreadSpawn("display thread exited during start-up".to_string()));
        match ready {
            Ok(Ok(())) => Ok(DisplayHandle {
                signal,
                thread: Some(thread),
            }),
            Ok(Err(e)) | Err(e) => {
                let _ = thread.join();
                Err(e)
            }
        }
    }
}

/// Control side of a spawned display loop. Dropping it stops and joins the
/// thread.
pub struct DisplayHandle {
    signal: StopSignal,
    thread: Option<JoinHandle<DisplayStats>>,
}

impl DisplayHandle {
    /// Takes effect within one poll timeout plus one frame.
    pub fn request_stop(&self) {
        self.signal.request_stop();
    }

    pub fn state(&self) -> DisplayState {
        self.signal.state()
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.signal.clone()
    }

    /// Waits for the loop to finish. A panicked loop yields `None`.
    pub fn join(mut self) -> Option<DisplayStats> {
        self.join_thread()
    }

    pub fn stop(self) -> Option<DisplayStats> {
        self.request_stop();
        self.join()
    }

    fn join_thread(&mut self) -> Option<DisplayStats> {
        let thread = self.thread.take()?;
        match thread.join() {
            Ok(stats) => Some(stats),
            Err(_) => {
                warn!("Display thread panicked");
                self.signal.mark_stopped();
                None
            }
        }
    }
}

impl Drop for DisplayHandle {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.signal.request_stop();
            self.join_thread();
        }
    }
}
