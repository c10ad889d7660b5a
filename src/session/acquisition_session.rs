use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use crate::acquisition::{Camera, FeatureAccess, FrameCount};
use crate::display::{DisplayHandle, DisplayLoop, DisplayState, DisplayStats, LatestFrameRegistry, Renderer};
use crate::image_pipeline::common::error::{PipelineError, Result, SaveError};
use crate::image_pipeline::format::PixelEncoding;
use crate::image_pipeline::planner::PixelFormatPlanner;
use crate::image_pipeline::tiff::StandardTiffWriter;
use crate::save::{FrameSaver, SavedImage};
use crate::session::command::{Command, MENU};
use crate::session::config::SessionConfig;
use crate::session::turbo::{is_turbo_available, toggle_turbo};

/// Stream geometry read from the device at setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFormat {
    pub width: u32,
    pub height: u32,
    pub encoding: PixelEncoding,
    pub payload_size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurboState {
    Enabled,
    Disabled,
    Unavailable,
}

/// What a command did, for the operator.
#[derive(Debug)]
pub enum CommandOutcome {
    Done,
    Menu,
    Turbo(TurboState),
    Saved(SavedImage),
    SaveFailed(SaveError),
    Quit,
}

impl fmt::Display for CommandOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandOutcome::Done | CommandOutcome::Quit => Ok(()),
            CommandOutcome::Menu => write!(f, "{}", MENU),
            CommandOutcome::Turbo(TurboState::Enabled) => write!(f, "TurboMode Enabled"),
            CommandOutcome::Turbo(TurboState::Disabled) => write!(f, "TurboMode Disabled"),
            CommandOutcome::Turbo(TurboState::Unavailable) => write!(
                f,
                "*** TurboDrive is NOT Available for this device/pixel format combination ***"
            ),
            CommandOutcome::Saved(saved) => write!(
                f,
                "Image saved as : {} : {} bytes written",
                saved.path.display(),
                saved.bytes_written
            ),
            CommandOutcome::SaveFailed(SaveError::NoFrameYet) => {
                write!(f, "No image buffer has been acquired yet !")
            }
            CommandOutcome::SaveFailed(e) => write!(f, "Error saving image: {}", e),
        }
    }
}

/// One opened camera with its display thread and save path.
///
/// Dropping the session runs the same shutdown as [`Command::Quit`].
pub struct AcquisitionSession<C: Camera> {
    camera: Arc<C>,
    stream: StreamFormat,
    registry: Arc<LatestFrameRegistry>,
    saver: FrameSaver<StandardTiffWriter>,
    display: Option<DisplayHandle>,
    stats: Option<DisplayStats>,
}

impl<C: Camera> AcquisitionSession<C> {
    /// Reads the stream format, plans conversion and starts the display
    /// thread. Nothing is left running on error.
    pub fn open<R, M>(camera: Arc<C>, config: SessionConfig, make_renderer: M) -> Result<Self>
    where
        R: Renderer + 'static,
        M: FnOnce() -> Result<R> + Send + 'static,
    {
        let device = camera.info();
        info!("Camera: {}", device);

        let stream = read_stream_format(&*camera)?;
        info!(
            height = stream.height,
            width = stream.width,
            pixel_format = %stream.encoding,
            code = format_args!("0x{:08x}", stream.encoding.code()),
            "Camera ROI"
        );
        let frame_len = stream.encoding.frame_len(stream.width, stream.height);
        if (stream.payload_size as usize) < frame_len {
            warn!(payload = stream.payload_size, frame_len, "Payload smaller than the image it carries");
        }

        let plan = PixelFormatPlanner::new(config.bayer_conversion).plan(
            stream.encoding,
            &config.capabilities,
            stream.width,
            stream.height,
        );

        let mut save = config.save.clone();
        save.bayer_conversion = config.bayer_conversion;
        save.base_name = config.base_name.clone().unwrap_or_else(|| device.file_base_name());

        let registry = Arc::new(LatestFrameRegistry::new());
        let feed = camera.open_feed()?;
        let display = DisplayLoop::spawn(feed, make_renderer, plan, Arc::clone(&registry), config.display)?;
        let saver = FrameSaver::new(Arc::clone(&registry), save);

        Ok(Self {
            camera,
            stream,
            registry,
            saver,
            display: Some(display),
            stats: None,
        })
    }

    pub fn stream(&self) -> StreamFormat {
        self.stream
    }

    pub fn registry(&self) -> &Arc<LatestFrameRegistry> {
        &self.registry
    }

    pub fn camera(&self) -> &Arc<C> {
        &self.camera
    }

    pub fn display_state(&self) -> DisplayState {
        self.display.as_ref().map_or(DisplayState::Stopped, DisplayHandle::state)
    }

    pub fn is_closed(&self) -> bool {
        self.display.is_none()
    }

    /// Transfer command failures come back as errors; save failures are an
    /// outcome. Neither ends the session.
    pub fn execute(&mut self, command: Command) -> Result<CommandOutcome> {
        if self.is_closed() && command != Command::Quit {
            return Err(PipelineError::TransferCommand("session is closed".to_string()));
        }
        match command {
            Command::ToggleTurbo => {
                if !is_turbo_available(&*self.camera) {
                    return Ok(CommandOutcome::Turbo(TurboState::Unavailable));
                }
                let state = if toggle_turbo(&*self.camera)? {
                    TurboState::Enabled
                } else {
                    TurboState::Disabled
                };
                info!(?state, "TurboMode toggled");
                Ok(CommandOutcome::Turbo(state))
            }
            Command::Stop => {
                self.camera.stop_transfer()?;
                Ok(CommandOutcome::Done)
            }
            Command::Abort => {
                self.camera.abort_transfer()?;
                Ok(CommandOutcome::Done)
            }
            Command::Snap(n) => {
                self.camera.start_transfer(FrameCount::Snap(n))?;
                Ok(CommandOutcome::Done)
            }
            Command::Continuous => {
                self.camera.start_transfer(FrameCount::Continuous)?;
                Ok(CommandOutcome::Done)
            }
            Command::Save => Ok(self.save()),
            Command::Help => Ok(CommandOutcome::Menu),
            Command::Quit => {
                self.shutdown();
                Ok(CommandOutcome::Quit)
            }
        }
    }

    pub fn save(&self) -> CommandOutcome {
        let StreamFormat { width, height, encoding, .. } = self.stream;
        match self.saver.save_latest(encoding, width, height) {
            Ok(saved) => CommandOutcome::Saved(saved),
            Err(e @ SaveError::NoFrameYet) => CommandOutcome::SaveFailed(e),
            Err(e) => {
                warn!("Save failed: {}", e);
                CommandOutcome::SaveFailed(e)
            }
        }
    }

    /// Stops the transfer, joins the display thread, then aborts the
    /// transfer. Idempotent; returns the display counters once joined.
    pub fn shutdown(&mut self) -> Option<DisplayStats> {
        if let Some(display) = self.display.take() {
            if let Err(e) = self.camera.stop_transfer() {
                warn!("Stop transfer failed during shutdown: {}", e);
            }
            self.stats = display.stop();
            if let Err(e) = self.camera.abort_transfer() {
                warn!("Abort transfer failed during shutdown: {}", e);
            }
            info!("Acquisition session closed");
        }
        self.stats
    }
}

impl<C: Camera> Drop for AcquisitionSession<C> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn read_stream_format<D: FeatureAccess + ?Sized>(device: &D) -> Result<StreamFormat> {
    let width = device.get_u32("Width")?;
    let height = device.get_u32("Height")?;
    let code = device.get_u32("PixelFormat")?;
    let payload_size = device.get_u32("PayloadSize")?;

    if width == 0 || height == 0 {
        return Err(PipelineError::InvalidDimensions(width, height));
    }
    Ok(StreamFormat {
        width,
        height,
        encoding: PixelEncoding::from_code(code),
        payload_size,
    })
}
