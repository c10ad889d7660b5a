//! Session configuration types

use std::path::PathBuf;
use std::time::Duration;

use crate::display::DisplayConfig;
use crate::image_pipeline::planner::DisplayCapabilities;
use crate::image_pipeline::tiff::{SaveConfig, TiffCompression};

/// Configuration for an acquisition session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub display: DisplayConfig,
    /// What the renderer accepts without conversion
    pub capabilities: DisplayCapabilities,
    /// Demosaic CFA frames for display and save
    pub bayer_conversion: bool,
    pub save: SaveConfig,
    /// Save file prefix; derived from the device MAC address when unset
    pub base_name: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            display: DisplayConfig::default(),
            capabilities: DisplayCapabilities::default(),
            bayer_conversion: true,
            save: SaveConfig::default(),
            base_name: None,
        }
    }
}

impl SessionConfig {
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }
}

/// Builder for SessionConfig
#[derive(Default)]
pub struct SessionConfigBuilder {
    poll_timeout: Option<Duration>,
    capabilities: Option<DisplayCapabilities>,
    bayer_conversion: Option<bool>,
    compression: Option<TiffCompression>,
    output_dir: Option<PathBuf>,
    base_name: Option<String>,
}

impl SessionConfigBuilder {
    pub fn poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = Some(timeout);
        self
    }

    pub fn capabilities(mut self, capabilities: DisplayCapabilities) -> Self {
        self.capabilities = Some(capabilities);
        self
    }

    pub fn bayer_conversion(mut self, enable: bool) -> Self {
        self.bayer_conversion = Some(enable);
        self
    }

    pub fn compression(mut self, compression: TiffCompression) -> Self {
        self.compression = Some(compression);
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn base_name(mut self, name: impl Into<String>) -> Self {
        self.base_name = Some(name.into());
        self
    }

    pub fn build(self) -> SessionConfig {
        let default = SessionConfig::default();
        let bayer_conversion = self.bayer_conversion.unwrap_or(default.bayer_conversion);

        let mut save = SaveConfig::builder().bayer_conversion(bayer_conversion);
        if let Some(compression) = self.compression {
            save = save.compression(compression);
        }
        if let Some(dir) = self.output_dir {
            save = save.output_dir(dir);
        }

        let mut display = default.display;
        if let Some(timeout) = self.poll_timeout {
            display = display.with_poll_timeout(timeout);
        }

        SessionConfig {
            display,
            capabilities: self.capabilities.unwrap_or(default.capabilities),
            bayer_conversion,
            save: save.build(),
            base_name: self.base_name,
        }
    }
}
