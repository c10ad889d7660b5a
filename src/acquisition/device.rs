//! Device-side interfaces consumed by a session.
//!
//! Discovery, the feature-map protocol and transfer set-up belong to the
//! vendor SDK; the session only needs these calls.

use std::fmt;

use crate::acquisition::feed::AcquisitionFeed;
use crate::image_pipeline::common::error::Result;

/// How many frames a started transfer delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameCount {
    Snap(u32),
    Continuous,
}

pub trait TransferControl {
    fn start_transfer(&self, count: FrameCount) -> Result<()>;
    /// Stops after the frame in flight.
    fn stop_transfer(&self) -> Result<()>;
    /// Stops immediately, discarding the frame in flight.
    fn abort_transfer(&self) -> Result<()>;
}

/// Named device features (GenICam style).
pub trait FeatureAccess {
    fn get_u32(&self, name: &str) -> Result<u32>;
    fn set_u32(&self, name: &str, value: u32) -> Result<()>;
    fn get_string(&self, name: &str) -> Result<String>;
    fn set_string(&self, name: &str, value: &str) -> Result<()>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    pub manufacturer: String,
    pub model: String,
    pub serial: String,
    pub version: String,
    pub mac_high: u32,
    pub mac_low: u32,
}

impl DeviceInfo {
    /// Save-file base name: low 24 bits of the MAC address in hex.
    pub fn file_base_name(&self) -> String {
        format!("img_{:06x}", self.mac_low & 0x00FF_FFFF)
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} (serial {}, version {}, mac {:04x}{:08x})",
            self.manufacturer, self.model, self.serial, self.version, self.mac_high, self.mac_low
        )
    }
}

/// An opened device: transfer control and features from the command
/// thread, frames from the display thread.
pub trait Camera: TransferControl + FeatureAccess + Send + Sync {
    type Feed: AcquisitionFeed + Send + 'static;

    fn info(&self) -> DeviceInfo;

    fn open_feed(&self) -> Result<Self::Feed>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_name_uses_low_mac_octets() {
        let info = DeviceInfo { mac_low: 0xAB12_34CD, ..Default::default() };
        assert_eq!(info.file_base_name(), "img_1234cd");
    }
}
