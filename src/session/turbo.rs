//! TurboDrive transfer mode.

use tracing::debug;

use crate::acquisition::FeatureAccess;
use crate::image_pipeline::common::error::Result;

/// Spelled this way by the devices.
pub const TURBO_AVAILABLE_FEATURE: &str = "transferTurboCurrentlyAbailable";
pub const TURBO_SELECTOR_FEATURE: &str = "transferTurboCapabilitySelector";
pub const TURBO_MODE_FEATURE: &str = "transferTurboMode";

/// Whether the device can use TurboDrive with its current pixel format.
///
/// Devices without the availability feature are probed by selecting the
/// current pixel format in the capability selector; acceptance means
/// available.
pub fn is_turbo_available<D: FeatureAccess + ?Sized>(device: &D) -> bool {
    if let Ok(value) = device.get_u32(TURBO_AVAILABLE_FEATURE) {
        return value != 0;
    }

    let Ok(pixel_format) = device.get_string("PixelFormat") else {
        return false;
    };
    match device.set_string(TURBO_SELECTOR_FEATURE, &pixel_format) {
        Ok(()) => true,
        Err(e) => {
            debug!("TurboDrive capability probe failed: {}", e);
            false
        }
    }
}

/// Flips the turbo mode and returns the state the device reports afterwards.
pub fn toggle_turbo<D: FeatureAccess + ?Sized>(device: &D) -> Result<bool> {
    let current = device.get_u32(TURBO_MODE_FEATURE)?;
    device.set_u32(TURBO_MODE_FEATURE, u32::from(current == 0))?;
    Ok(device.get_u32(TURBO_MODE_FEATURE)? == 1)
}
