//! Frame acquisition
//!
//! Frames, the feed the display thread polls, and the device interfaces a
//! session drives. `SimulatedCamera` implements all of them in-process.

pub mod device;
mod feed;
pub mod pool;
pub mod simulated;
pub mod types;

pub use device::{Camera, DeviceInfo, FeatureAccess, FrameCount, TransferControl};
pub use feed::AcquisitionFeed;
pub use pool::{BufferPool, PoolStats};
pub use simulated::{SimulatedCamera, SimulatedCameraConfig, SimulatedFeed};
pub use types::{FeedEvent, FrameStatus, RawFrame};
