//! Live display
//!
//! The display thread's loop, the latest-frame registry it publishes to, and
//! the renderer backends it draws with.

mod display_loop;
pub mod registry;
pub mod renderer;
pub mod types;

#[cfg(test)]
mod tests;

pub use display_loop::{DisplayHandle, DisplayLoop};
pub use registry::{FrameSnapshot, LatestFrameRegistry};
pub use renderer::{Renderer, TracingRenderer};
#[cfg(feature = "window")]
pub use renderer::WindowRenderer;
pub use types::{DisplayConfig, DisplayState, DisplayStats, StopSignal, DEFAULT_POLL_TIMEOUT};
