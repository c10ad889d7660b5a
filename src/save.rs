//! Save on demand
//!
//! Snapshots the latest complete frame, demosaics or unpacks it when the
//! encoder needs it and writes it under a timestamped name.

pub mod filename;
mod frame_saver;
pub mod save_buffer;


pub use filename::{unique_filename, unique_path};
pub use frame_saver::{FrameSaver, SavedImage};
pub use save_buffer::{BufferTracker, SaveBuffer};
