//! Operator session
//!
//! Opens a camera for live display, maps operator keys to transfer, turbo
//! and save commands, and shuts down in order: stop the transfer, join the
//! display thread, abort the transfer.

mod acquisition_session;
pub mod command;
pub mod config;
pub mod turbo;


pub use acquisition_session::{AcquisitionSession, CommandOutcome, StreamFormat, TurboState};
pub use command::{Command, MENU};
pub use config::{SessionConfig, SessionConfigBuilder};
pub use turbo::{is_turbo_available, toggle_turbo};
