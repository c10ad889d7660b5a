//! Common utilities module
//!
//! This module contains shared utilities used across the image pipeline.

pub mod error;

pub use error::{PipelineError, Result, SaveError, SaveResult};
