use std::time::Duration;

use crate::acquisition::types::{FeedEvent, RawFrame};
use crate::image_pipeline::common::error::Result;

/// Producer side of the display pipeline.
pub trait AcquisitionFeed {
    /// Blocks for at most `timeout` waiting for the next completed buffer.
    fn next_frame(&mut self, timeout: Duration) -> Result<FeedEvent>;

    /// Hands a consumed frame's buffer back to the transfer pool.
    fn release(&mut self, frame: RawFrame) {
        drop(frame);
    }
}

impl<F: AcquisitionFeed + ?Sized> AcquisitionFeed for Box<F> {
    fn next_frame(&mut self, timeout: Duration) -> Result<FeedEvent> {
        (**self).next_frame(timeout)
    }

    fn release(&mut self, frame: RawFrame) {
        (**self).release(frame)
    }
}
