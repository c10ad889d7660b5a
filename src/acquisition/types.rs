//! Acquired frame types

use bytes::Bytes;

use crate::image_pipeline::format::PixelEncoding;

/// Transfer outcome the acquisition layer attaches to each buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Ok,
    /// Packets were lost; the buffer is partially filled.
    Incomplete,
    TimedOut,
    /// The image did not fit the buffer.
    Overflow,
}

/// One completed buffer handed out by an [`AcquisitionFeed`](crate::acquisition::AcquisitionFeed).
///
/// `data` is a reference-counted handle on a pool buffer. Clones share the
/// same memory; the pool can reuse it once every clone is gone.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub encoding: PixelEncoding,
    pub width: u32,
    pub height: u32,
    pub status: FrameStatus,
    /// Monotonic per-transfer frame counter.
    pub sequence: u64,
    pub data: Bytes,
}

impl RawFrame {
    pub fn is_complete(&self) -> bool {
        self.status == FrameStatus::Ok
    }

    pub fn bit_depth(&self) -> u32 {
        self.encoding.bits_per_pixel()
    }

    /// Bytes the encoding implies for this frame's dimensions.
    pub fn expected_len(&self) -> usize {
        self.encoding.frame_len(self.width, self.height)
    }
}

/// What one poll of an acquisition feed produced.
#[derive(Debug)]
pub enum FeedEvent {
    Frame(RawFrame),
    /// Nothing arrived within the timeout. Not an error.
    Timeout,
    /// The transfer is gone for good.
    EndOfStream,
}
