use std::sync::Arc;

use arc_swap::ArcSwapOption;
use bytes::Bytes;

use crate::acquisition::RawFrame;
use crate::image_pipeline::format::PixelEncoding;

/// Immutable view of a registered frame. Holds a reference on the frame's
/// buffer, so the pixels cannot change underneath a reader.
#[derive(Debug, Clone)]
pub struct FrameSnapshot {
    pub encoding: PixelEncoding,
    pub width: u32,
    pub height: u32,
    pub sequence: u64,
    pub data: Bytes,
}

impl FrameSnapshot {
    pub fn from_frame(frame: &RawFrame) -> Self {
        Self {
            encoding: frame.encoding,
            width: frame.width,
            height: frame.height,
            sequence: frame.sequence,
            data: frame.data.clone(),
        }
    }
}

/// Single slot holding the most recent complete frame.
///
/// Written by the display thread, read by save requests from any thread.
#[derive(Debug, Default)]
pub struct LatestFrameRegistry {
    slot: ArcSwapOption<FrameSnapshot>,
}

impl LatestFrameRegistry {
    pub fn new() -> Self {
        Self { slot: ArcSwapOption::empty() }
    }

    /// Publishes `frame` and returns the snapshot it displaced.
    pub fn set(&self, frame: &RawFrame) -> Option<Arc<FrameSnapshot>> {
        self.slot.swap(Some(Arc::new(FrameSnapshot::from_frame(frame))))
    }

    pub fn get(&self) -> Option<Arc<FrameSnapshot>> {
        self.slot.load_full()
    }

    pub fn clear(&self) {
        self.slot.store(None);
    }

    pub fn is_empty(&self) -> bool {
        self.slot.load().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::FrameStatus;
    use crate::image_pipeline::format::MONO8;

    fn frame(sequence: u64, fill: u8) -> RawFrame {
        RawFrame {
            encoding: MONO8,
            width: 2,
            height: 2,
            status: FrameStatus::Ok,
            sequence,
            data: Bytes::from(vec![fill; 4]),
        }
    }

    #[test]
    fn test_empty_until_set() {
        let registry = LatestFrameRegistry::new();
        assert!(registry.get().is_none());
        registry.set(&frame(1, 9));
        assert!(!registry.is_empty());
        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_snapshot_shares_frame_buffer() {
        let registry = LatestFrameRegistry::new();
        let f = frame(3, 7);
        registry.set(&f);
        let snap = registry.get().unwrap();
        assert_eq!(snap.sequence, 3);
        assert_eq!(snap.data.as_ptr(), f.data.as_ptr());
    }

    #[test]
    fn test_old_snapshot_survives_replacement() {
        let registry = LatestFrameRegistry::new();
        registry.set(&frame(1, 1));
        let held = registry.get().unwrap();
        registry.set(&frame(2, 2));

        assert_eq!(&held.data[..], &[1, 1, 1, 1]);
        assert_eq!(registry.get().unwrap().sequence, 2);
    }

    #[test]
    fn test_set_hands_back_displaced_snapshot() {
        let registry = LatestFrameRegistry::new();
        assert!(registry.set(&frame(1, 1)).is_none());
        let displaced = registry.set(&frame(2, 2)).unwrap();
        assert_eq!(displaced.sequence, 1);
        assert_eq!(Arc::strong_count(&displaced), 1);
    }
}
