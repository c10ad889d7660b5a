use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Counts the save buffers currently alive.
#[derive(Debug, Clone, Default)]
pub struct BufferTracker {
    live: Arc<AtomicUsize>,
}

impl BufferTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    /// A zero-initialised buffer of `len` bytes.
    pub fn allocate(&self, len: usize) -> SaveBuffer {
        self.filled(len, 0)
    }

    pub fn filled(&self, len: usize, fill: u8) -> SaveBuffer {
        self.live.fetch_add(1, Ordering::AcqRel);
        SaveBuffer {
            data: vec![fill; len],
            live: Arc::clone(&self.live),
        }
    }
}

/// Conversion buffer owned by one save request; released when dropped.
#[derive(Debug)]
pub struct SaveBuffer {
    data: Vec<u8>,
    live: Arc<AtomicUsize>,
}

impl Deref for SaveBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl DerefMut for SaveBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl Drop for SaveBuffer {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::AcqRel);
    }
}
