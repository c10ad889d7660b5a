use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub capacity: usize,
    pub free_buffers: usize,
    pub alloc_count: usize,
    pub acquire_count: usize,
    pub recycle_count: usize,
}

struct State {
    free: Vec<BytesMut>, // LIFO
    alloc_count: usize,
    acquire_count: usize,
    recycle_count: usize,
}

/// Fixed-size frame buffers handed out as `BytesMut` and frozen into frames.
///
/// A released frame comes back only when nothing else still holds its
/// `Bytes`; otherwise the memory is freed with the last clone and the pool
/// allocates a replacement on demand.
pub struct BufferPool {
    frame_bytes: usize,
    capacity: usize,
    state: Mutex<State>,
}

impl BufferPool {
    pub fn new(frame_bytes: usize, capacity: usize) -> Self {
        let free = (0..capacity).map(|_| BytesMut::zeroed(frame_bytes)).collect();
        Self {
            frame_bytes,
            capacity,
            state: Mutex::new(State {
                free,
                alloc_count: capacity,
                acquire_count: 0,
                recycle_count: 0,
            }),
        }
    }

    /// A buffer of exactly `frame_bytes` bytes. Contents are unspecified.
    pub fn acquire(&self) -> BytesMut {
        let mut state = self.state.lock();
        state.acquire_count += 1;
        match state.free.pop() {
            Some(mut buf) => {
                drop(state);
                buf.resize(self.frame_bytes, 0);
                buf
            }
            None => {
                state.alloc_count += 1;
                drop(state);
                BytesMut::zeroed(self.frame_bytes)
            }
        }
    }

    /// Returns `true` if the buffer went back on the free list.
    pub fn recycle(&self, data: Bytes) -> bool {
        let Ok(buf) = data.try_into_mut() else {
            return false;
        };
        if buf.capacity() < self.frame_bytes {
            return false;
        }
        let mut state = self.state.lock();
        if state.free.len() >= self.capacity {
            return false;
        }
        state.free.push(buf);
        state.recycle_count += 1;
        true
    }

    pub fn stats(&self) -> PoolStats {
        let state = self.state.lock();
        PoolStats {
            capacity: self.capacity,
            free_buffers: state.free.len(),
            alloc_count: state.alloc_count,
            acquire_count: state.acquire_count,
            recycle_count: state.recycle_count,
        }
    }
}
