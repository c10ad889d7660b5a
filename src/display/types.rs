use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Default bound on one blocking poll of the feed.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DisplayState {
    Running = 0,
    StoppingRequested = 1,
    Stopped = 2,
}

impl DisplayState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => DisplayState::Running,
            1 => DisplayState::StoppingRequested,
            _ => DisplayState::Stopped,
        }
    }
}

#[derive(Debug)]
struct SignalInner {
    stop: AtomicBool,
    state: AtomicU8,
}

/// Shared stop flag and state of one display loop.
#[derive(Debug, Clone)]
pub struct StopSignal {
    inner: Arc<SignalInner>,
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl StopSignal {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SignalInner {
                stop: AtomicBool::new(false),
                state: AtomicU8::new(DisplayState::Running as u8),
            }),
        }
    }

    pub fn request_stop(&self) {
        self.inner.stop.store(true, Ordering::Release);
        let _ = self.inner.state.compare_exchange(
            DisplayState::Running as u8,
            DisplayState::StoppingRequested as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    pub fn is_stop_requested(&self) -> bool {
        self.inner.stop.load(Ordering::Acquire)
    }

    pub fn state(&self) -> DisplayState {
        DisplayState::from_u8(self.inner.state.load(Ordering::Acquire))
    }

    pub(crate) fn mark_stopped(&self) {
        self.inner.state.store(DisplayState::Stopped as u8, Ordering::Release);
    }
}

/// Per-loop counters, returned when the loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayStats {
    pub frames_received: u64,
    pub rendered: u64,
    pub dropped_incomplete: u64,
    /// Complete frames the converter could not turn into display input.
    pub skipped: u64,
    pub timeouts: u64,
    pub feed_errors: u64,
}

#[derive(Debug, Clone)]
pub struct DisplayConfig {
    pub poll_timeout: Duration,
    pub thread_name: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            thread_name: "display".to_string(),
        }
    }
}

impl DisplayConfig {
    pub fn with_poll_timeout(mut self, poll_timeout: Duration) -> Self {
        self.poll_timeout = poll_timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_request_transitions_state() {
        let signal = StopSignal::new();
        assert_eq!(signal.state(), DisplayState::Running);
        signal.request_stop();
        assert!(signal.is_stop_requested());
        assert_eq!(signal.state(), DisplayState::StoppingRequested);
        signal.mark_stopped();
        signal.request_stop();
        assert_eq!(signal.state(), DisplayState::Stopped);
    }
}
