use std::fmt;
use std::time::Duration;

/// Posting to a queue whose consumer side has been disposed.
///
/// This is a programming error on the producer side; the message is dropped.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum QueueError {
    Disposed,
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueError::Disposed => f.write_str("message queue has been disposed"),
        }
    }
}

impl std::error::Error for QueueError {}

/// A queue thread that terminated by panicking instead of returning.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueThreadPanicked {
    pub thread: String,
    pub message: String,
}

impl fmt::Display for QueueThreadPanicked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "queue thread '{}' panicked: {}", self.thread, self.message)
    }
}

impl std::error::Error for QueueThreadPanicked {}

/// Failure while waiting for a fence.
#[derive(Debug, Clone, PartialEq)]
pub enum FenceError {
    /// The device reported an error while polling.
    Device(String),
    /// The fence did not signal within the configured timeout.
    TimedOut { polls: u32, elapsed: Duration },
}

impl fmt::Display for FenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FenceError::Device(msg) => write!(f, "device error while polling fence: {msg}"),
            FenceError::TimedOut { polls, elapsed } => write!(
                f,
                "fence not signaled after {polls} polls ({:.1} ms)",
                elapsed.as_secs_f64() * 1000.0
            ),
        }
    }
}

impl std::error::Error for FenceError {}
