use std::time::{Duration, Instant};

use super::error::FenceError;

/// Result of a single bounded wait on a fence.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ClientWaitResult {
    Signaled,
    TimeoutExpired,
}

/// GPU pipeline marker reporting completion of all commands issued before it.
pub trait Fence {
    /// Waits at most `timeout` for the fence. A zero timeout only queries.
    fn client_wait(&self, timeout: Duration) -> Result<ClientWaitResult, FenceError>;
}

/// How the issuing thread polls a fence before handing results off.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FencePolicy {
    /// Sleep between polls; keeps the thread cooperative instead of spinning.
    pub poll_interval: Duration,

    /// Timeout passed to each [`Fence::client_wait`] call.
    pub client_wait_timeout: Duration,

    /// Upper bound on the whole wait. `None` waits until the fence signals,
    /// however long that takes.
    pub timeout: Option<Duration>,
}

impl Default for FencePolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(10),
            client_wait_timeout: Duration::ZERO,
            timeout: None,
        }
    }
}

/// Statistics of a completed fence wait.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FenceWait {
    /// Number of `client_wait` calls, including the one that reported signaled.
    pub polls: u32,
    pub elapsed: Duration,
}

/// Polls `fence` until it signals.
///
/// Returns only after the fence reported [`ClientWaitResult::Signaled`]; work
/// issued before the fence was created is complete at that point and its
/// results may be handed to another thread.
pub fn wait_for_fence<F>(fence: &F, policy: &FencePolicy) -> Result<FenceWait, FenceError>
where
    F: Fence + ?Sized,
{
    let start = Instant::now();
    let mut polls = 0u32;

    loop {
        polls = polls.saturating_add(1);
        match fence.client_wait(policy.client_wait_timeout)? {
            ClientWaitResult::Signaled => {
                let elapsed = start.elapsed();
                log::trace!("fence signaled after {polls} poll(s) in {elapsed:?}");
                return Ok(FenceWait { polls, elapsed });
            }
            ClientWaitResult::TimeoutExpired => {}
        }

        let elapsed = start.elapsed();
        if policy.timeout.is_some_and(|limit| elapsed >= limit) {
            return Err(FenceError::TimedOut { polls, elapsed });
        }

        std::thread::sleep(policy.poll_interval);
    }
}
