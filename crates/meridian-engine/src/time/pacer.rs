use std::time::{Duration, Instant};

/// Default fixed update rate of the render loop, in Hz.
pub const DEFAULT_UPDATE_RATE: f64 = 30.0;

/// Schedules frames at a fixed rate.
///
/// A late frame does not cause a burst of catch-up frames: the next
/// deadline is pushed to one interval after the late frame.
#[derive(Debug, Clone)]
pub struct FramePacer {
    interval: Option<Duration>,
    next: Instant,
}

impl FramePacer {
    /// `None`, a non-positive rate, or a rate so small its interval cannot be
    /// represented disables pacing; every poll is then due.
    pub fn new(rate_hz: Option<f64>) -> Self {
        Self::starting_at(rate_hz, Instant::now())
    }

    pub fn starting_at(rate_hz: Option<f64>, start: Instant) -> Self {
        let interval = rate_hz
            .filter(|hz| hz.is_finite() && *hz > 0.0)
            .and_then(|hz| Duration::try_from_secs_f64(1.0 / hz).ok())
            .filter(|interval| start.checked_add(*interval).is_some());
        Self { interval, next: start }
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// When the next frame is due; `None` when unpaced.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.interval.map(|_| self.next)
    }

    /// Returns `true` if a frame is due at `now`, and schedules the next one.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(interval) = self.interval else {
            return true;
        };
        if now < self.next {
            return false;
        }

        self.next = match self.next.checked_add(interval) {
            Some(next) if next > now => next,
            _ => now.checked_add(interval).unwrap_or(now),
        };
        true
    }
}

impl Default for FramePacer {
    fn default() -> Self {
        Self::new(Some(DEFAULT_UPDATE_RATE))
    }
}
