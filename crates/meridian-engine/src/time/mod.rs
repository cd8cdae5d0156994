//! Frame timing: per-frame delta time and fixed-rate frame pacing.

mod frame_clock;
mod pacer;

pub use frame_clock::{FrameClock, FrameTime};
pub use pacer::{DEFAULT_UPDATE_RATE, FramePacer};
