//! Cross-thread handoff primitives.
//!
//! - [`MessageQueue`]: ordered mailbox with a single registered handler, drained
//!   once per call or in a blocking loop on a dedicated thread.
//! - [`Fence`] + [`wait_for_fence`]: cooperative polling of a GPU completion
//!   marker before results leave the thread that produced them.

mod error;
mod fence;
mod queue;

pub use error::{FenceError, QueueError, QueueThreadPanicked};
pub use fence::{ClientWaitResult, Fence, FencePolicy, FenceWait, wait_for_fence};
pub use queue::{MessageHandler, MessageQueue, Poster, QueueThread, StoppedQueue};
