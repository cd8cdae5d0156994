use anyhow::Result;

use crate::sync::Fence;

/// Secondary rendering context owned by the load worker.
///
/// Created in the same object namespace as the primary context so resources
/// built on it become usable from the render thread once a fence created
/// after the build has signaled. Released by `Drop`; the coordinator drops it
/// only after the worker has stopped issuing calls.
pub trait LoadContext: Send + 'static {
    type Fence: Fence;

    /// Binds the context to the calling thread.
    fn make_current(&mut self) -> Result<()>;

    /// Inserts a fence after every command issued so far on this context.
    fn create_fence(&mut self) -> Result<Self::Fence>;
}
