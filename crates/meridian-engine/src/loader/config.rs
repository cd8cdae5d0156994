use crate::sync::FencePolicy;

/// Where load requests are processed.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum LoadMode {
    /// On the caller's thread, during [`LoadCoordinator::start`](super::LoadCoordinator::start).
    Inline,
    /// On a dedicated worker thread owning the secondary context.
    #[default]
    Threaded,
}

/// What the worker does when a request fails.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum FailurePolicy {
    /// Stop processing; the error is reported through
    /// [`LoadCoordinator::worker_error`](super::LoadCoordinator::worker_error).
    #[default]
    HaltWorker,
    /// Log and record the failure, then continue with the next request.
    SkipRequest,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoaderConfig {
    pub mode: LoadMode,
    pub fence: FencePolicy,
    pub failure_policy: FailurePolicy,
    pub thread_name: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            mode: LoadMode::default(),
            fence: FencePolicy::default(),
            failure_policy: FailurePolicy::default(),
            thread_name: "shapefile-loader".to_string(),
        }
    }
}

impl LoaderConfig {
    pub fn inline() -> Self {
        Self { mode: LoadMode::Inline, ..Self::default() }
    }

    pub fn threaded() -> Self {
        Self { mode: LoadMode::Threaded, ..Self::default() }
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_fence(mut self, fence: FencePolicy) -> Self {
        self.fence = fence;
        self
    }
}
