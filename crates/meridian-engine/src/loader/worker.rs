use crate::sync::{FencePolicy, MessageHandler, Poster, wait_for_fence};

use super::builder::BuilderRegistry;
use super::config::{FailurePolicy, LoaderConfig};
use super::context::LoadContext;
use super::error::LoadError;
use super::request::ShapefileRequest;

/// Position of the worker in its per-request cycle.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum WorkerState {
    Idle,
    Dequeuing,
    Building,
    AwaitingFence,
    Posting,
}

/// A request that failed while the worker ran with [`FailurePolicy::SkipRequest`].
#[derive(Debug)]
pub struct LoadFailure {
    pub request: ShapefileRequest,
    pub error: LoadError,
}

/// Request handler owning the secondary context.
///
/// For every request: make the context current, run the builder registered
/// for the request's shape type, fence, wait for the fence, then post the
/// finished resource to the result queue. A resource is never posted before
/// its fence has signaled.
pub struct ShapefileWorker<C: LoadContext, R> {
    context: C,
    builders: BuilderRegistry<C, R>,
    done: Poster<R>,
    fence: FencePolicy,
    failure_policy: FailurePolicy,
    state: WorkerState,
    completed: usize,
    failures: Vec<LoadFailure>,
}

impl<C: LoadContext, R> ShapefileWorker<C, R> {
    pub fn new(
        context: C,
        builders: BuilderRegistry<C, R>,
        done: Poster<R>,
        config: &LoaderConfig,
    ) -> Self {
        Self {
            context,
            builders,
            done,
            fence: config.fence,
            failure_policy: config.failure_policy,
            state: WorkerState::Idle,
            completed: 0,
            failures: Vec::new(),
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Number of resources posted so far.
    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn failures(&self) -> &[LoadFailure] {
        &self.failures
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn into_context(self) -> C {
        self.context
    }

    fn set_state(&mut self, state: WorkerState) {
        log::trace!("shapefile worker: {:?} -> {state:?}", self.state);
        self.state = state;
    }

    fn load(&mut self, request: &ShapefileRequest) -> Result<(), LoadError> {
        let path = request.path();
        self.set_state(WorkerState::Dequeuing);

        self.context.make_current().map_err(|source| LoadError::Context {
            path: path.to_string(),
            source,
        })?;

        let shape_type = request.shape_type();
        self.set_state(WorkerState::Building);
        let Some(build) = self.builders.get_mut(shape_type) else {
            return Err(LoadError::UnsupportedShapeType {
                path: path.to_string(),
                shape_type,
            });
        };
        let resource = build(request, &mut self.context).map_err(|source| LoadError::Build {
            path: path.to_string(),
            source,
        })?;

        self.set_state(WorkerState::AwaitingFence);
        let fence = self.context.create_fence().map_err(|source| LoadError::Context {
            path: path.to_string(),
            source,
        })?;
        let wait = wait_for_fence(&fence, &self.fence).map_err(|source| LoadError::Fence {
            path: path.to_string(),
            source,
        })?;

        self.set_state(WorkerState::Posting);
        self.done.post(resource).map_err(|source| LoadError::Post {
            path: path.to_string(),
            source,
        })?;

        log::info!(
            "loaded {path} ({shape_type}); fence signaled after {} poll(s) in {:?}",
            wait.polls,
            wait.elapsed
        );
        Ok(())
    }
}

impl<C: LoadContext, R> MessageHandler<ShapefileRequest> for ShapefileWorker<C, R> {
    type Error = LoadError;

    fn handle(&mut self, request: ShapefileRequest) -> Result<(), LoadError> {
        let outcome = self.load(&request);
        self.set_state(WorkerState::Idle);

        match outcome {
            Ok(()) => {
                self.completed += 1;
                Ok(())
            }
            Err(error) => match self.failure_policy {
                FailurePolicy::HaltWorker => {
                    log::error!("shapefile worker halting: {error}");
                    Err(error)
                }
                FailurePolicy::SkipRequest => {
                    log::error!("skipping request: {error}");
                    self.failures.push(LoadFailure { request, error });
                    Ok(())
                }
            },
        }
    }
}
