use std::convert::Infallible;

use crate::sync::{
    MessageHandler, MessageQueue, Poster, QueueError, QueueThread, QueueThreadPanicked, StoppedQueue,
};

use super::builder::BuilderRegistry;
use super::config::{LoadMode, LoaderConfig};
use super::context::LoadContext;
use super::error::LoadError;
use super::request::ShapefileRequest;
use super::worker::ShapefileWorker;

type WorkerQueue<C, R> = MessageQueue<ShapefileRequest, ShapefileWorker<C, R>>;

/// Finished resources adopted by the render thread, in adoption order.
///
/// Handler of the result queue: each delivered resource is adopted exactly
/// once, so draining the queue repeatedly never duplicates an entry.
#[derive(Debug)]
pub struct RenderableSet<R> {
    items: Vec<R>,
}

impl<R> Default for RenderableSet<R> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<R> RenderableSet<R> {
    pub fn as_slice(&self) -> &[R] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drops every adopted resource. Returns how many were released.
    pub fn release(&mut self) -> usize {
        let released = self.items.len();
        self.items.clear();
        released
    }
}

impl<R> MessageHandler<R> for RenderableSet<R> {
    type Error = Infallible;

    fn handle(&mut self, resource: R) -> Result<(), Infallible> {
        self.items.push(resource);
        Ok(())
    }
}

/// What [`LoadCoordinator::dispose`] released.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct TeardownReport {
    /// Requests still queued when the worker stopped.
    pub requests_discarded: usize,
    /// Finished resources posted but never adopted.
    pub results_discarded: usize,
    /// Adopted resources released.
    pub renderables_released: usize,
}

/// Owns both queues and the worker, and hands finished resources to the
/// render thread.
///
/// The render thread calls [`on_frame`](Self::on_frame) once per frame: it
/// adopts whatever the worker has posted since the last frame, then renders
/// the adopted set.
pub struct LoadCoordinator<C: LoadContext, R: Send + 'static> {
    mode: LoadMode,
    thread_name: String,
    requests: Poster<ShapefileRequest>,
    /// Worker queue while it is not running on a thread (inline mode, before
    /// `start`, or after the worker thread ended).
    idle_worker: Option<WorkerQueue<C, R>>,
    thread: Option<QueueThread<ShapefileRequest, ShapefileWorker<C, R>>>,
    results: MessageQueue<R, RenderableSet<R>>,
    worker_error: Option<LoadError>,
    disposed: bool,
}

impl<C: LoadContext, R: Send + 'static> LoadCoordinator<C, R> {
    /// Creates the result queue, the worker over `context` and its request queue.
    /// Nothing is processed until [`start`](Self::start).
    pub fn new(context: C, builders: BuilderRegistry<C, R>, config: LoaderConfig) -> Self {
        let results = MessageQueue::new(RenderableSet::default());
        let worker = ShapefileWorker::new(context, builders, results.poster(), &config);
        let worker_queue = MessageQueue::new(worker);

        Self {
            mode: config.mode,
            thread_name: config.thread_name,
            requests: worker_queue.poster(),
            idle_worker: Some(worker_queue),
            thread: None,
            results,
            worker_error: None,
            disposed: false,
        }
    }

    pub fn mode(&self) -> LoadMode {
        self.mode
    }

    /// Enqueues a request for the worker.
    pub fn request(&self, request: ShapefileRequest) -> Result<(), QueueError> {
        log::debug!("requesting {} ({})", request.path(), request.shape_type());
        self.requests.post(request)
    }

    /// Number of requests not yet taken by the worker.
    pub fn pending_requests(&self) -> usize {
        self.requests.len()
    }

    pub fn is_worker_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Starts processing requests.
    ///
    /// Threaded mode moves the worker onto its own thread; calling `start`
    /// while it runs is a no-op. A worker thread that has ended is restarted,
    /// and the error it ended with is cleared. Inline mode processes every
    /// queued request on the caller's thread before returning, and may be
    /// called again for requests
    /// posted later. An inline build error is returned directly; requests
    /// queued behind it stay queued.
    pub fn start(&mut self) -> Result<(), LoadError> {
        match self.mode {
            LoadMode::Inline => {
                let Some(queue) = self.idle_worker.as_mut() else {
                    return Ok(());
                };
                let processed = queue.process_queue()?;
                log::debug!("processed {processed} load request(s) inline");
                Ok(())
            }
            LoadMode::Threaded => {
                self.observe_worker();
                if self.thread.is_some() {
                    return Ok(());
                }
                let Some(queue) = self.idle_worker.take() else {
                    return Ok(());
                };
                let thread = queue
                    .start_in_another_thread(self.thread_name.clone())
                    .map_err(LoadError::Spawn)?;
                if let Some(previous) = self.worker_error.take() {
                    log::info!("restarting shapefile worker after: {previous}");
                }
                self.thread = Some(thread);
                Ok(())
            }
        }
    }

    /// Adopts every resource posted since the last call. Returns how many.
    pub fn process_results(&mut self) -> usize {
        self.observe_worker();
        let adopted = match self.results.process_queue() {
            Ok(n) => n,
            Err(never) => match never {},
        };
        if adopted > 0 {
            log::debug!("adopted {adopted} layer(s); {} total", self.renderables().len());
        }
        adopted
    }

    /// Per-frame entry point: adopt new resources, then render the adopted set.
    pub fn on_frame<F>(&mut self, render: F) -> usize
    where
        F: FnOnce(&[R]),
    {
        let adopted = self.process_results();
        render(self.renderables());
        adopted
    }

    pub fn renderables(&self) -> &[R] {
        self.results.handler().as_slice()
    }

    /// Error that ended the worker, if it has ended with one. Cleared when
    /// [`start`](Self::start) restarts the worker.
    pub fn worker_error(&mut self) -> Option<&LoadError> {
        self.observe_worker();
        self.worker_error.as_ref()
    }

    /// Worker, when it is not running on a thread.
    pub fn worker(&self) -> Option<&ShapefileWorker<C, R>> {
        self.idle_worker.as_ref().map(MessageQueue::handler)
    }

    /// Collects the outcome of a worker thread that has ended on its own.
    fn observe_worker(&mut self) {
        if !self.thread.as_ref().is_some_and(QueueThread::is_finished) {
            return;
        }
        if let Some(thread) = self.thread.take() {
            self.collect(thread.join());
        }
    }

    fn collect(
        &mut self,
        joined: Result<StoppedQueue<ShapefileRequest, ShapefileWorker<C, R>>, QueueThreadPanicked>,
    ) {
        match joined {
            Ok(StoppedQueue { queue, outcome }) => {
                if let Err(e) = outcome {
                    log::error!("shapefile worker terminated: {e}");
                    self.worker_error = Some(e);
                }
                self.idle_worker = Some(queue);
            }
            Err(panicked) => {
                log::error!("{panicked}");
                self.worker_error = Some(LoadError::WorkerPanicked(panicked));
            }
        }
    }

    /// Stops the worker and releases everything in dependency order: adopted
    /// resources, pending results, pending requests, then the worker context.
    pub fn dispose(mut self) -> TeardownReport {
        self.teardown()
    }

    fn teardown(&mut self) -> TeardownReport {
        if self.disposed {
            return TeardownReport::default();
        }
        self.disposed = true;

        if let Some(thread) = self.thread.take() {
            log::debug!("stopping worker thread '{}'", thread.name());
            self.collect(thread.stop());
        }

        let renderables_released = self.results.handler_mut().release();
        let results_discarded = self.results.clear();

        let mut requests_discarded = 0;
        if let Some(mut queue) = self.idle_worker.take() {
            requests_discarded = queue.clear();
            let worker = queue.into_handler();
            drop(worker.into_context());
        }

        let report = TeardownReport {
            requests_discarded,
            results_discarded,
            renderables_released,
        };
        log::info!("load coordinator disposed: {report:?}");
        report
    }
}

impl<C: LoadContext, R: Send + 'static> Drop for LoadCoordinator<C, R> {
    fn drop(&mut self) {
        self.teardown();
    }
}
