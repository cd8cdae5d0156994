use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};

use super::error::{QueueError, QueueThreadPanicked};

/// Consumer callback registered on a [`MessageQueue`].
///
/// Invoked synchronously, once per message, in queue order. Errors are not
/// caught by the queue; they end the current drain and surface at its call site.
pub trait MessageHandler<T> {
    type Error;

    fn handle(&mut self, message: T) -> Result<(), Self::Error>;
}

impl<T, E, F> MessageHandler<T> for F
where
    F: FnMut(T) -> Result<(), E>,
{
    type Error = E;

    fn handle(&mut self, message: T) -> Result<(), E> {
        self(message)
    }
}

/// Shared stop request: a flag checked between messages plus a wake-up
/// channel so a consumer blocked on an empty queue notices the request.
#[derive(Clone)]
struct StopSignal {
    requested: Arc<AtomicBool>,
    wake: Sender<()>,
}

impl StopSignal {
    fn request(&self) {
        self.requested.store(true, Ordering::Release);
        // Full means a wake-up is already pending.
        let _ = self.wake.try_send(());
    }

    fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }
}

/// Producer handle for a [`MessageQueue`].
///
/// Cheap to clone and usable from any thread. Posting never blocks beyond the
/// channel's internal critical section.
pub struct Poster<T> {
    sender: Sender<T>,
    stop: StopSignal,
}

impl<T> Clone for Poster<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            stop: self.stop.clone(),
        }
    }
}

impl<T> Poster<T> {
    /// Appends `message` to the tail of the queue.
    ///
    /// Fails with [`QueueError::Disposed`] once the consumer side is gone; the
    /// message is dropped in that case.
    pub fn post(&self, message: T) -> Result<(), QueueError> {
        self.sender.send(message).map_err(|_| QueueError::Disposed)
    }

    /// Asks a consumer running [`MessageQueue::run_until_stopped`] to return.
    pub fn request_stop(&self) {
        self.stop.request();
    }

    /// Number of messages posted but not yet delivered.
    pub fn len(&self) -> usize {
        self.sender.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sender.is_empty()
    }
}

/// Ordered, thread-safe mailbox with exactly one registered handler.
///
/// Any number of producers post through [`Poster`] handles; the owner drains
/// either once per call ([`process_queue`](Self::process_queue)) or in a
/// blocking loop on its own thread ([`run_until_stopped`](Self::run_until_stopped)).
/// Messages are delivered in the order they arrived in the shared sequence,
/// which preserves each producer's own posting order.
pub struct MessageQueue<T, H> {
    sender: Sender<T>,
    receiver: Receiver<T>,
    stop: StopSignal,
    stop_rx: Receiver<()>,
    handler: H,
    /// Messages dequeued by the run loop after a stop was requested.
    dropped_on_stop: usize,
}

impl<T, H> MessageQueue<T, H>
where
    H: MessageHandler<T>,
{
    /// Creates an empty queue delivering to `handler`.
    pub fn new(handler: H) -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let (wake, stop_rx) = crossbeam_channel::bounded(1);

        Self {
            sender,
            receiver,
            stop: StopSignal {
                requested: Arc::new(AtomicBool::new(false)),
                wake,
            },
            stop_rx,
            handler,
            dropped_on_stop: 0,
        }
    }

    pub fn post(&self, message: T) -> Result<(), QueueError> {
        self.sender.send(message).map_err(|_| QueueError::Disposed)
    }

    pub fn poster(&self) -> Poster<T> {
        Poster {
            sender: self.sender.clone(),
            stop: self.stop.clone(),
        }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    pub fn request_stop(&self) {
        self.stop.request();
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop.is_requested()
    }

    /// Delivers the messages queued at the time of the call, in order.
    ///
    /// Non-blocking. Messages posted while draining (including by the handler
    /// itself) wait for the next call. On a handler error the remaining
    /// backlog stays queued.
    pub fn process_queue(&mut self) -> Result<usize, H::Error> {
        let backlog = self.receiver.len();
        let mut delivered = 0;

        for _ in 0..backlog {
            let Ok(message) = self.receiver.try_recv() else { break };
            self.handler.handle(message)?;
            delivered += 1;
        }

        Ok(delivered)
    }

    /// Delivers messages as they arrive until a stop is requested.
    ///
    /// Blocks while the queue is empty. A stop request wakes the loop; messages
    /// still queued at that point are left undelivered.
    pub fn run_until_stopped(&mut self) -> Result<(), H::Error> {
        loop {
            if self.stop.is_requested() {
                break;
            }

            let next = crossbeam_channel::select! {
                recv(self.receiver) -> message => message.ok(),
                recv(self.stop_rx) -> _ => None,
            };

            let Some(message) = next else { continue };
            if self.stop.is_requested() {
                log::debug!("stop requested; dropping message received during shutdown");
                drop(message);
                self.dropped_on_stop += 1;
                break;
            }
            self.handler.handle(message)?;
        }

        log::debug!("message loop stopped with {} message(s) pending", self.receiver.len());
        Ok(())
    }

    /// Moves the queue onto a new named thread running [`run_until_stopped`](Self::run_until_stopped).
    pub fn start_in_another_thread(
        self,
        name: impl Into<String>,
    ) -> std::io::Result<QueueThread<T, H>>
    where
        T: Send + 'static,
        H: Send + 'static,
        H::Error: Send + 'static,
    {
        let name = name.into();
        let poster = self.poster();

        let handle = std::thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                let mut queue = self;
                let outcome = queue.run_until_stopped();
                StoppedQueue { queue, outcome }
            })?;

        log::debug!("message queue thread '{name}' started");

        Ok(QueueThread {
            name,
            poster,
            handle: Some(handle),
        })
    }

    /// Releases the queue. Pending messages are dropped undelivered.
    ///
    /// Returns the number of discarded messages. Producers still holding a
    /// [`Poster`] get [`QueueError::Disposed`] from then on.
    pub fn dispose(mut self) -> usize {
        self.clear()
    }

    /// Drops every pending message undelivered and returns how many there were,
    /// including one the run loop took off the queue as a stop arrived.
    pub fn clear(&mut self) -> usize {
        let discarded = self.receiver.try_iter().count() + std::mem::take(&mut self.dropped_on_stop);
        if discarded > 0 {
            log::debug!("message queue discarded {discarded} undelivered message(s)");
        }
        discarded
    }

    /// Releases the queue and returns its handler. Pending messages are dropped.
    pub fn into_handler(mut self) -> H {
        self.clear();
        self.handler
    }
}

/// A queue and the result of its run loop, returned when its thread ends.
pub struct StoppedQueue<T, H: MessageHandler<T>> {
    pub queue: MessageQueue<T, H>,
    /// `Err` when the loop ended because the handler failed.
    pub outcome: Result<(), H::Error>,
}

/// A [`MessageQueue`] being drained on its own thread.
///
/// Dropping without calling [`stop`](Self::stop) or [`join`](Self::join)
/// requests a stop and joins, discarding the result.
pub struct QueueThread<T, H: MessageHandler<T>> {
    name: String,
    poster: Poster<T>,
    handle: Option<JoinHandle<StoppedQueue<T, H>>>,
}

impl<T, H> QueueThread<T, H>
where
    H: MessageHandler<T>,
{
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn post(&self, message: T) -> Result<(), QueueError> {
        self.poster.post(message)
    }

    pub fn poster(&self) -> Poster<T> {
        self.poster.clone()
    }

    /// Returns `true` once the run loop has returned (stopped or failed).
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Requests a stop and waits for the thread to finish.
    ///
    /// A message being handled when the request arrives is finished first.
    pub fn stop(mut self) -> Result<StoppedQueue<T, H>, QueueThreadPanicked> {
        self.poster.request_stop();
        self.join_inner()
    }

    /// Waits for the thread to finish without requesting a stop.
    pub fn join(mut self) -> Result<StoppedQueue<T, H>, QueueThreadPanicked> {
        self.join_inner()
    }

    fn join_inner(&mut self) -> Result<StoppedQueue<T, H>, QueueThreadPanicked> {
        let Some(handle) = self.handle.take() else {
            return Err(QueueThreadPanicked {
                thread: self.name.clone(),
                message: "thread already joined".to_string(),
            });
        };

        handle.join().map_err(|payload| QueueThreadPanicked {
            thread: self.name.clone(),
            message: panic_message(payload.as_ref()),
        })
    }
}

impl<T, H> Drop for QueueThread<T, H>
where
    H: MessageHandler<T>,
{
    fn drop(&mut self) {
        if self.handle.is_none() {
            return;
        }
        self.poster.request_stop();
        if let Err(e) = self.join_inner() {
            log::error!("{e}");
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::time::Duration;

    fn recorder() -> impl FnMut(u32) -> Result<(), Infallible> + Send {
        let mut seen = Vec::new();
        move |m| {
            seen.push(m);
            Ok(())
        }
    }

    #[derive(Default)]
    struct Collect(Vec<u32>);

    impl MessageHandler<u32> for Collect {
        type Error = String;

        fn handle(&mut self, message: u32) -> Result<(), String> {
            if message == u32::MAX {
                return Err("poison".to_string());
            }
            self.0.push(message);
            Ok(())
        }
    }

    #[test]
    fn process_queue_delivers_in_post_order() {
        let mut q = MessageQueue::new(Collect::default());
        for i in 0..100 {
            q.post(i).unwrap();
        }
        assert_eq!(q.process_queue().unwrap(), 100);
        assert_eq!(q.handler().0, (0..100).collect::<Vec<_>>());
        assert!(q.is_empty());
    }

    #[test]
    fn process_queue_on_empty_queue_is_a_no_op() {
        let mut q = MessageQueue::new(Collect::default());
        assert_eq!(q.process_queue().unwrap(), 0);
        assert_eq!(q.process_queue().unwrap(), 0);
        assert!(q.handler().0.is_empty());
    }

    #[test]
    fn each_message_is_delivered_once_across_drains() {
        let mut q = MessageQueue::new(Collect::default());
        q.post(1).unwrap();
        q.process_queue().unwrap();
        q.post(2).unwrap();
        q.process_queue().unwrap();
        q.process_queue().unwrap();
        assert_eq!(q.handler().0, vec![1, 2]);
    }

    #[test]
    fn drain_is_bounded_by_backlog_at_entry() {
        let poster_slot: Arc<std::sync::Mutex<Option<Poster<u32>>>> = Arc::default();
        let slot = poster_slot.clone();
        let mut q: MessageQueue<u32, _> = MessageQueue::new(move |m: u32| -> Result<(), Infallible> {
            // Re-post each message once; the repost must wait for the next drain.
            if m < 10
                && let Some(p) = slot.lock().unwrap().as_ref()
            {
                p.post(m + 10).unwrap();
            }
            Ok(())
        });
        *poster_slot.lock().unwrap() = Some(q.poster());

        q.post(1).unwrap();
        q.post(2).unwrap();
        assert_eq!(q.process_queue().unwrap(), 2);
        assert_eq!(q.len(), 2);
        assert_eq!(q.process_queue().unwrap(), 2);
        assert_eq!(q.len(), 0);
    }

    #[test]
    fn handler_error_propagates_and_leaves_rest_queued() {
        let mut q = MessageQueue::new(Collect::default());
        q.post(1).unwrap();
        q.post(u32::MAX).unwrap();
        q.post(3).unwrap();

        assert_eq!(q.process_queue().unwrap_err(), "poison");
        assert_eq!(q.handler().0, vec![1]);
        assert_eq!(q.len(), 1);

        q.process_queue().unwrap();
        assert_eq!(q.handler().0, vec![1, 3]);
    }

    #[test]
    fn concurrent_producers_keep_their_own_order() {
        const PRODUCERS: u32 = 4;
        const PER_PRODUCER: u32 = 500;

        let mut q = MessageQueue::new(Collect::default());
        let threads: Vec<_> = (0..PRODUCERS)
            .map(|p| {
                let poster = q.poster();
                std::thread::spawn(move || {
                    for i in 0..PER_PRODUCER {
                        poster.post(p * 10_000 + i).unwrap();
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }

        q.process_queue().unwrap();
        let seen = &q.handler().0;
        assert_eq!(seen.len(), (PRODUCERS * PER_PRODUCER) as usize);

        for p in 0..PRODUCERS {
            let mine: Vec<u32> = seen.iter().copied().filter(|m| m / 10_000 == p).collect();
            let expected: Vec<u32> = (0..PER_PRODUCER).map(|i| p * 10_000 + i).collect();
            assert_eq!(mine, expected, "producer {p} out of order");
        }
    }

    #[test]
    fn post_after_dispose_fails() {
        let q: MessageQueue<u32, _> = MessageQueue::new(recorder());
        let poster = q.poster();
        poster.post(1).unwrap();
        assert_eq!(q.dispose(), 1);
        assert_eq!(poster.post(2), Err(QueueError::Disposed));
    }

    #[test]
    fn queue_thread_delivers_and_stops() {
        let (seen_tx, seen_rx) = crossbeam_channel::unbounded();
        let q: MessageQueue<u32, _> = MessageQueue::new(move |m: u32| -> Result<(), Infallible> {
            seen_tx.send(m).unwrap();
            Ok(())
        });
        let thread = q.start_in_another_thread("test-queue").unwrap();
        for i in 0..20 {
            thread.post(i).unwrap();
        }

        let received: Vec<u32> = (0..20)
            .map(|_| seen_rx.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        assert_eq!(received, (0..20).collect::<Vec<_>>());

        let stopped = thread.stop().unwrap();
        assert!(stopped.outcome.is_ok());
        assert!(stopped.queue.is_empty());
    }

    #[test]
    fn stop_wakes_an_idle_queue_thread() {
        let q = MessageQueue::new(Collect::default());
        let thread = q.start_in_another_thread("idle-queue").unwrap();
        std::thread::sleep(Duration::from_millis(20));
        assert!(!thread.is_finished());
        let stopped = thread.stop().unwrap();
        assert!(stopped.queue.handler().0.is_empty());
    }

    #[test]
    fn message_posted_during_stop_is_counted_as_discarded() {
        let q = MessageQueue::new(Collect::default());
        let poster = q.poster();
        let thread = q.start_in_another_thread("stopping-queue").unwrap();
        std::thread::sleep(Duration::from_millis(20));

        // The loop either drops the message after waking or never dequeues it.
        poster.request_stop();
        poster.post(5).unwrap();
        let mut stopped = thread.join().unwrap();

        assert!(stopped.outcome.is_ok());
        assert!(stopped.queue.handler().0.is_empty());
        assert_eq!(stopped.queue.clear(), 1);
        assert_eq!(stopped.queue.clear(), 0);
    }

    #[test]
    fn handler_error_ends_queue_thread() {
        let q = MessageQueue::new(Collect::default());
        let thread = q.start_in_another_thread("failing-queue").unwrap();
        thread.post(7).unwrap();
        thread.post(u32::MAX).unwrap();

        let stopped = thread.join().unwrap();
        assert_eq!(stopped.outcome.unwrap_err(), "poison");
        assert_eq!(stopped.queue.handler().0, vec![7]);
    }

    #[test]
    fn panicking_handler_is_reported() {
        let q: MessageQueue<u32, _> = MessageQueue::new(|_: u32| -> Result<(), Infallible> { panic!("boom") });
        let thread = q.start_in_another_thread("panicking-queue").unwrap();
        thread.post(1).unwrap();

        let err = match thread.join() {
            Err(e) => e,
            Ok(_) => panic!("expected the queue thread to panic"),
        };
        assert_eq!(err.thread, "panicking-queue");
        assert_eq!(err.message, "boom");
    }

    #[test]
    fn dropping_queue_thread_stops_it() {
        let q = MessageQueue::new(Collect::default());
        let poster = q.poster();
        let thread = q.start_in_another_thread("dropped-queue").unwrap();
        drop(thread);
        assert_eq!(poster.post(1), Err(QueueError::Disposed));
    }
}
