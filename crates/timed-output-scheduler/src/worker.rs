//! Deferred work queue.
//!
//! A `DeferredWorker` runs a single job function on its own thread whenever
//! it is scheduled. Scheduling follows work-item semantics:
//!
//! - scheduling an item that is already pending is a no-op (coalesced)
//! - scheduling while the job is running queues exactly one more run
//! - requests are served in FIFO order, one at a time
//!
//! `schedule()` is a single atomic swap plus a non-blocking push onto a
//! bounded channel, so timer callbacks may call it.

use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use portable_atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use timed_output_errors::{SchedulerError, SchedulerResult};
use tracing::{debug, error, warn};

#[derive(Debug)]
enum WorkerMessage {
    Run,
    Flush(Sender<()>),
    Shutdown,
}

/// What happened to a schedule request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// A new run was queued.
    Queued,
    /// A run was already pending and absorbs this request.
    Coalesced,
    /// The queue was full or the worker has shut down. No run will happen.
    Dropped,
}

/// Counters describing a worker's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WorkerStats {
    /// Runs of the job function.
    pub executed: u64,
    /// Schedule requests merged into an already pending run.
    pub coalesced: u64,
    /// Pending runs removed by `cancel`.
    pub cancelled: u64,
    /// Schedule requests lost because the queue was full or closed.
    pub dropped: u64,
}

#[derive(Debug, Default)]
struct WorkerCounters {
    executed: AtomicU64,
    coalesced: AtomicU64,
    cancelled: AtomicU64,
    dropped: AtomicU64,
}

#[derive(Debug)]
struct WorkerShared {
    name: String,
    pending: AtomicBool,
    running: AtomicBool,
    counters: WorkerCounters,
}

/// Cloneable scheduling handle to a [`DeferredWorker`].
#[derive(Debug, Clone)]
pub struct WorkerHandle {
    shared: Arc<WorkerShared>,
    tx: Sender<WorkerMessage>,
}

impl WorkerHandle {
    /// Queue a run of the job.
    ///
    /// Returns `false` if a run was already pending, or if the request could
    /// not be queued. Non-blocking and allocation-free.
    pub fn schedule(&self) -> bool {
        self.try_schedule() == ScheduleOutcome::Queued
    }

    /// Queue a run of the job and report what happened to the request.
    ///
    /// Non-blocking and allocation-free.
    #[must_use]
    pub fn try_schedule(&self) -> ScheduleOutcome {
        if self.shared.pending.swap(true, Ordering::AcqRel) {
            self.shared
                .counters
                .coalesced
                .fetch_add(1, Ordering::Relaxed);
            return ScheduleOutcome::Coalesced;
        }

        match self.tx.try_send(WorkerMessage::Run) {
            Ok(()) => ScheduleOutcome::Queued,
            Err(TrySendError::Full(_) | TrySendError::Disconnected(_)) => {
                self.shared.pending.store(false, Ordering::Release);
                self.shared.counters.dropped.fetch_add(1, Ordering::Relaxed);
                ScheduleOutcome::Dropped
            }
        }
    }

    /// Whether a run is queued but has not started.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.shared.pending.load(Ordering::Acquire)
    }

    /// Worker name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.shared.name
    }
}

/// FIFO deferred work queue with a dedicated thread.
///
/// # Example
///
/// ```no_run
/// use timed_output_scheduler::DeferredWorker;
///
/// let worker = DeferredWorker::spawn("vib", 16, || {
///     // blocking hardware access is fine here
/// })?;
/// worker.schedule();
/// worker.flush()?;
/// assert_eq!(worker.stats().executed, 1);
/// # Ok::<(), timed_output_errors::SchedulerError>(())
/// ```
#[derive(Debug)]
pub struct DeferredWorker {
    handle: WorkerHandle,
    thread: Option<JoinHandle<()>>,
    thread_id: ThreadId,
}

impl DeferredWorker {
    /// Spawn the worker thread with a request queue of `queue_depth` slots.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::SpawnFailed`] if the thread cannot be created.
    pub fn spawn<F>(name: impl Into<String>, queue_depth: usize, job: F) -> SchedulerResult<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let name = name.into();
        let (tx, rx) = channel::bounded(queue_depth.max(1));
        let shared = Arc::new(WorkerShared {
            name: name.clone(),
            pending: AtomicBool::new(false),
            running: AtomicBool::new(false),
            counters: WorkerCounters::default(),
        });

        let thread_shared = Arc::clone(&shared);
        let thread = thread::Builder::new()
            .name(format!("worker-{name}"))
            .spawn(move || worker_thread_main(&thread_shared, &rx, job))
            .map_err(|e| SchedulerError::spawn_failed(&name, e.to_string()))?;
        let thread_id = thread.thread().id();
        debug!(worker = %name, queue_depth, "deferred worker started");

        Ok(Self {
            handle: WorkerHandle { shared, tx },
            thread: Some(thread),
            thread_id,
        })
    }

    /// A cloneable handle for scheduling from timer callbacks.
    #[must_use]
    pub fn handle(&self) -> WorkerHandle {
        self.handle.clone()
    }

    /// Queue a run of the job. See [`WorkerHandle::schedule`].
    pub fn schedule(&self) -> bool {
        self.handle.schedule()
    }

    /// Remove a pending run that has not started. Returns whether one was pending.
    ///
    /// A run already executing is not interrupted; use
    /// [`cancel_sync`](Self::cancel_sync) to also wait for it.
    pub fn cancel(&self) -> bool {
        let was_pending = self.handle.shared.pending.swap(false, Ordering::AcqRel);
        if was_pending {
            self.handle
                .shared
                .counters
                .cancelled
                .fetch_add(1, Ordering::Relaxed);
        }
        was_pending
    }

    /// Wait until every request queued before this call has been served.
    ///
    /// Called from the worker's own job it returns immediately.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::ShutDown`] if the worker thread has exited.
    pub fn flush(&self) -> SchedulerResult<()> {
        if thread::current().id() == self.thread_id {
            return Ok(());
        }
        let (ack_tx, ack_rx) = channel::bounded(1);
        if self.handle.tx.send(WorkerMessage::Flush(ack_tx)).is_err() {
            return Err(SchedulerError::ShutDown(self.handle.shared.name.clone()));
        }
        match ack_rx.recv() {
            Ok(()) => Ok(()),
            Err(channel::RecvError) => {
                Err(SchedulerError::ShutDown(self.handle.shared.name.clone()))
            }
        }
    }

    /// Cancel a pending run and wait for a running one to finish.
    ///
    /// Returns whether a pending run was removed.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::ShutDown`] if the worker thread has exited.
    pub fn cancel_sync(&self) -> SchedulerResult<bool> {
        let was_pending = self.cancel();
        self.flush()?;
        Ok(was_pending)
    }

    /// Whether a run is queued but has not started.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.handle.is_pending()
    }

    /// Whether the job is executing right now.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.shared.running.load(Ordering::Acquire)
    }

    /// Snapshot of the worker counters.
    #[must_use]
    pub fn stats(&self) -> WorkerStats {
        let counters = &self.handle.shared.counters;
        WorkerStats {
            executed: counters.executed.load(Ordering::Acquire),
            coalesced: counters.coalesced.load(Ordering::Acquire),
            cancelled: counters.cancelled.load(Ordering::Acquire),
            dropped: counters.dropped.load(Ordering::Acquire),
        }
    }

    /// Worker name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.handle.name()
    }
}

impl Drop for DeferredWorker {
    fn drop(&mut self) {
        // queued runs ahead of the shutdown message still execute
        if self.handle.tx.send(WorkerMessage::Shutdown).is_err() {
            warn!(worker = %self.handle.shared.name, "worker thread already gone");
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!(worker = %self.handle.shared.name, "worker thread panicked");
            } else {
                debug!(worker = %self.handle.shared.name, "deferred worker stopped");
            }
        }
    }
}

fn worker_thread_main<F: FnMut()>(shared: &WorkerShared, rx: &Receiver<WorkerMessage>, mut job: F) {
    for message in rx.iter() {
        match message {
            WorkerMessage::Run => {
                if !shared.pending.swap(false, Ordering::AcqRel) {
                    continue;
                }
                shared.running.store(true, Ordering::Release);
                job();
                shared.running.store(false, Ordering::Release);
                shared.counters.executed.fetch_add(1, Ordering::AcqRel);
            }
            WorkerMessage::Flush(ack) => {
                if ack.send(()).is_err() {
                    debug!(worker = %shared.name, "flush requester went away");
                }
            }
            WorkerMessage::Shutdown => break,
        }
    }
}
