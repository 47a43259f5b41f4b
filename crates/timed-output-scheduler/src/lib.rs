//! One-shot timers and deferred work queues for timed-output drivers.
//!
//! This crate provides the two-tier scheduling model actuator drivers use:
//!
//! - **PulseTimer**: a one-shot timer whose callback runs on a dedicated
//!   timer thread, standing in for hard-IRQ timer context. Callbacks must
//!   not block and must not allocate.
//! - **DeferredWorker**: a FIFO work queue with its own thread where work may
//!   block on hardware I/O. Scheduling is lock-free and allocation-free, so
//!   timer callbacks can hand work over.
//!
//! Both support synchronous cancellation that waits for an in-flight
//! callback or job to finish (cancel-and-drain), which is what suspend and
//! teardown paths need.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use portable_atomic::{AtomicU32, Ordering};
//! use std::time::Duration;
//! use timed_output_scheduler::{DeferredWorker, PulseTimer};
//!
//! let runs = Arc::new(AtomicU32::new(0));
//! let counter = Arc::clone(&runs);
//! let worker = DeferredWorker::spawn("stop", 16, move || {
//!     counter.fetch_add(1, Ordering::Relaxed);
//! })?;
//!
//! let handle = worker.handle();
//! let timer = PulseTimer::spawn("pulse", move || {
//!     handle.schedule();
//! })?;
//!
//! timer.start(Duration::from_millis(10))?;
//! std::thread::sleep(Duration::from_millis(50));
//! worker.flush()?;
//! assert_eq!(runs.load(Ordering::Relaxed), 1);
//! # Ok::<(), timed_output_errors::SchedulerError>(())
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]
#![deny(unused_must_use)]

pub mod prelude;
pub mod timer;
pub mod worker;

pub use timed_output_errors::{SchedulerError, SchedulerResult};
pub use timer::{PulseTimer, TimerHandle};
pub use worker::{DeferredWorker, ScheduleOutcome, WorkerHandle, WorkerStats};

/// Default depth of a deferred worker's request queue.
pub const DEFAULT_QUEUE_DEPTH: usize = 16;
