//! Prelude for timed-output-scheduler.

pub use crate::DEFAULT_QUEUE_DEPTH;
pub use crate::timer::{PulseTimer, TimerHandle};
pub use crate::worker::{DeferredWorker, ScheduleOutcome, WorkerHandle, WorkerStats};
pub use timed_output_errors::{SchedulerError, SchedulerResult};
