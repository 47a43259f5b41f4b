//! One-shot pulse timer.
//!
//! A `PulseTimer` owns a dedicated thread that sleeps until the armed
//! deadline and then runs the callback once. The callback thread plays the
//! role of hard-IRQ timer context:
//!
//! - the callback runs to completion and is never re-entered
//! - it must not block and must not allocate
//! - it never holds the timer lock while running, so `start`/`try_cancel`
//!   from other threads never wait on it
//!
//! Re-arming an armed timer replaces its deadline. There is no restart mode:
//! every arm fires at most once.

use parking_lot::{Condvar, Mutex, MutexGuard};
use portable_atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};
use timed_output_errors::{SchedulerError, SchedulerResult};
use tracing::{debug, error};

/// Longest delay a timer accepts; longer requests are clamped.
pub const MAX_DELAY: Duration = Duration::from_secs(60 * 60 * 24);

const DISARMED: u64 = 0;

#[derive(Debug, Default)]
struct TimerSlot {
    deadline: Option<Instant>,
    running: bool,
    shutdown: bool,
}

#[derive(Debug)]
struct TimerShared {
    name: String,
    origin: Instant,
    slot: Mutex<TimerSlot>,
    changed: Condvar,
    /// Nanoseconds from `origin` to the deadline plus one, `DISARMED` when idle.
    deadline_ns: AtomicU64,
    fire_count: AtomicU64,
}

impl TimerShared {
    fn new(name: String) -> Self {
        Self {
            name,
            origin: Instant::now(),
            slot: Mutex::new(TimerSlot::default()),
            changed: Condvar::new(),
            deadline_ns: AtomicU64::new(DISARMED),
            fire_count: AtomicU64::new(0),
        }
    }

    fn encode(&self, deadline: Instant) -> u64 {
        let ns = deadline.saturating_duration_since(self.origin).as_nanos();
        u64::try_from(ns)
            .unwrap_or(u64::MAX - 1)
            .saturating_add(1)
    }

    fn arm(&self, delay: Duration) -> SchedulerResult<()> {
        let deadline = Instant::now() + delay.min(MAX_DELAY);
        let mut slot = self.slot.lock();
        if slot.shutdown {
            return Err(SchedulerError::ShutDown(self.name.clone()));
        }
        slot.deadline = Some(deadline);
        self.deadline_ns
            .store(self.encode(deadline), Ordering::Release);
        drop(slot);
        self.changed.notify_all();
        Ok(())
    }

    fn disarm(&self, slot: &mut MutexGuard<'_, TimerSlot>) -> bool {
        let was_armed = slot.deadline.take().is_some();
        self.deadline_ns.store(DISARMED, Ordering::Release);
        was_armed
    }

    fn try_cancel(&self) -> bool {
        let mut slot = self.slot.lock();
        let was_armed = self.disarm(&mut slot);
        drop(slot);
        self.changed.notify_all();
        was_armed
    }

    fn remaining(&self) -> Option<Duration> {
        let raw = self.deadline_ns.load(Ordering::Acquire);
        if raw == DISARMED {
            return None;
        }
        let deadline = self
            .origin
            .checked_add(Duration::from_nanos(raw - 1))?;
        Some(deadline.saturating_duration_since(Instant::now()))
    }

    fn is_armed(&self) -> bool {
        self.deadline_ns.load(Ordering::Acquire) != DISARMED
    }
}

/// Cloneable arm/cancel handle to a [`PulseTimer`].
///
/// Handles can be moved into callbacks of other timers and into deferred
/// work. They cannot wait for an in-flight callback; only the owning
/// [`PulseTimer`] can do that.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    shared: Arc<TimerShared>,
}

impl TimerHandle {
    /// Arm the timer to fire once after `delay`, replacing any pending deadline.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::ShutDown`] if the owning timer was dropped.
    pub fn start(&self, delay: Duration) -> SchedulerResult<()> {
        self.shared.arm(delay)
    }

    /// Disarm without waiting for a running callback. Returns whether a
    /// deadline was pending.
    pub fn try_cancel(&self) -> bool {
        self.shared.try_cancel()
    }

    /// Time left before the pending deadline, `None` when disarmed.
    ///
    /// Lock-free.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.shared.remaining()
    }

    /// Whether a deadline is pending.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.shared.is_armed()
    }

    /// Timer name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.shared.name
    }
}

/// One-shot timer backed by a dedicated thread.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use timed_output_scheduler::PulseTimer;
///
/// let timer = PulseTimer::spawn("vib", || {})?;
/// timer.start(Duration::from_millis(100))?;
/// assert!(timer.is_armed());
/// timer.cancel();
/// assert!(!timer.is_armed());
/// # Ok::<(), timed_output_errors::SchedulerError>(())
/// ```
#[derive(Debug)]
pub struct PulseTimer {
    shared: Arc<TimerShared>,
    thread: Option<JoinHandle<()>>,
    thread_id: ThreadId,
}

impl PulseTimer {
    /// Spawn the timer thread. The timer starts disarmed.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::SpawnFailed`] if the thread cannot be created.
    pub fn spawn<F>(name: impl Into<String>, callback: F) -> SchedulerResult<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let name = name.into();
        let shared = Arc::new(TimerShared::new(name.clone()));
        let thread_shared = Arc::clone(&shared);
        let thread = thread::Builder::new()
            .name(format!("timer-{name}"))
            .spawn(move || timer_thread_main(&thread_shared, callback))
            .map_err(|e| SchedulerError::spawn_failed(&name, e.to_string()))?;
        let thread_id = thread.thread().id();
        debug!(timer = %name, "pulse timer started");

        Ok(Self {
            shared,
            thread: Some(thread),
            thread_id,
        })
    }

    /// A cloneable handle for arming this timer from other contexts.
    #[must_use]
    pub fn handle(&self) -> TimerHandle {
        TimerHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Arm the timer to fire once after `delay`, replacing any pending deadline.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::ShutDown`] after the timer has been shut down.
    pub fn start(&self, delay: Duration) -> SchedulerResult<()> {
        self.shared.arm(delay)
    }

    /// Disarm without waiting. Returns whether a deadline was pending.
    pub fn try_cancel(&self) -> bool {
        self.shared.try_cancel()
    }

    /// Disarm and wait for a callback that already started to return.
    ///
    /// Returns whether a deadline was pending. Called from the timer's own
    /// callback it only disarms, since waiting would never finish.
    pub fn cancel(&self) -> bool {
        let mut slot = self.shared.slot.lock();
        let was_armed = self.shared.disarm(&mut slot);
        self.shared.changed.notify_all();
        if thread::current().id() == self.thread_id {
            return was_armed;
        }
        while slot.running {
            self.shared.changed.wait(&mut slot);
        }
        was_armed
    }

    /// Time left before the pending deadline, `None` when disarmed.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.shared.remaining()
    }

    /// Whether a deadline is pending.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.shared.is_armed()
    }

    /// Whether the callback is executing right now.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.shared.slot.lock().running
    }

    /// How many times the callback has fired.
    #[must_use]
    pub fn fire_count(&self) -> u64 {
        self.shared.fire_count.load(Ordering::Acquire)
    }

    /// Timer name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.shared.name
    }
}

impl Drop for PulseTimer {
    fn drop(&mut self) {
        {
            let mut slot = self.shared.slot.lock();
            slot.shutdown = true;
            self.shared.disarm(&mut slot);
        }
        self.shared.changed.notify_all();

        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!(timer = %self.shared.name, "timer thread panicked");
            } else {
                debug!(timer = %self.shared.name, "pulse timer stopped");
            }
        }
    }
}

fn timer_thread_main<F: FnMut()>(shared: &TimerShared, mut callback: F) {
    let mut slot = shared.slot.lock();
    loop {
        if slot.shutdown {
            break;
        }
        let Some(deadline) = slot.deadline else {
            shared.changed.wait(&mut slot);
            continue;
        };
        if Instant::now() < deadline {
            let _timeout = shared.changed.wait_until(&mut slot, deadline);
            continue;
        }

        slot.deadline = None;
        shared.deadline_ns.store(DISARMED, Ordering::Release);
        slot.running = true;
        shared.fire_count.fetch_add(1, Ordering::AcqRel);
        MutexGuard::unlocked(&mut slot, &mut callback);
        slot.running = false;
        shared.changed.notify_all();
    }
}
