//! The vibrator controller.
//!
//! # Contexts
//!
//! Four threads touch a controller besides its callers:
//!
//! - the pulse timer thread drops the enable line and schedules the stop job
//! - the feedback timer thread does the same for the feedback job
//! - the stop worker ends the pulse or arms a feedback correction
//! - the feedback worker ends a corrected pulse
//!
//! Timer callbacks only read and write atomics, drop the enable line and
//! schedule work. Everything that blocks on the actuator runs on a worker or
//! on the caller's thread, serialized by the transition lock. Timer callbacks
//! never take that lock.

use crate::config::VibratorConfig;
use crate::metrics::{MetricsCounters, VibratorMetrics};
use crate::state::{AtomicPulseState, PulseState};
use parking_lot::Mutex;
use portable_atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use timed_output_errors::{ActuatorError, SchedulerResult, VibratorError, VibratorResult};
use timed_output_hal::{ActuatorCapabilities, HardwareActuator, MonotonicClock, PinFunction};
use timed_output_scheduler::{
    DeferredWorker, PulseTimer, ScheduleOutcome, TimerHandle, WorkerHandle,
};
use tracing::{debug, info, warn};

/// State shared between the controller and its timer and worker threads.
struct ControllerInner {
    actuator: Arc<dyn HardwareActuator>,
    clock: Arc<dyn MonotonicClock>,
    config: VibratorConfig,
    capabilities: ActuatorCapabilities,

    /// Serializes activation and deactivation. Never taken in timer context.
    transition: Mutex<()>,

    state: AtomicPulseState,
    duty_us: AtomicU32,
    requested_ms: AtomicU64,
    started_at_ms: AtomicU64,
    disable_deadline_ms: AtomicU64,

    /// Bumped by every `enable(v>0)`.
    generation: AtomicU64,
    /// Generation observed by the last pulse timer firing.
    fired_generation: AtomicU64,
    /// Generation the armed feedback timer belongs to.
    feedback_generation: AtomicU64,

    /// Whether this controller holds an enable reference on the power domain.
    power_held: AtomicBool,
    /// Overrun recorded in timer context, reported by the stop job. 0 = none.
    pending_overrun_ms: AtomicU64,
    /// Worker requests lost in timer context and not yet logged.
    unreported_drops: AtomicU64,

    counters: MetricsCounters,
}

impl ControllerInner {
    fn new(
        actuator: Arc<dyn HardwareActuator>,
        clock: Arc<dyn MonotonicClock>,
        config: VibratorConfig,
    ) -> Self {
        let capabilities = actuator.capabilities();
        let duty_us = config.default_duty_us;
        Self {
            actuator,
            clock,
            config,
            capabilities,
            transition: Mutex::new(()),
            state: AtomicPulseState::new(),
            duty_us: AtomicU32::new(duty_us),
            requested_ms: AtomicU64::new(0),
            started_at_ms: AtomicU64::new(0),
            disable_deadline_ms: AtomicU64::new(0),
            generation: AtomicU64::new(0),
            fired_generation: AtomicU64::new(0),
            feedback_generation: AtomicU64::new(0),
            power_held: AtomicBool::new(false),
            pending_overrun_ms: AtomicU64::new(0),
            unreported_drops: AtomicU64::new(0),
            counters: MetricsCounters::default(),
        }
    }

    fn io_failure(&self, operation: &'static str, err: &ActuatorError) {
        self.counters.record_io_failure();
        warn!(operation, error = %err, severity = %err.severity(), "actuator I/O failed");
    }

    /// Record the outcome of a schedule request. Timer context.
    fn note_schedule(&self, outcome: ScheduleOutcome) {
        if outcome == ScheduleOutcome::Dropped {
            self.counters.record_dropped_request();
            self.unreported_drops.fetch_add(1, Ordering::AcqRel);
        }
    }

    /// Log worker requests the timer callbacks could not queue.
    fn report_dropped_requests(&self) {
        let dropped = self.unreported_drops.swap(0, Ordering::AcqRel);
        if dropped > 0 {
            warn!(
                dropped,
                state = ?self.state.load(),
                "timer could not queue deferred work"
            );
        }
    }

    /// Drive the motor. Caller holds the transition lock.
    fn activate(&self) {
        if self.capabilities.pwm {
            let duty = self.duty_us.load(Ordering::Acquire);
            if let Err(e) = self
                .actuator
                .set_output(duty, self.config.playback_period_us)
            {
                self.io_failure("set_output", &e);
            }
        }

        // a retrigger keeps the reference it already holds
        if !self.power_held.load(Ordering::Acquire) {
            match self.actuator.power(true) {
                Ok(()) => self.power_held.store(true, Ordering::Release),
                Err(e) => self.io_failure("power_on", &e),
            }
        }

        self.started_at_ms
            .store(self.clock.now_ms(), Ordering::Release);
        self.state.swap(PulseState::Pulsing);
        self.actuator.enable_line(true);
        self.counters.record_pulse_started();
    }

    /// Stop the motor. Caller holds the transition lock. Safe to repeat.
    ///
    /// Returns the state before the call.
    fn deactivate(&self) -> PulseState {
        if self.capabilities.pwm {
            if let Err(e) = self
                .actuator
                .set_output(self.config.neutral_duty_us, self.config.playback_period_us)
            {
                self.io_failure("park_output", &e);
            }
            if let Err(e) = self.actuator.disable_output() {
                self.io_failure("disable_output", &e);
            }
        }
        self.actuator.enable_line(false);

        if self.power_held.swap(false, Ordering::AcqRel) {
            if let Err(e) = self.actuator.power(false) {
                // keep the reference so the next deactivation retries
                self.power_held.store(true, Ordering::Release);
                self.io_failure("power_off", &e);
            }
        }

        self.state.swap(PulseState::Idle)
    }

    /// Pulse timer callback. Timer context.
    fn on_pulse_timer(&self, stop_worker: &WorkerHandle) {
        let now = self.clock.now_ms();
        let deadline = self.disable_deadline_ms.load(Ordering::Acquire);
        if now > deadline {
            let requested_end =
                deadline.saturating_sub(u64::from(self.config.overrun_slack_ms));
            let overrun = now.saturating_sub(requested_end);
            self.counters.record_overrun(overrun);
            self.pending_overrun_ms.store(overrun, Ordering::Release);
        }
        self.fired_generation.store(
            self.generation.load(Ordering::Acquire),
            Ordering::Release,
        );
        self.actuator.enable_line(false);
        self.note_schedule(stop_worker.try_schedule());
    }

    /// Feedback timer callback. Timer context.
    fn on_feedback_timer(&self, feedback_worker: &WorkerHandle) {
        if self.feedback_generation.load(Ordering::Acquire)
            != self.generation.load(Ordering::Acquire)
        {
            self.counters.record_stale_feedback();
            return;
        }
        self.actuator.enable_line(false);
        self.note_schedule(feedback_worker.try_schedule());
    }

    /// Stop job. Ends the pulse, or arms a feedback correction if the pulse
    /// timer fired before the pulse had run for its requested duration.
    fn stop_job(&self, feedback_timer: &TimerHandle) {
        let _transition = self.transition.lock();
        self.report_dropped_requests();

        let overrun = self.pending_overrun_ms.swap(0, Ordering::AcqRel);
        if overrun > 0 {
            warn!(
                overrun_ms = overrun,
                requested_ms = self.requested_ms.load(Ordering::Acquire),
                "pulse ran longer than requested"
            );
        }

        if !self.state.is_pulsing() {
            debug!("stop job found no pulse in flight");
            return;
        }
        let fired = self.fired_generation.load(Ordering::Acquire);
        if fired != self.generation.load(Ordering::Acquire) {
            debug!(generation = fired, "stop job superseded by a newer pulse");
            return;
        }

        let requested = self.requested_ms.load(Ordering::Acquire);
        let elapsed = self
            .clock
            .now_ms()
            .saturating_sub(self.started_at_ms.load(Ordering::Acquire));
        let shortfall = requested.saturating_sub(elapsed);

        if shortfall >= u64::from(self.config.feedback_threshold_ms) {
            let delay = Duration::from_millis(shortfall.saturating_sub(1));
            self.feedback_generation.store(fired, Ordering::Release);
            match feedback_timer.start(delay) {
                Ok(()) => {
                    self.counters.record_feedback_correction();
                    debug!(
                        requested_ms = requested,
                        elapsed_ms = elapsed,
                        correction_ms = shortfall,
                        "pulse short, feedback timer armed"
                    );
                }
                Err(e) => {
                    warn!(error = %e, "feedback timer unavailable, stopping now");
                    self.deactivate();
                    self.counters.record_pulse_completed();
                }
            }
        } else {
            self.deactivate();
            self.counters.record_pulse_completed();
            debug!(requested_ms = requested, elapsed_ms = elapsed, "pulse complete");
        }
    }

    /// Feedback job. Ends a pulse that the stop job corrected.
    fn feedback_job(&self) {
        let _transition = self.transition.lock();
        self.report_dropped_requests();
        let owner = self.feedback_generation.load(Ordering::Acquire);
        if owner != self.generation.load(Ordering::Acquire) {
            self.counters.record_stale_feedback();
            debug!(generation = owner, "feedback job superseded by a newer pulse");
            return;
        }
        if self.deactivate() == PulseState::Pulsing {
            self.counters.record_pulse_completed();
            debug!(
                elapsed_ms = self
                    .clock
                    .now_ms()
                    .saturating_sub(self.started_at_ms.load(Ordering::Acquire)),
                "pulse complete after feedback correction"
            );
        }
    }
}

impl core::fmt::Debug for ControllerInner {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ControllerInner")
            .field("capabilities", &self.capabilities)
            .field("state", &self.state.load())
            .field("duty_us", &self.duty_us.load(Ordering::Relaxed))
            .field("generation", &self.generation.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// Timed vibration-motor controller.
///
/// Converts `enable(ms)` commands into bounded pulses on a
/// [`HardwareActuator`]. One controller owns one actuator.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use timed_output_hal::{ActuatorCapabilities, SoftwareActuator, SystemClock};
/// use timed_output_vibrator::{VibratorConfig, VibratorController};
///
/// let actuator = Arc::new(SoftwareActuator::new(ActuatorCapabilities::both()));
/// let controller = VibratorController::attach(
///     actuator.clone(),
///     Arc::new(SystemClock::new()),
///     VibratorConfig::default(),
/// )?;
///
/// controller.enable(100);
/// assert!(actuator.is_active());
/// assert!(controller.remaining_ms() > 0);
/// # Ok::<(), timed_output_errors::VibratorError>(())
/// ```
#[derive(Debug)]
pub struct VibratorController {
    inner: Arc<ControllerInner>,
    pulse_timer: PulseTimer,
    stop_worker: DeferredWorker,
    feedback_timer: PulseTimer,
    feedback_worker: DeferredWorker,
    suspended: AtomicBool,
    detached: bool,
}

struct Scheduling {
    pulse_timer: PulseTimer,
    stop_worker: DeferredWorker,
    feedback_timer: PulseTimer,
    feedback_worker: DeferredWorker,
}

fn spawn_scheduling(inner: &Arc<ControllerInner>) -> SchedulerResult<Scheduling> {
    let config = &inner.config;

    let job_inner = Arc::clone(inner);
    let feedback_worker = DeferredWorker::spawn(
        config.feedback_queue_name.clone(),
        config.worker_queue_depth,
        move || job_inner.feedback_job(),
    )?;

    let timer_inner = Arc::clone(inner);
    let feedback_handle = feedback_worker.handle();
    let feedback_timer = PulseTimer::spawn(
        format!("{}-timer", config.feedback_queue_name),
        move || timer_inner.on_feedback_timer(&feedback_handle),
    )?;

    let job_inner = Arc::clone(inner);
    let feedback_timer_handle = feedback_timer.handle();
    let stop_worker = DeferredWorker::spawn(
        config.stop_queue_name.clone(),
        config.worker_queue_depth,
        move || job_inner.stop_job(&feedback_timer_handle),
    )?;

    let timer_inner = Arc::clone(inner);
    let stop_handle = stop_worker.handle();
    let pulse_timer = PulseTimer::spawn(
        format!("{}-timer", config.stop_queue_name),
        move || timer_inner.on_pulse_timer(&stop_handle),
    )?;

    Ok(Scheduling {
        pulse_timer,
        stop_worker,
        feedback_timer,
        feedback_worker,
    })
}

impl VibratorController {
    /// Attach a controller to `actuator`.
    ///
    /// Validates `config`, acquires the actuator, drives its enable line low
    /// and starts the timer and worker threads. On failure every resource
    /// acquired so far is released.
    ///
    /// # Errors
    ///
    /// - [`VibratorError::InvalidConfig`] if `config` fails validation
    /// - [`VibratorError::NoOutput`] if the actuator has no enable line and no PWM
    /// - [`VibratorError::Actuator`] if the actuator cannot be acquired
    /// - [`VibratorError::Scheduler`] if a timer or worker thread cannot start
    pub fn attach(
        actuator: Arc<dyn HardwareActuator>,
        clock: Arc<dyn MonotonicClock>,
        config: VibratorConfig,
    ) -> VibratorResult<Self> {
        config.validate()?;
        let capabilities = actuator.capabilities();
        if !capabilities.has_output() {
            return Err(VibratorError::NoOutput);
        }

        if let Err(e) = actuator.probe() {
            actuator.release();
            return Err(e.into());
        }
        actuator.enable_line(false);

        let inner = Arc::new(ControllerInner::new(Arc::clone(&actuator), clock, config));
        let scheduling = match spawn_scheduling(&inner) {
            Ok(scheduling) => scheduling,
            Err(e) => {
                actuator.release();
                return Err(e.into());
            }
        };

        info!(
            enable_line = capabilities.enable_line,
            pwm = capabilities.pwm,
            duty_us = inner.config.default_duty_us,
            period_us = inner.config.playback_period_us,
            "vibrator attached"
        );

        Ok(Self {
            inner,
            pulse_timer: scheduling.pulse_timer,
            stop_worker: scheduling.stop_worker,
            feedback_timer: scheduling.feedback_timer,
            feedback_worker: scheduling.feedback_worker,
            suspended: AtomicBool::new(false),
            detached: false,
        })
    }

    /// Start, restart or stop a pulse.
    ///
    /// - `value_ms < 0` is ignored
    /// - `value_ms == 0` stops the motor and cancels any pending pulse
    /// - `value_ms > 0` drives the motor for `value_ms` milliseconds,
    ///   replacing any pulse in flight
    ///
    /// Never waits for the pulse to end. A retrigger waits for a timer
    /// callback of the previous pulse that is already running, which never
    /// blocks.
    pub fn enable(&self, value_ms: i64) {
        let Ok(value_ms) = u64::try_from(value_ms) else {
            return;
        };
        if value_ms == 0 {
            self.stop();
        } else {
            self.start(value_ms);
        }
    }

    fn start(&self, value_ms: u64) {
        let inner = &self.inner;
        let _transition = inner.transition.lock();
        inner.report_dropped_requests();

        let generation = inner.generation.fetch_add(1, Ordering::AcqRel).wrapping_add(1);
        let now = inner.clock.now_ms();
        inner.requested_ms.store(value_ms, Ordering::Release);
        inner.disable_deadline_ms.store(
            now.saturating_add(value_ms)
                .saturating_add(u64::from(inner.config.overrun_slack_ms)),
            Ordering::Release,
        );

        // a callback of the previous pulse may still be about to drop the
        // enable line; let it finish before the line goes up again
        self.feedback_timer.cancel();
        self.pulse_timer.cancel();

        if let Err(e) = self.pulse_timer.start(Duration::from_millis(value_ms)) {
            warn!(error = %e, "pulse timer unavailable, pulse not started");
            return;
        }
        inner.activate();
        debug!(duration_ms = value_ms, generation, "pulse started");
    }

    fn stop(&self) {
        let inner = &self.inner;
        let _transition = inner.transition.lock();
        inner.report_dropped_requests();

        let pulse_armed = self.pulse_timer.try_cancel();
        let feedback_armed = self.feedback_timer.try_cancel();
        if !inner.state.is_pulsing() && !pulse_armed && !feedback_armed {
            return;
        }

        if inner.deactivate() == PulseState::Pulsing {
            inner.counters.record_explicit_stop();
            debug!("pulse stopped on request");
        }
    }

    /// Milliseconds left on the pulse timer while a pulse is in flight, else 0.
    ///
    /// Rounds up, so an armed timer never reads 0. Lock-free.
    #[must_use]
    pub fn remaining_ms(&self) -> u64 {
        if !self.inner.state.is_pulsing() {
            return 0;
        }
        self.pulse_timer
            .remaining()
            .map_or(0, |left| u64::try_from(left.as_micros().div_ceil(1000)).unwrap_or(u64::MAX))
    }

    /// Set the duty cycle used by the next activation, clamped to
    /// `[0, playback_period_us]`. Returns the stored value.
    pub fn set_duty_cycle(&self, value: i64) -> u32 {
        let duty = self.inner.config.clamp_duty(value);
        self.inner.duty_us.store(duty, Ordering::Release);
        debug!(requested = value, duty_us = duty, "duty cycle set");
        duty
    }

    /// Current duty cycle in microseconds.
    #[must_use]
    pub fn duty_cycle(&self) -> u32 {
        self.inner.duty_us.load(Ordering::Acquire)
    }

    /// Current pulse state.
    #[must_use]
    pub fn state(&self) -> PulseState {
        self.inner.state.load()
    }

    /// Duration of the most recent pulse request, in milliseconds.
    #[must_use]
    pub fn requested_ms(&self) -> u64 {
        self.inner.requested_ms.load(Ordering::Acquire)
    }

    /// Whether the controller is suspended.
    #[must_use]
    pub fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::Acquire)
    }

    /// Outputs of the attached actuator.
    #[must_use]
    pub fn capabilities(&self) -> ActuatorCapabilities {
        self.inner.capabilities
    }

    /// Controller configuration.
    #[must_use]
    pub fn config(&self) -> &VibratorConfig {
        &self.inner.config
    }

    /// Snapshot of the controller counters.
    #[must_use]
    pub fn metrics(&self) -> VibratorMetrics {
        self.inner.counters.snapshot()
    }

    /// Clear the controller counters.
    pub fn reset_metrics(&self) {
        self.inner.counters.reset();
    }

    /// Wait until both workers have run every job scheduled before this call.
    ///
    /// A stop job may arm the feedback timer; this does not wait for it.
    ///
    /// # Errors
    ///
    /// Returns an error if a worker thread has exited.
    pub fn flush(&self) -> VibratorResult<()> {
        self.stop_worker.flush()?;
        self.feedback_worker.flush()?;
        Ok(())
    }

    /// Stop the motor, cancel and drain both timer/worker pairs, then park
    /// the PWM pin as a plain GPIO driven low.
    ///
    /// Safe in any state and safe to repeat. Does not block `enable()` from
    /// starting a new pulse afterwards.
    pub fn suspend(&self) {
        self.quiesce();
        if self.inner.capabilities.pwm {
            if let Err(e) = self.inner.actuator.set_pin_function(PinFunction::GpioLow) {
                self.inner.io_failure("park_pin", &e);
            }
        }
        if !self.suspended.swap(true, Ordering::AcqRel) {
            info!("vibrator suspended");
        }
    }

    /// Return the PWM pin to the PWM controller and restore the default duty
    /// cycle. Never starts a pulse.
    pub fn resume(&self) {
        if self.inner.capabilities.pwm {
            if let Err(e) = self.inner.actuator.set_pin_function(PinFunction::Pwm) {
                self.inner.io_failure("restore_pin", &e);
            }
            self.inner
                .duty_us
                .store(self.inner.config.default_duty_us, Ordering::Release);
        }
        if self.suspended.swap(false, Ordering::AcqRel) {
            info!("vibrator resumed");
        }
    }

    /// Stop the motor, drain every timer and worker and release the actuator.
    pub fn detach(mut self) {
        self.teardown();
    }

    /// Deactivate, then cancel each timer and drain its worker in hand-off
    /// order, then deactivate again in case a job raced the first pass.
    fn quiesce(&self) {
        {
            let _transition = self.inner.transition.lock();
            self.inner.deactivate();
        }

        self.pulse_timer.cancel();
        if let Err(e) = self.stop_worker.cancel_sync() {
            warn!(error = %e, "stop worker drain failed");
        }
        self.feedback_timer.cancel();
        if let Err(e) = self.feedback_worker.cancel_sync() {
            warn!(error = %e, "feedback worker drain failed");
        }

        let _transition = self.inner.transition.lock();
        self.inner.deactivate();
    }

    fn teardown(&mut self) {
        if self.detached {
            return;
        }
        self.detached = true;
        self.quiesce();
        self.inner.actuator.release();

        let metrics = self.inner.counters.snapshot();
        info!(
            pulses = metrics.pulses_started,
            overruns = metrics.overruns,
            io_failures = metrics.io_failures,
            "vibrator detached"
        );
    }
}

impl Drop for VibratorController {
    fn drop(&mut self) {
        self.teardown();
    }
}
