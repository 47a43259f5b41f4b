//! Software actuator implementation.
//!
//! `SoftwareActuator` keeps the electrical state of a simulated motor in
//! atomics and appends every transition to an event log, so tests can assert
//! both the final state and the exact hardware sequence the controller issued.

use crate::actuator::{ActuatorCapabilities, HardwareActuator, PinFunction};
use parking_lot::Mutex;
use portable_atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};
use std::time::Instant;
use timed_output_errors::{ActuatorError, ActuatorResult};
use tracing::trace;

/// A single hardware transition issued to the actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorEvent {
    /// Resources acquired.
    Probe,
    /// Enable line driven.
    EnableLine(bool),
    /// PWM programmed and enabled.
    SetOutput {
        /// High time per period in microseconds.
        duty_us: u32,
        /// PWM period in microseconds.
        period_us: u32,
    },
    /// PWM disabled.
    DisableOutput,
    /// Power domain switched.
    Power(bool),
    /// PWM pin re-routed.
    PinFunction(PinFunction),
    /// Resources released.
    Release,
}

/// An [`ActuatorEvent`] with the instant it was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorRecord {
    /// When the transition happened.
    pub at: Instant,
    /// What happened.
    pub event: ActuatorEvent,
}

/// Software-backed actuator for tests, demos and hardware-free runs.
///
/// # Contexts
///
/// `enable_line` only touches atomics plus a short critical section on the
/// event log. That is acceptable for a test double; a real enable GPIO is a
/// single register write.
///
/// # Example
///
/// ```rust
/// use timed_output_hal::prelude::*;
///
/// let actuator = SoftwareActuator::new(ActuatorCapabilities::both());
/// actuator.set_output(43_000, 50_000).expect("pwm accepts config");
/// assert!(actuator.is_pwm_enabled());
/// assert_eq!(actuator.pwm_duty_us(), 43_000);
/// ```
#[derive(Debug)]
pub struct SoftwareActuator {
    capabilities: ActuatorCapabilities,
    line_high: AtomicBool,
    pwm_enabled: AtomicBool,
    pwm_duty_us: AtomicU32,
    powered: AtomicBool,
    pin_function: AtomicU8,
    fail_probe: AtomicBool,
    fail_power: AtomicBool,
    fail_pwm: AtomicBool,
    events: Mutex<Vec<ActuatorRecord>>,
}

impl SoftwareActuator {
    /// Create an actuator exposing `capabilities`, with every output off.
    #[must_use]
    pub fn new(capabilities: ActuatorCapabilities) -> Self {
        Self {
            capabilities,
            line_high: AtomicBool::new(false),
            pwm_enabled: AtomicBool::new(false),
            pwm_duty_us: AtomicU32::new(0),
            powered: AtomicBool::new(false),
            pin_function: AtomicU8::new(PinFunction::Pwm as u8),
            fail_probe: AtomicBool::new(false),
            fail_power: AtomicBool::new(false),
            fail_pwm: AtomicBool::new(false),
            events: Mutex::new(Vec::with_capacity(64)),
        }
    }

    /// Make the next `probe()` calls fail.
    pub fn fail_probe(&self, fail: bool) {
        self.fail_probe.store(fail, Ordering::Release);
    }

    /// Make `power()` calls fail.
    pub fn fail_power(&self, fail: bool) {
        self.fail_power.store(fail, Ordering::Release);
    }

    /// Make `set_output()` and `disable_output()` calls fail.
    pub fn fail_pwm(&self, fail: bool) {
        self.fail_pwm.store(fail, Ordering::Release);
    }

    /// Whether the enable line is high.
    #[must_use]
    pub fn is_line_high(&self) -> bool {
        self.line_high.load(Ordering::Acquire)
    }

    /// Whether the PWM channel is enabled.
    #[must_use]
    pub fn is_pwm_enabled(&self) -> bool {
        self.pwm_enabled.load(Ordering::Acquire)
    }

    /// Last programmed PWM duty in microseconds.
    #[must_use]
    pub fn pwm_duty_us(&self) -> u32 {
        self.pwm_duty_us.load(Ordering::Acquire)
    }

    /// Current PWM pin routing.
    #[must_use]
    pub fn pin_function(&self) -> PinFunction {
        PinFunction::from_raw(self.pin_function.load(Ordering::Acquire))
            .unwrap_or(PinFunction::Pwm)
    }

    /// Whether the motor is electrically driven.
    ///
    /// The motor spins while any present output is active: the enable line is
    /// high, or the PWM channel is running with power applied.
    #[must_use]
    pub fn is_active(&self) -> bool {
        let line = self.capabilities.enable_line && self.is_line_high();
        let pwm = self.capabilities.pwm && self.is_pwm_enabled() && self.is_powered();
        line || pwm
    }

    /// Snapshot of the event log.
    #[must_use]
    pub fn records(&self) -> Vec<ActuatorRecord> {
        self.events.lock().clone()
    }

    /// Snapshot of the event log without timestamps.
    #[must_use]
    pub fn events(&self) -> Vec<ActuatorEvent> {
        self.events.lock().iter().map(|r| r.event).collect()
    }

    /// Number of logged events matching `predicate`.
    pub fn count_events(&self, predicate: impl Fn(&ActuatorEvent) -> bool) -> usize {
        self.events.lock().iter().filter(|r| predicate(&r.event)).count()
    }

    /// Clear the event log, keeping the electrical state.
    pub fn clear_events(&self) {
        self.events.lock().clear();
    }

    fn record(&self, event: ActuatorEvent) {
        trace!(?event, "actuator transition");
        self.events.lock().push(ActuatorRecord {
            at: Instant::now(),
            event,
        });
    }
}

impl Default for SoftwareActuator {
    fn default() -> Self {
        Self::new(ActuatorCapabilities::both())
    }
}

impl HardwareActuator for SoftwareActuator {
    fn capabilities(&self) -> ActuatorCapabilities {
        self.capabilities
    }

    fn probe(&self) -> ActuatorResult<()> {
        if self.fail_probe.load(Ordering::Acquire) {
            return Err(ActuatorError::resource_unavailable(
                "software actuator probe disabled",
            ));
        }
        self.line_high.store(false, Ordering::Release);
        self.record(ActuatorEvent::Probe);
        Ok(())
    }

    fn enable_line(&self, on: bool) {
        if !self.capabilities.enable_line {
            return;
        }
        self.line_high.store(on, Ordering::Release);
        self.record(ActuatorEvent::EnableLine(on));
    }

    fn set_output(&self, duty_us: u32, period_us: u32) -> ActuatorResult<()> {
        if !self.capabilities.pwm {
            return Err(ActuatorError::pwm("actuator has no PWM channel"));
        }
        if self.fail_pwm.load(Ordering::Acquire) {
            return Err(ActuatorError::pwm("injected PWM failure"));
        }
        if duty_us > period_us {
            return Err(ActuatorError::pwm(format!(
                "duty {duty_us}us exceeds period {period_us}us"
            )));
        }
        self.pwm_duty_us.store(duty_us, Ordering::Release);
        self.pwm_enabled.store(true, Ordering::Release);
        self.record(ActuatorEvent::SetOutput { duty_us, period_us });
        Ok(())
    }

    fn disable_output(&self) -> ActuatorResult<()> {
        if !self.capabilities.pwm {
            return Ok(());
        }
        if self.fail_pwm.load(Ordering::Acquire) {
            return Err(ActuatorError::pwm("injected PWM failure"));
        }
        self.pwm_enabled.store(false, Ordering::Release);
        self.record(ActuatorEvent::DisableOutput);
        Ok(())
    }

    fn power(&self, on: bool) -> ActuatorResult<()> {
        if self.fail_power.load(Ordering::Acquire) {
            return Err(ActuatorError::power("injected regulator failure"));
        }
        self.powered.store(on, Ordering::Release);
        self.record(ActuatorEvent::Power(on));
        Ok(())
    }

    fn is_powered(&self) -> bool {
        self.powered.load(Ordering::Acquire)
    }

    fn set_pin_function(&self, function: PinFunction) -> ActuatorResult<()> {
        if !self.capabilities.pwm {
            return Err(ActuatorError::gpio("actuator has no PWM pin"));
        }
        self.pin_function.store(function as u8, Ordering::Release);
        self.record(ActuatorEvent::PinFunction(function));
        Ok(())
    }

    fn release(&self) {
        self.line_high.store(false, Ordering::Release);
        self.pwm_enabled.store(false, Ordering::Release);
        self.record(ActuatorEvent::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_actuator_is_inactive() {
        let actuator = SoftwareActuator::default();
        assert!(!actuator.is_active());
        assert!(!actuator.is_powered());
        assert!(actuator.events().is_empty());
    }

    #[test]
    fn test_enable_line_only_actuator() {
        let actuator = SoftwareActuator::new(ActuatorCapabilities::enable_line_only());
        actuator.enable_line(true);
        assert!(actuator.is_active());
        actuator.enable_line(false);
        assert!(!actuator.is_active());
        assert_eq!(
            actuator.events(),
            vec![ActuatorEvent::EnableLine(true), ActuatorEvent::EnableLine(false)]
        );
    }

    #[test]
    fn test_pwm_requires_power_to_be_active() -> ActuatorResult<()> {
        let actuator = SoftwareActuator::new(ActuatorCapabilities::pwm_only());
        actuator.set_output(43_000, 50_000)?;
        assert!(!actuator.is_active());
        actuator.power(true)?;
        assert!(actuator.is_active());
        Ok(())
    }

    #[test]
    fn test_enable_line_ignored_without_capability() {
        let actuator = SoftwareActuator::new(ActuatorCapabilities::pwm_only());
        actuator.enable_line(true);
        assert!(!actuator.is_line_high());
        assert!(actuator.events().is_empty());
    }

    #[test]
    fn test_duty_above_period_rejected() {
        let actuator = SoftwareActuator::default();
        let result = actuator.set_output(60_000, 50_000);
        assert!(matches!(result, Err(ActuatorError::Pwm(_))));
        assert!(!actuator.is_pwm_enabled());
    }

    #[test]
    fn test_failure_injection() {
        let actuator = SoftwareActuator::default();
        actuator.fail_probe(true);
        assert!(actuator.probe().is_err());
        actuator.fail_probe(false);
        assert!(actuator.probe().is_ok());

        actuator.fail_power(true);
        assert!(matches!(actuator.power(true), Err(ActuatorError::Power(_))));
        assert!(!actuator.is_powered());
    }

    #[test]
    fn test_count_and_clear_events() {
        let actuator = SoftwareActuator::default();
        actuator.enable_line(true);
        actuator.enable_line(false);
        actuator.enable_line(false);
        assert_eq!(
            actuator.count_events(|e| *e == ActuatorEvent::EnableLine(false)),
            2
        );
        actuator.clear_events();
        assert!(actuator.events().is_empty());
    }
}
