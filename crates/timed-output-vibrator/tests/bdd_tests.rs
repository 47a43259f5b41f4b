//! BDD tests for vibrator pulse scenarios.
//!
//! Feature: timed vibration pulses

#![cfg(test)]

use std::sync::Arc;
use std::time::{Duration, Instant};
use timed_output_hal::prelude::*;
use timed_output_test_helpers::prelude::*;
use timed_output_vibrator::prelude::*;

const SETTLE: Duration = Duration::from_secs(2);

fn given_attached_vibrator(
    clock: Arc<dyn MonotonicClock>,
) -> Result<(VibratorController, Arc<SoftwareActuator>), VibratorError> {
    init_test_tracing();
    let actuator = Arc::new(SoftwareActuator::new(ActuatorCapabilities::both()));
    let controller =
        VibratorController::attach(actuator.clone(), clock, VibratorConfig::default())?;
    Ok((controller, actuator))
}

mod pulse_scenarios {
    use super::*;

    /// Scenario: A positive enable drives the motor and arms the timer
    #[test]
    fn scenario_enable_drives_motor_with_time_remaining() -> TestResult {
        let (controller, actuator) = given_attached_vibrator(Arc::new(SystemClock::new()))?;

        controller.enable(500);

        assert!(actuator.is_active());
        assert_eq!(controller.state(), PulseState::Pulsing);
        let remaining = controller.remaining_ms();
        assert!(remaining > 0 && remaining <= 500, "remaining = {remaining}");
        Ok(())
    }

    /// Scenario: A 100 ms pulse ends Idle after 100 ms plus slack
    #[test]
    fn scenario_100ms_pulse_ends_idle() -> TestResult {
        let (controller, actuator) = given_attached_vibrator(Arc::new(SystemClock::new()))?;

        let start = Instant::now();
        controller.enable(100);
        assert!(wait_until(SETTLE, || controller.state() == PulseState::Idle));
        let ran_for = start.elapsed();

        assert!(ran_for >= Duration::from_millis(100), "stopped early: {ran_for:?}");
        assert!(!actuator.is_active());
        assert!(!actuator.is_powered());
        assert_eq!(controller.metrics().pulses_completed, 1);
        Ok(())
    }

    /// Scenario: Retriggering 50 ms with 10 ms at t=5 ms ends near t=15 ms
    #[test]
    fn scenario_retrigger_replaces_running_pulse() -> TestResult {
        let (controller, actuator) = given_attached_vibrator(Arc::new(SystemClock::new()))?;

        let start = Instant::now();
        controller.enable(50);
        std::thread::sleep(Duration::from_millis(5));
        let retriggered_at = Instant::now();
        controller.enable(10);

        assert!(wait_until(SETTLE, || controller.state() == PulseState::Idle));
        let total = start.elapsed();
        assert!(retriggered_at.elapsed() >= Duration::from_millis(10));
        assert!(
            total < Duration::from_millis(50),
            "first deadline was not replaced: {total:?}"
        );
        assert!(!actuator.is_active());

        let metrics = controller.metrics();
        assert_eq!(metrics.pulses_started, 2);
        assert_eq!(metrics.pulses_completed, 1);
        Ok(())
    }

    /// Scenario: enable(0) stops a running pulse within one work cycle
    #[test]
    fn scenario_enable_zero_stops_pulse() -> TestResult {
        let (controller, actuator) = given_attached_vibrator(Arc::new(SystemClock::new()))?;

        controller.enable(10_000);
        controller.enable(0);
        controller.flush()?;

        assert_eq!(controller.state(), PulseState::Idle);
        assert!(!actuator.is_active());
        assert_eq!(controller.remaining_ms(), 0);
        Ok(())
    }

    /// Scenario: Repeated enable(0) while Idle has no side effects
    #[test]
    fn scenario_enable_zero_while_idle_is_silent() -> TestResult {
        let (controller, actuator) = given_attached_vibrator(Arc::new(SystemClock::new()))?;
        actuator.clear_events();

        controller.enable(0);
        controller.enable(0);
        controller.enable(0);

        assert!(actuator.events().is_empty());
        assert_eq!(controller.metrics(), VibratorMetrics::default());
        Ok(())
    }

    /// Scenario: A negative duration is ignored
    #[test]
    fn scenario_negative_duration_is_ignored() -> TestResult {
        let (controller, actuator) = given_attached_vibrator(Arc::new(SystemClock::new()))?;
        controller.enable(10_000);
        actuator.clear_events();

        controller.enable(-100);

        assert!(actuator.events().is_empty());
        assert_eq!(controller.state(), PulseState::Pulsing);
        assert_eq!(controller.requested_ms(), 10_000);
        Ok(())
    }
}

mod correction_scenarios {
    use super::*;

    /// Scenario: A stop job that finds the pulse short arms a feedback stop
    #[test]
    fn scenario_short_pulse_gets_feedback_stop() -> TestResult {
        let clock = Arc::new(ManualClock::new(0));
        let (controller, actuator) = given_attached_vibrator(clock.clone())?;

        // Given a pulse whose stop job sees only 10 of 60 ms elapsed
        controller.enable(60);
        clock.advance(10);

        // When the stop job runs
        assert!(wait_until(SETTLE, || {
            controller.metrics().feedback_corrections == 1
        }));
        let corrected_at = Instant::now();

        // Then the motor keeps its PWM drive until the feedback stop
        assert_eq!(controller.state(), PulseState::Pulsing);
        assert!(!actuator.is_line_high());

        // And the feedback stop lands within the 50 ms shortfall
        assert!(wait_until(SETTLE, || controller.state() == PulseState::Idle));
        assert!(corrected_at.elapsed() < Duration::from_millis(50) + Duration::from_millis(150));
        assert!(!actuator.is_active());
        Ok(())
    }

    /// Scenario: An overrun is counted and the pulse still ends
    #[test]
    fn scenario_overrun_is_diagnostic_only() -> TestResult {
        let clock = Arc::new(ManualClock::new(0));
        let (controller, actuator) = given_attached_vibrator(clock.clone())?;

        controller.enable(20);
        clock.advance(100);

        assert!(wait_until(SETTLE, || controller.state() == PulseState::Idle));
        let metrics = controller.metrics();
        assert_eq!(metrics.overruns, 1);
        assert_eq!(metrics.worst_overrun_ms, 80);
        assert!(!actuator.is_active());
        Ok(())
    }
}

mod configuration_scenarios {
    use super::*;

    /// Scenario: Duty cycle writes are clamped to the playback period
    #[test]
    fn scenario_duty_cycle_is_clamped() -> TestResult {
        let (controller, _actuator) = given_attached_vibrator(Arc::new(SystemClock::new()))?;

        assert_eq!(controller.set_duty_cycle(60_000), PLAYBACK_PERIOD_US);
        assert_eq!(controller.duty_cycle(), PLAYBACK_PERIOD_US);
        assert_eq!(controller.set_duty_cycle(-1), 0);
        assert_eq!(controller.duty_cycle(), 0);
        assert_eq!(controller.set_duty_cycle(43_000), 43_000);
        Ok(())
    }
}

mod power_scenarios {
    use super::*;

    /// Scenario: Suspend while pulsing leaves the motor off and timers cancelled
    #[test]
    fn scenario_suspend_while_pulsing() -> TestResult {
        let (controller, actuator) = given_attached_vibrator(Arc::new(SystemClock::new()))?;
        controller.enable(200);

        controller.suspend();

        assert_eq!(controller.state(), PulseState::Idle);
        assert!(!actuator.is_active());
        assert_eq!(controller.remaining_ms(), 0);
        assert_eq!(actuator.pin_function(), PinFunction::GpioLow);

        // And nothing fires after the old deadline
        actuator.clear_events();
        std::thread::sleep(Duration::from_millis(250));
        assert!(actuator.events().is_empty());
        Ok(())
    }

    /// Scenario: Resume restores the pin and never starts a pulse
    #[test]
    fn scenario_resume_never_starts_pulse() -> TestResult {
        let (controller, actuator) = given_attached_vibrator(Arc::new(SystemClock::new()))?;
        controller.set_duty_cycle(5_000);
        controller.suspend();

        controller.resume();

        assert_eq!(controller.state(), PulseState::Idle);
        assert!(!actuator.is_active());
        assert_eq!(actuator.pin_function(), PinFunction::Pwm);
        assert_eq!(controller.duty_cycle(), DEFAULT_DUTY_US);
        Ok(())
    }
}
