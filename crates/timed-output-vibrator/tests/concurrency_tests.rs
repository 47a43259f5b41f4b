//! Concurrent command tests.
//!
//! `enable` is callable from any thread. Whatever the interleaving, a final
//! `enable(0)` must leave the motor off and nothing may restart it.

use std::sync::Arc;
use std::thread;
use std::time::Duration;
use timed_output_hal::prelude::*;
use timed_output_test_helpers::prelude::*;
use timed_output_vibrator::prelude::*;

/// Enable-line actuator whose "line off" writes from timer threads land late,
/// like an IRQ that is slow to reach the GPIO.
struct LateLineActuator {
    inner: SoftwareActuator,
    delay: Duration,
}

impl LateLineActuator {
    fn new(delay: Duration) -> Self {
        Self {
            inner: SoftwareActuator::new(ActuatorCapabilities::enable_line_only()),
            delay,
        }
    }

    fn from_timer_thread() -> bool {
        thread::current()
            .name()
            .is_some_and(|name| name.starts_with("timer-"))
    }
}

impl HardwareActuator for LateLineActuator {
    fn capabilities(&self) -> ActuatorCapabilities {
        self.inner.capabilities()
    }

    fn enable_line(&self, on: bool) {
        if !on && Self::from_timer_thread() {
            thread::sleep(self.delay);
        }
        self.inner.enable_line(on);
    }

    fn set_output(&self, duty_us: u32, period_us: u32) -> ActuatorResult<()> {
        self.inner.set_output(duty_us, period_us)
    }

    fn disable_output(&self) -> ActuatorResult<()> {
        self.inner.disable_output()
    }

    fn power(&self, on: bool) -> ActuatorResult<()> {
        self.inner.power(on)
    }

    fn is_powered(&self) -> bool {
        self.inner.is_powered()
    }
}

fn attach() -> Result<(Arc<VibratorController>, Arc<SoftwareActuator>), VibratorError> {
    let actuator = Arc::new(SoftwareActuator::new(ActuatorCapabilities::both()));
    let controller = VibratorController::attach(
        actuator.clone(),
        Arc::new(SystemClock::new()),
        VibratorConfig::default(),
    )?;
    Ok((Arc::new(controller), actuator))
}

#[test]
fn test_controller_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<VibratorController>();
}

#[test]
fn test_concurrent_enables_end_off_after_stop() -> TestResult {
    let (controller, actuator) = attach()?;

    let workers: Vec<_> = (0..4i64)
        .map(|id| {
            let controller = Arc::clone(&controller);
            thread::spawn(move || {
                for round in 0..50i64 {
                    match (id + round) % 5 {
                        0 => controller.enable(0),
                        1 => controller.enable(-1),
                        2 => {
                            controller.set_duty_cycle(round * 1_000);
                        }
                        _ => controller.enable(1 + (round % 7)),
                    }
                    thread::sleep(Duration::from_micros(300));
                }
            })
        })
        .collect();
    for worker in workers {
        if worker.join().is_err() {
            return Err("command thread panicked".into());
        }
    }

    controller.enable(0);
    controller.flush()?;
    assert_eq!(controller.state(), PulseState::Idle);
    assert!(!actuator.is_active());

    // in-flight stop and feedback work from earlier pulses must not revive it
    thread::sleep(Duration::from_millis(50));
    controller.flush()?;
    assert_eq!(controller.state(), PulseState::Idle);
    assert!(!actuator.is_active());
    assert!(!actuator.is_powered());
    Ok(())
}

#[test]
fn test_short_pulses_from_many_threads_all_finish() -> TestResult {
    let (controller, actuator) = attach()?;

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let controller = Arc::clone(&controller);
            thread::spawn(move || {
                for _ in 0..10 {
                    controller.enable(5);
                    thread::sleep(Duration::from_millis(2));
                }
            })
        })
        .collect();
    for worker in workers {
        if worker.join().is_err() {
            return Err("command thread panicked".into());
        }
    }

    assert!(wait_until(Duration::from_secs(2), || {
        controller.state() == PulseState::Idle
    }));
    assert!(!actuator.is_active());
    assert!(!actuator.is_powered());

    let metrics = controller.metrics();
    assert_eq!(metrics.pulses_started, 40);
    assert!(metrics.pulses_completed >= 1);
    Ok(())
}

#[test]
fn test_remaining_ms_is_readable_while_pulsing() -> TestResult {
    let (controller, _actuator) = attach()?;
    controller.enable(300);

    let reader = {
        let controller = Arc::clone(&controller);
        thread::spawn(move || {
            let mut last = u64::MAX;
            let mut monotonic = true;
            for _ in 0..100 {
                let remaining = controller.remaining_ms();
                if remaining > last {
                    monotonic = false;
                }
                last = remaining;
                thread::sleep(Duration::from_micros(500));
            }
            monotonic
        })
    };

    match reader.join() {
        Ok(monotonic) => assert!(monotonic),
        Err(_) => return Err("reader thread panicked".into()),
    }
    Ok(())
}

#[test]
fn test_late_line_drop_from_previous_pulse_does_not_kill_retrigger() -> TestResult {
    let actuator = Arc::new(LateLineActuator::new(Duration::from_millis(30)));
    let controller = VibratorController::attach(
        actuator.clone(),
        Arc::new(SystemClock::new()),
        VibratorConfig::default(),
    )?;

    // the 5 ms pulse fires while its line drop is still in flight
    controller.enable(5);
    thread::sleep(Duration::from_millis(15));
    controller.enable(300);
    thread::sleep(Duration::from_millis(60));

    assert_eq!(controller.state(), PulseState::Pulsing);
    assert!(actuator.inner.is_line_high());
    assert!(actuator.inner.is_active());
    assert!(controller.remaining_ms() > 0);

    controller.enable(0);
    controller.flush()?;
    assert_eq!(controller.state(), PulseState::Idle);
    assert!(!actuator.inner.is_active());
    Ok(())
}

#[test]
fn test_retrigger_after_late_line_drop_still_ends_on_time() -> TestResult {
    let actuator = Arc::new(LateLineActuator::new(Duration::from_millis(20)));
    let controller = VibratorController::attach(
        actuator.clone(),
        Arc::new(SystemClock::new()),
        VibratorConfig::default(),
    )?;

    controller.enable(5);
    thread::sleep(Duration::from_millis(10));
    controller.enable(60);

    let ended = wait_until(Duration::from_secs(2), || {
        controller.state() == PulseState::Idle
    });
    assert!(ended);
    controller.flush()?;
    assert!(!actuator.inner.is_active());
    assert!(!actuator.is_powered());
    Ok(())
}
