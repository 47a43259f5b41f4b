//! Integration tests for the software actuator and clocks.

#![cfg(test)]

use std::sync::Arc;
use std::thread;
use timed_output_hal::prelude::*;

type TestResult = Result<(), Box<dyn std::error::Error>>;

mod actuator_sequences {
    use super::*;

    #[test]
    fn test_full_drive_sequence_is_recorded_in_order() -> TestResult {
        let actuator = SoftwareActuator::new(ActuatorCapabilities::both());
        actuator.probe()?;
        actuator.set_output(43_000, 50_000)?;
        actuator.power(true)?;
        actuator.enable_line(true);
        assert!(actuator.is_active());

        actuator.set_output(25_000, 50_000)?;
        actuator.disable_output()?;
        actuator.enable_line(false);
        actuator.power(false)?;
        assert!(!actuator.is_active());

        assert_eq!(
            actuator.events(),
            vec![
                ActuatorEvent::Probe,
                ActuatorEvent::SetOutput {
                    duty_us: 43_000,
                    period_us: 50_000
                },
                ActuatorEvent::Power(true),
                ActuatorEvent::EnableLine(true),
                ActuatorEvent::SetOutput {
                    duty_us: 25_000,
                    period_us: 50_000
                },
                ActuatorEvent::DisableOutput,
                ActuatorEvent::EnableLine(false),
                ActuatorEvent::Power(false),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_records_are_time_ordered() -> TestResult {
        let actuator = SoftwareActuator::default();
        actuator.enable_line(true);
        thread::sleep(std::time::Duration::from_millis(2));
        actuator.enable_line(false);

        let records = actuator.records();
        assert_eq!(records.len(), 2);
        let (first, last) = (records.first(), records.last());
        assert!(matches!((first, last), (Some(a), Some(b)) if b.at >= a.at));
        Ok(())
    }

    #[test]
    fn test_pin_function_round_trip() -> TestResult {
        let actuator = SoftwareActuator::default();
        actuator.set_pin_function(PinFunction::GpioLow)?;
        assert_eq!(actuator.pin_function(), PinFunction::GpioLow);
        actuator.set_pin_function(PinFunction::Pwm)?;
        assert_eq!(actuator.pin_function(), PinFunction::Pwm);
        Ok(())
    }

    #[test]
    fn test_release_drops_outputs() -> TestResult {
        let actuator = SoftwareActuator::default();
        actuator.set_output(43_000, 50_000)?;
        actuator.enable_line(true);
        actuator.release();
        assert!(!actuator.is_line_high());
        assert!(!actuator.is_pwm_enabled());
        Ok(())
    }
}

mod concurrency {
    use super::*;

    #[test]
    fn test_enable_line_from_many_threads() {
        let actuator = Arc::new(SoftwareActuator::default());
        let mut handles = vec![];

        for i in 0..8 {
            let actuator = Arc::clone(&actuator);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    actuator.enable_line(i % 2 == 0);
                }
            }));
        }
        for handle in handles {
            assert!(handle.join().is_ok(), "Thread should not panic");
        }

        assert_eq!(actuator.events().len(), 800);
    }

    #[test]
    fn test_manual_clock_shared_across_threads() {
        let clock = Arc::new(ManualClock::new(0));
        let mut handles = vec![];

        for _ in 0..4 {
            let clock = Arc::clone(&clock);
            handles.push(thread::spawn(move || {
                for _ in 0..250 {
                    clock.advance(1);
                }
            }));
        }
        for handle in handles {
            assert!(handle.join().is_ok(), "Thread should not panic");
        }

        assert_eq!(clock.now_ms(), 1000);
    }
}
