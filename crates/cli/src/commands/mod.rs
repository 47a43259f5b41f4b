//! Command implementations for vibectl

pub mod duty;
pub mod pmqos;
pub mod pulse;
pub mod suspend;

use std::sync::Arc;
use std::time::{Duration, Instant};

use timed_output_hal::{ActuatorCapabilities, SoftwareActuator, SystemClock};
use timed_output_vibrator::{PulseState, VibratorConfig, VibratorController};
use tracing::{info, warn};

use crate::Outputs;
use crate::error::CliError;
use crate::output::{EventLine, Report};

/// Extra time allowed past a pulse's requested length before giving up.
const SETTLE_GRACE: Duration = Duration::from_secs(1);

/// A controller attached to a software actuator, with the attach instant as
/// the origin for event offsets.
pub struct Session {
    pub controller: VibratorController,
    pub actuator: Arc<SoftwareActuator>,
    origin: Instant,
}

impl Session {
    pub fn attach(outputs: Outputs) -> Result<Self, CliError> {
        let capabilities = match outputs {
            Outputs::Both => ActuatorCapabilities::both(),
            Outputs::Line => ActuatorCapabilities::enable_line_only(),
            Outputs::Pwm => ActuatorCapabilities::pwm_only(),
        };
        let actuator = Arc::new(SoftwareActuator::new(capabilities));
        let origin = Instant::now();
        let controller = VibratorController::attach(
            actuator.clone(),
            Arc::new(SystemClock::new()),
            VibratorConfig::default(),
        )?;
        info!(?outputs, "session attached");
        Ok(Self {
            controller,
            actuator,
            origin,
        })
    }

    /// Wait for the controller to return to Idle, allowing `expected_ms`
    /// plus a grace period.
    pub fn wait_idle(&self, expected_ms: u64) -> Result<Duration, CliError> {
        let deadline = Duration::from_millis(expected_ms) + SETTLE_GRACE;
        let start = Instant::now();
        while self.controller.state() != PulseState::Idle {
            if start.elapsed() > deadline {
                return Err(CliError::Timeout(format!(
                    "pulse still running after {} ms",
                    deadline.as_millis()
                )));
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        Ok(start.elapsed())
    }

    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Build a report from the controller and actuator, then detach.
    pub fn finish(self, command: &str) -> Report {
        if let Err(e) = self.controller.flush() {
            warn!(error = %e, "controller did not drain before report");
        }
        let events = self
            .actuator
            .records()
            .into_iter()
            .map(|record| EventLine {
                at_us: u64::try_from(record.at.saturating_duration_since(self.origin).as_micros())
                    .unwrap_or(u64::MAX),
                event: format!("{:?}", record.event),
            })
            .collect();
        let report = Report {
            command: command.to_string(),
            state: self.controller.state(),
            duty_us: self.controller.duty_cycle(),
            elapsed_ms: self.elapsed_ms(),
            metrics: self.controller.metrics(),
            events,
        };
        self.controller.detach();
        report
    }
}

/// Reject pulse lengths that would never end within a CLI run.
pub fn check_duration(duration_ms: i64) -> Result<u64, CliError> {
    const MAX_PULSE_MS: i64 = 60_000;
    if duration_ms > MAX_PULSE_MS {
        return Err(CliError::InvalidArgument(format!(
            "pulse of {duration_ms} ms exceeds the {MAX_PULSE_MS} ms limit"
        )));
    }
    Ok(u64::try_from(duration_ms).unwrap_or(0))
}
