//! Controller attach and lifecycle errors.

use crate::actuator::ActuatorError;
use crate::common::ErrorSeverity;
use crate::scheduler::SchedulerError;

/// Errors raised while attaching or tearing down a vibrator controller.
///
/// None of these come out of `enable()`, `remaining_ms()` or the timer and
/// worker paths; those recover locally.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VibratorError {
    /// Configuration failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The actuator exposes neither an enable line nor a PWM channel
    #[error("Actuator has no enable line and no PWM channel")]
    NoOutput,

    /// The actuator failed to acquire its resources
    #[error("Actuator error: {0}")]
    Actuator(#[from] ActuatorError),

    /// A timer or worker thread could not be created
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),
}

impl VibratorError {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Get the error severity.
    #[must_use]
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InvalidConfig(_) | Self::NoOutput => ErrorSeverity::Error,
            Self::Actuator(e) => e.severity().max(ErrorSeverity::Error),
            Self::Scheduler(e) => e.severity().max(ErrorSeverity::Error),
        }
    }

    /// Whether the error can be recovered from without re-attaching.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        self.severity().is_recoverable()
    }
}
