//! Actuator hardware errors.

use crate::common::ErrorSeverity;

/// Failures reported by a `HardwareActuator` implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActuatorError {
    /// A resource (GPIO, PWM channel, regulator) could not be acquired
    #[error("Actuator resource unavailable: {0}")]
    ResourceUnavailable(String),

    /// PWM channel configuration or enable failed
    #[error("PWM error: {0}")]
    Pwm(String),

    /// Power-domain (regulator) switch failed
    #[error("Power domain error: {0}")]
    Power(String),

    /// GPIO direction or pin-function change failed
    #[error("GPIO error: {0}")]
    Gpio(String),
}

impl ActuatorError {
    /// Create a resource-unavailable error.
    #[must_use]
    pub fn resource_unavailable(msg: impl Into<String>) -> Self {
        Self::ResourceUnavailable(msg.into())
    }

    /// Create a PWM error.
    #[must_use]
    pub fn pwm(msg: impl Into<String>) -> Self {
        Self::Pwm(msg.into())
    }

    /// Create a power-domain error.
    #[must_use]
    pub fn power(msg: impl Into<String>) -> Self {
        Self::Power(msg.into())
    }

    /// Create a GPIO error.
    #[must_use]
    pub fn gpio(msg: impl Into<String>) -> Self {
        Self::Gpio(msg.into())
    }

    /// Get the error severity.
    ///
    /// Resource acquisition failures abort attach. I/O failures inside a pulse
    /// are warnings: the next deactivation retries the same transition.
    #[must_use]
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ResourceUnavailable(_) => ErrorSeverity::Error,
            Self::Pwm(_) | Self::Power(_) | Self::Gpio(_) => ErrorSeverity::Warning,
        }
    }
}
