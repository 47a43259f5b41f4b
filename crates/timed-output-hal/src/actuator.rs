//! Hardware actuator trait definition.

use timed_output_errors::ActuatorResult;

/// Outputs an actuator exposes.
///
/// A motor may be switched by a plain enable GPIO, modulated by a PWM
/// channel, or both. At least one must be present for a controller to attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActuatorCapabilities {
    /// A GPIO that gates the motor driver.
    pub enable_line: bool,
    /// A PWM channel that sets the drive amplitude.
    pub pwm: bool,
}

impl ActuatorCapabilities {
    /// Enable line only.
    #[must_use]
    pub const fn enable_line_only() -> Self {
        Self {
            enable_line: true,
            pwm: false,
        }
    }

    /// PWM channel only.
    #[must_use]
    pub const fn pwm_only() -> Self {
        Self {
            enable_line: false,
            pwm: true,
        }
    }

    /// Enable line and PWM channel.
    #[must_use]
    pub const fn both() -> Self {
        Self {
            enable_line: true,
            pwm: true,
        }
    }

    /// Whether any output is present.
    #[must_use]
    pub const fn has_output(self) -> bool {
        self.enable_line || self.pwm
    }
}

/// Function routed to the PWM-capable pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum PinFunction {
    /// Pin is muxed to the PWM controller.
    #[default]
    Pwm = 0,
    /// Pin is a plain GPIO driven low.
    GpioLow = 1,
}

impl PinFunction {
    /// Convert from raw u8 value.
    #[must_use]
    pub fn from_raw(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Pwm),
            1 => Some(Self::GpioLow),
            _ => None,
        }
    }
}

/// A vibration motor as seen by the controller.
///
/// # Contexts
///
/// `enable_line` MUST be callable from timer context: no blocking, no
/// allocation, no locks shared with the other methods. It is infallible
/// because nothing in timer context could act on a failure.
///
/// All other methods run in normal context and may block.
///
/// # Idempotence
///
/// Every "off" transition (`enable_line(false)`, `disable_output`,
/// `power(false)`) must be safe to repeat.
pub trait HardwareActuator: Send + Sync {
    /// Which outputs this actuator drives.
    fn capabilities(&self) -> ActuatorCapabilities;

    /// Acquire the underlying resources and drive every output to its
    /// inactive level. Called once at attach.
    ///
    /// # Errors
    ///
    /// Returns an error if a GPIO, PWM channel or power handle is unavailable.
    fn probe(&self) -> ActuatorResult<()> {
        Ok(())
    }

    /// Drive the enable line. Timer-context safe.
    fn enable_line(&self, on: bool);

    /// Program `duty_us` out of `period_us` and enable the PWM channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the PWM controller rejects the configuration.
    fn set_output(&self, duty_us: u32, period_us: u32) -> ActuatorResult<()>;

    /// Disable the PWM channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the PWM controller fails to stop.
    fn disable_output(&self) -> ActuatorResult<()>;

    /// Switch the motor power domain.
    ///
    /// # Errors
    ///
    /// Returns an error if the regulator refuses the transition.
    fn power(&self, on: bool) -> ActuatorResult<()>;

    /// Whether the power domain is currently enabled.
    fn is_powered(&self) -> bool;

    /// Route the PWM-capable pin.
    ///
    /// # Errors
    ///
    /// Returns an error if the pin mux cannot be changed.
    fn set_pin_function(&self, function: PinFunction) -> ActuatorResult<()> {
        let _ = function;
        Ok(())
    }

    /// Release the resources acquired by [`probe`](Self::probe). Called once at
    /// detach, after every timer and worker has been drained.
    fn release(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trait_is_object_safe_and_shareable() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn HardwareActuator>();
    }

    #[test]
    fn test_capabilities() {
        assert!(ActuatorCapabilities::both().has_output());
        assert!(ActuatorCapabilities::pwm_only().has_output());
        assert!(!ActuatorCapabilities::default().has_output());
    }

    #[test]
    fn test_pin_function_raw_roundtrip() {
        assert_eq!(PinFunction::from_raw(0), Some(PinFunction::Pwm));
        assert_eq!(PinFunction::from_raw(1), Some(PinFunction::GpioLow));
        assert_eq!(PinFunction::from_raw(7), None);
    }
}
