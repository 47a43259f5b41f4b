//! Prelude for timed-output-hal.

pub use crate::actuator::{ActuatorCapabilities, HardwareActuator, PinFunction};
pub use crate::clock::{ManualClock, MonotonicClock, SystemClock};
pub use crate::software_impl::{ActuatorEvent, ActuatorRecord, SoftwareActuator};
pub use timed_output_errors::{ActuatorError, ActuatorResult};
