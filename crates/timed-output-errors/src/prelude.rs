//! Convenient re-exports.
//!
//! ```
//! use timed_output_errors::prelude::*;
//!
//! fn probe() -> VibratorResult<()> {
//!     Err(ActuatorError::resource_unavailable("pwm bank 0").into())
//! }
//!
//! assert!(probe().is_err());
//! ```

pub use crate::actuator::ActuatorError;
pub use crate::common::ErrorSeverity;
pub use crate::scheduler::SchedulerError;
pub use crate::vibrator::VibratorError;
pub use crate::{ActuatorResult, SchedulerResult, VibratorResult};
