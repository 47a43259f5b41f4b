//! # timed-output-hal
//!
//! Capability traits the vibrator controller drives, plus software
//! implementations for tests and hardware-free environments.
//!
//! - [`HardwareActuator`]: enable line, PWM output and power domain of a
//!   vibration motor
//! - [`MonotonicClock`]: millisecond timestamps for pulse bookkeeping
//! - [`SoftwareActuator`]: recording actuator with failure injection
//! - [`SystemClock`] / [`ManualClock`]: real and fake clocks
//!
//! ## Execution contexts
//!
//! [`HardwareActuator::enable_line`] is called from timer context and must
//! not block. Every other actuator method is only called from normal
//! context and may block on register or bus access.
//!
//! ## Example
//!
//! ```rust
//! use timed_output_hal::prelude::*;
//!
//! let actuator = SoftwareActuator::new(ActuatorCapabilities::both());
//! actuator.enable_line(true);
//! assert!(actuator.is_line_high());
//!
//! let clock = ManualClock::new(0);
//! clock.advance(25);
//! assert_eq!(clock.now_ms(), 25);
//! ```

#![deny(
    unsafe_op_in_unsafe_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    missing_debug_implementations
)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod actuator;
pub mod clock;
pub mod prelude;
pub mod software_impl;

pub use actuator::{ActuatorCapabilities, HardwareActuator, PinFunction};
pub use clock::{ManualClock, MonotonicClock, SystemClock};
pub use software_impl::{ActuatorEvent, ActuatorRecord, SoftwareActuator};
