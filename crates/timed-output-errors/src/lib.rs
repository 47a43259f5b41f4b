//! Error types for the timed-output actuator stack.
//!
//! The stack has two kinds of failure paths:
//!
//! - **Attach time**: acquiring the actuator, validating configuration and
//!   spawning the timer/worker threads. These are fatal and surface as
//!   [`VibratorError`].
//! - **Hot path**: hardware I/O inside a pulse. These never reach the caller
//!   of `enable()`; they are logged and counted by the controller. They are
//!   modelled by [`ActuatorError`] so the actuator trait can report them.
//!
//! [`SchedulerError`] covers the timer and deferred-work plumbing.
//!
//! # Example
//!
//! ```
//! use timed_output_errors::prelude::*;
//!
//! let err = VibratorError::invalid_config("playback_period_us must be greater than 0");
//! assert_eq!(err.severity(), ErrorSeverity::Error);
//! assert!(!err.is_recoverable());
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod actuator;
pub mod common;
pub mod prelude;
pub mod scheduler;
pub mod vibrator;

pub use actuator::ActuatorError;
pub use common::ErrorSeverity;
pub use scheduler::SchedulerError;
pub use vibrator::VibratorError;

/// Result type for actuator hardware operations.
pub type ActuatorResult<T = ()> = std::result::Result<T, ActuatorError>;

/// Result type for timer and worker operations.
pub type SchedulerResult<T = ()> = std::result::Result<T, SchedulerError>;

/// Result type for controller attach and lifecycle operations.
pub type VibratorResult<T> = std::result::Result<T, VibratorError>;
