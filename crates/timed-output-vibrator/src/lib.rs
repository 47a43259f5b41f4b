//! # timed-output-vibrator
//!
//! Timed vibration-motor controller. A single `enable(ms)` command becomes a
//! bounded pulse on a motor driven by an enable line, a PWM channel, or both.
//!
//! ## Pulse lifecycle
//!
//! 1. `enable(v)` arms the pulse timer for `v` ms and activates the motor:
//!    PWM programmed at the configured duty, power on, enable line high.
//! 2. The pulse timer fires in timer context, drops the enable line and
//!    schedules the stop job.
//! 3. The stop job measures how long the motor actually ran. If the pulse is
//!    at least [`FEEDBACK_THRESHOLD_MS`] short it arms the feedback timer for
//!    the remainder; otherwise it parks the PWM at the neutral duty, disables
//!    it and releases power.
//! 4. The feedback timer and feedback job finish a corrected pulse.
//!
//! Retriggering while a pulse is in flight replaces it. Suspend stops the
//! motor and drains both timer/worker pairs.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use timed_output_hal::{ActuatorCapabilities, SoftwareActuator, SystemClock};
//! use timed_output_vibrator::prelude::*;
//!
//! let actuator = Arc::new(SoftwareActuator::new(ActuatorCapabilities::both()));
//! let controller = VibratorController::attach(
//!     actuator,
//!     Arc::new(SystemClock::new()),
//!     VibratorConfig::default(),
//! )?;
//!
//! controller.set_duty_cycle(60_000); // clamped to the 50 ms period
//! assert_eq!(controller.duty_cycle(), PLAYBACK_PERIOD_US);
//!
//! controller.enable(100);
//! std::thread::sleep(std::time::Duration::from_millis(150));
//! assert_eq!(controller.state(), PulseState::Idle);
//! # Ok::<(), timed_output_errors::VibratorError>(())
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod config;
pub mod controller;
pub mod metrics;
pub mod prelude;
pub mod state;

pub use config::{VibratorConfig, VibratorConfigBuilder};
pub use controller::VibratorController;
pub use metrics::VibratorMetrics;
pub use state::{AtomicPulseState, PulseState};
pub use timed_output_errors::{VibratorError, VibratorResult};

/// PWM period in microseconds.
pub const PLAYBACK_PERIOD_US: u32 = 50_000;

/// Factory duty cycle in microseconds.
pub const DEFAULT_DUTY_US: u32 = 43_000;

/// Duty written before the PWM channel is disabled, in microseconds.
pub const NEUTRAL_DUTY_US: u32 = 25_000;

/// Slack past the requested duration before a late pulse timer counts as an overrun.
pub const OVERRUN_SLACK_MS: u32 = 4;

/// Minimum shortfall, in milliseconds, that triggers a feedback correction.
pub const FEEDBACK_THRESHOLD_MS: u32 = 3;
