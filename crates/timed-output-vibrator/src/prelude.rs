//! Prelude for timed-output-vibrator.

pub use crate::config::{VibratorConfig, VibratorConfigBuilder};
pub use crate::controller::VibratorController;
pub use crate::metrics::VibratorMetrics;
pub use crate::state::PulseState;
pub use crate::{
    DEFAULT_DUTY_US, FEEDBACK_THRESHOLD_MS, NEUTRAL_DUTY_US, OVERRUN_SLACK_MS, PLAYBACK_PERIOD_US,
};
pub use timed_output_errors::{VibratorError, VibratorResult};
