//! Controller configuration.

use crate::{
    DEFAULT_DUTY_US, FEEDBACK_THRESHOLD_MS, NEUTRAL_DUTY_US, OVERRUN_SLACK_MS, PLAYBACK_PERIOD_US,
};
use serde::{Deserialize, Serialize};
use timed_output_errors::{VibratorError, VibratorResult};
use timed_output_scheduler::DEFAULT_QUEUE_DEPTH;

/// Vibrator controller configuration.
///
/// Defaults match the factory values of the motor driver: a 50 ms PWM
/// period, 43 ms high time while vibrating and 25 ms when parked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VibratorConfig {
    /// PWM period in microseconds. Upper bound of the duty cycle.
    pub playback_period_us: u32,

    /// Duty cycle applied at attach and on resume, in microseconds.
    pub default_duty_us: u32,

    /// Duty written before the PWM channel is disabled, in microseconds.
    pub neutral_duty_us: u32,

    /// Slack added to the requested duration before the pulse timer firing
    /// late counts as an overrun.
    pub overrun_slack_ms: u32,

    /// Minimum shortfall that makes the stop job arm a feedback correction
    /// instead of stopping immediately.
    pub feedback_threshold_ms: u32,

    /// Request queue depth of each deferred worker.
    pub worker_queue_depth: usize,

    /// Name of the stop worker queue.
    pub stop_queue_name: String,

    /// Name of the feedback worker queue.
    pub feedback_queue_name: String,
}

impl VibratorConfig {
    /// Create a configuration builder.
    #[must_use]
    pub fn builder() -> VibratorConfigBuilder {
        VibratorConfigBuilder::default()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`VibratorError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> VibratorResult<()> {
        if self.playback_period_us == 0 {
            return Err(VibratorError::invalid_config(
                "playback_period_us must be greater than 0",
            ));
        }
        if self.default_duty_us > self.playback_period_us {
            return Err(VibratorError::invalid_config(
                "default_duty_us must not exceed playback_period_us",
            ));
        }
        if self.neutral_duty_us > self.playback_period_us {
            return Err(VibratorError::invalid_config(
                "neutral_duty_us must not exceed playback_period_us",
            ));
        }
        if self.feedback_threshold_ms == 0 {
            return Err(VibratorError::invalid_config(
                "feedback_threshold_ms must be at least 1",
            ));
        }
        if self.worker_queue_depth == 0 {
            return Err(VibratorError::invalid_config(
                "worker_queue_depth must be at least 1",
            ));
        }
        if self.stop_queue_name.is_empty() || self.feedback_queue_name.is_empty() {
            return Err(VibratorError::invalid_config(
                "worker queue names must not be empty",
            ));
        }
        Ok(())
    }

    /// Clamp a requested duty cycle into `[0, playback_period_us]`.
    #[must_use]
    pub fn clamp_duty(&self, value: i64) -> u32 {
        let clamped = value.clamp(0, i64::from(self.playback_period_us));
        u32::try_from(clamped).unwrap_or(self.playback_period_us)
    }
}

impl Default for VibratorConfig {
    fn default() -> Self {
        Self {
            playback_period_us: PLAYBACK_PERIOD_US,
            default_duty_us: DEFAULT_DUTY_US,
            neutral_duty_us: NEUTRAL_DUTY_US,
            overrun_slack_ms: OVERRUN_SLACK_MS,
            feedback_threshold_ms: FEEDBACK_THRESHOLD_MS,
            worker_queue_depth: DEFAULT_QUEUE_DEPTH,
            stop_queue_name: "vib".to_string(),
            feedback_queue_name: "vib_feedback".to_string(),
        }
    }
}

/// Builder for [`VibratorConfig`].
#[derive(Debug, Default)]
pub struct VibratorConfigBuilder {
    config: VibratorConfig,
}

impl VibratorConfigBuilder {
    /// Set the PWM period in microseconds.
    #[must_use]
    pub fn playback_period_us(mut self, us: u32) -> Self {
        self.config.playback_period_us = us;
        self
    }

    /// Set the default duty cycle in microseconds.
    #[must_use]
    pub fn default_duty_us(mut self, us: u32) -> Self {
        self.config.default_duty_us = us;
        self
    }

    /// Set the neutral duty cycle in microseconds.
    #[must_use]
    pub fn neutral_duty_us(mut self, us: u32) -> Self {
        self.config.neutral_duty_us = us;
        self
    }

    /// Set the overrun slack in milliseconds.
    #[must_use]
    pub fn overrun_slack_ms(mut self, ms: u32) -> Self {
        self.config.overrun_slack_ms = ms;
        self
    }

    /// Set the feedback threshold in milliseconds.
    #[must_use]
    pub fn feedback_threshold_ms(mut self, ms: u32) -> Self {
        self.config.feedback_threshold_ms = ms;
        self
    }

    /// Set the deferred worker queue depth.
    #[must_use]
    pub fn worker_queue_depth(mut self, depth: usize) -> Self {
        self.config.worker_queue_depth = depth;
        self
    }

    /// Set both worker queue names.
    #[must_use]
    pub fn queue_names(mut self, stop: impl Into<String>, feedback: impl Into<String>) -> Self {
        self.config.stop_queue_name = stop.into();
        self.config.feedback_queue_name = feedback.into();
        self
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> VibratorResult<VibratorConfig> {
        self.config.validate()?;
        Ok(self.config)
    }

    /// Build the configuration without validation.
    #[must_use]
    pub fn build_unchecked(self) -> VibratorConfig {
        self.config
    }
}
