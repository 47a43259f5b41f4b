//! Timer and deferred-work errors.

use crate::common::ErrorSeverity;

/// Failures of the pulse timer or a deferred worker.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    /// The backing thread could not be spawned
    #[error("Failed to spawn {name} thread: {reason}")]
    SpawnFailed {
        /// Thread name
        name: String,
        /// OS error text
        reason: String,
    },

    /// The timer or worker has been shut down
    #[error("{0} has been shut down")]
    ShutDown(String),

    /// The worker queue has no room for another request
    #[error("{0} queue is full")]
    QueueFull(String),
}

impl SchedulerError {
    /// Create a spawn failure error.
    #[must_use]
    pub fn spawn_failed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SpawnFailed {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Get the error severity.
    #[must_use]
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::SpawnFailed { .. } => ErrorSeverity::Critical,
            Self::ShutDown(_) => ErrorSeverity::Error,
            Self::QueueFull(_) => ErrorSeverity::Warning,
        }
    }
}
