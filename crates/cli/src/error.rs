//! Error types for vibectl

use thiserror::Error;
use timed_output_errors::VibratorError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Controller error: {0}")]
    Controller(#[from] VibratorError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgument(_) => 2,
            CliError::Timeout(_) => 3,
            CliError::Controller(_) => 4,
            CliError::JsonError(_) => 5,
        }
    }
}
