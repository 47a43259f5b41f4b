//! Convenience re-exports for common test utilities.
//!
//! ```rust,ignore
//! use timed_output_test_helpers::prelude::*;
//! ```

pub use crate::must::{must, must_some, must_with};
pub use crate::wait::{time_until, wait_for, wait_until};

#[cfg(feature = "tracing")]
pub use crate::init_test_tracing;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;
