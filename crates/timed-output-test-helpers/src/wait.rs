//! Polling helpers.
//!
//! Controller state changes happen on timer and worker threads. Tests poll
//! for the expected condition with a deadline instead of sleeping for a
//! fixed time.

use std::time::{Duration, Instant};

/// Interval between polls.
pub const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Poll `condition` until it returns `true` or `timeout` elapses.
///
/// Returns the last value of `condition`.
///
/// ```rust
/// use std::time::Duration;
/// use timed_output_test_helpers::wait_until;
///
/// let mut polls = 0;
/// assert!(wait_until(Duration::from_secs(1), || {
///     polls += 1;
///     polls == 3
/// }));
/// ```
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return condition();
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Poll `probe` until it yields `Some` or `timeout` elapses.
pub fn wait_for<T>(timeout: Duration, mut probe: impl FnMut() -> Option<T>) -> Option<T> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(value) = probe() {
            return Some(value);
        }
        if Instant::now() >= deadline {
            return probe();
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Time how long `condition` takes to become `true`, polling until `timeout`.
///
/// Returns `None` if it never did.
pub fn time_until(timeout: Duration, condition: impl FnMut() -> bool) -> Option<Duration> {
    let start = Instant::now();
    if wait_until(timeout, condition) {
        Some(start.elapsed())
    } else {
        None
    }
}
