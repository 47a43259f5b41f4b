//! Controller counters.

use portable_atomic::{AtomicU64, Ordering};
use serde::{Deserialize, Serialize};

/// Point-in-time copy of the controller counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VibratorMetrics {
    /// Activations, including retriggers of a running pulse.
    pub pulses_started: u64,
    /// Pulses ended by the stop or feedback job.
    pub pulses_completed: u64,
    /// Pulses ended by `enable(0)`.
    pub explicit_stops: u64,
    /// Pulse timer firings later than the requested duration plus slack.
    pub overruns: u64,
    /// Largest overrun seen, in milliseconds past the requested duration.
    pub worst_overrun_ms: u64,
    /// Stop jobs that armed the feedback timer instead of stopping.
    pub feedback_corrections: u64,
    /// Feedback firings or jobs skipped because a newer pulse superseded them.
    pub stale_feedback_skipped: u64,
    /// Actuator calls that failed inside a pulse.
    pub io_failures: u64,
    /// Stop or feedback requests a timer could not queue.
    pub dropped_requests: u64,
}

/// Atomic counters behind [`VibratorMetrics`].
///
/// `record_overrun` and `record_dropped_request` are called from timer
/// context; they only touch atomics.
#[derive(Debug, Default)]
pub(crate) struct MetricsCounters {
    pulses_started: AtomicU64,
    pulses_completed: AtomicU64,
    explicit_stops: AtomicU64,
    overruns: AtomicU64,
    worst_overrun_ms: AtomicU64,
    feedback_corrections: AtomicU64,
    stale_feedback_skipped: AtomicU64,
    io_failures: AtomicU64,
    dropped_requests: AtomicU64,
}

impl MetricsCounters {
    pub(crate) fn record_pulse_started(&self) {
        self.pulses_started.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_pulse_completed(&self) {
        self.pulses_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_explicit_stop(&self) {
        self.explicit_stops.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_overrun(&self, overrun_ms: u64) {
        self.overruns.fetch_add(1, Ordering::Relaxed);
        self.worst_overrun_ms.fetch_max(overrun_ms, Ordering::Relaxed);
    }

    pub(crate) fn record_feedback_correction(&self) {
        self.feedback_corrections.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_stale_feedback(&self) {
        self.stale_feedback_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_io_failure(&self) {
        self.io_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped_request(&self) {
        self.dropped_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> VibratorMetrics {
        VibratorMetrics {
            pulses_started: self.pulses_started.load(Ordering::Relaxed),
            pulses_completed: self.pulses_completed.load(Ordering::Relaxed),
            explicit_stops: self.explicit_stops.load(Ordering::Relaxed),
            overruns: self.overruns.load(Ordering::Relaxed),
            worst_overrun_ms: self.worst_overrun_ms.load(Ordering::Relaxed),
            feedback_corrections: self.feedback_corrections.load(Ordering::Relaxed),
            stale_feedback_skipped: self.stale_feedback_skipped.load(Ordering::Relaxed),
            io_failures: self.io_failures.load(Ordering::Relaxed),
            dropped_requests: self.dropped_requests.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn reset(&self) {
        for counter in [
            &self.pulses_started,
            &self.pulses_completed,
            &self.explicit_stops,
            &self.overruns,
            &self.worst_overrun_ms,
            &self.feedback_corrections,
            &self.stale_feedback_skipped,
            &self.io_failures,
            &self.dropped_requests,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}
