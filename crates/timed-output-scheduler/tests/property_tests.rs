//! Property-based tests for the scheduler crate.

use proptest::prelude::*;
use quickcheck_macros::quickcheck;
use std::time::Duration;
use timed_output_scheduler::prelude::*;

#[quickcheck]
fn remaining_never_exceeds_requested_delay(delay_ms: u16) -> bool {
    let Ok(timer) = PulseTimer::spawn("prop", || {}) else {
        return false;
    };
    let delay = Duration::from_millis(u64::from(delay_ms).saturating_add(1_000));
    if timer.start(delay).is_err() {
        return false;
    }
    let within = timer.remaining().is_some_and(|left| left <= delay);
    timer.cancel();
    within && timer.remaining().is_none()
}

#[quickcheck]
fn last_arm_wins(delays_ms: Vec<u16>) -> bool {
    let Ok(timer) = PulseTimer::spawn("prop-rearm", || {}) else {
        return false;
    };
    let mut last = None;
    for ms in delays_ms.iter().take(16) {
        let delay = Duration::from_millis(u64::from(*ms).saturating_add(10_000));
        if timer.start(delay).is_err() {
            return false;
        }
        last = Some(delay);
    }
    let ok = match (last, timer.remaining()) {
        (None, None) => true,
        (Some(delay), Some(left)) => left <= delay && left + Duration::from_secs(5) > delay,
        _ => false,
    };
    timer.cancel();
    ok
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_worker_accounts_for_every_schedule(requests in 1usize..64, depth in 1usize..8) {
        let worker = DeferredWorker::spawn("prop-worker", depth, || {})
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        for _ in 0..requests {
            worker.schedule();
        }
        worker.flush().map_err(|e| TestCaseError::fail(e.to_string()))?;

        let stats = worker.stats();
        prop_assert_eq!(stats.executed + stats.coalesced + stats.dropped, requests as u64);
        prop_assert!(stats.executed >= 1);
        prop_assert!(!worker.is_pending());
    }

    #[test]
    fn prop_cancel_after_schedule_never_leaves_pending(cancel in any::<bool>()) {
        let worker = DeferredWorker::spawn("prop-cancel", 4, || {})
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        worker.schedule();
        if cancel {
            worker.cancel_sync().map_err(|e| TestCaseError::fail(e.to_string()))?;
        } else {
            worker.flush().map_err(|e| TestCaseError::fail(e.to_string()))?;
        }
        prop_assert!(!worker.is_pending());
        prop_assert!(!worker.is_running());
        prop_assert!(worker.stats().executed + worker.stats().cancelled >= 1);
    }
}
