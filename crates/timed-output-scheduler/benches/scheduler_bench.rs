//! Benchmarks for the scheduler crate.
//!
//! The hot operations are the ones timer callbacks perform: arming, reading
//! the remaining time and scheduling deferred work.

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::time::Duration;
use timed_output_scheduler::{DeferredWorker, PulseTimer};

fn bench_timer_rearm(c: &mut Criterion) {
    let Ok(timer) = PulseTimer::spawn("bench-rearm", || {}) else {
        return;
    };

    c.bench_function("timer_rearm", |b| {
        b.iter(|| {
            black_box(timer.start(black_box(Duration::from_secs(60))).is_ok());
        });
    });
    timer.cancel();
}

fn bench_timer_remaining(c: &mut Criterion) {
    let Ok(timer) = PulseTimer::spawn("bench-remaining", || {}) else {
        return;
    };
    if timer.start(Duration::from_secs(60)).is_err() {
        return;
    }

    c.bench_function("timer_remaining", |b| {
        b.iter(|| {
            black_box(timer.remaining());
        });
    });
}

fn bench_worker_schedule_coalesced(c: &mut Criterion) {
    let Ok(worker) = DeferredWorker::spawn("bench-worker", 16, || {
        std::thread::sleep(Duration::from_millis(1));
    }) else {
        return;
    };
    let handle = worker.handle();

    c.bench_function("worker_schedule_coalesced", |b| {
        b.iter(|| {
            black_box(handle.schedule());
        });
    });
}

criterion_group!(
    benches,
    bench_timer_rearm,
    bench_timer_remaining,
    bench_worker_schedule_coalesced
);
criterion_main!(benches);
