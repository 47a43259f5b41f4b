//! Pulse and retrigger commands

use anyhow::Result;
use std::time::Duration;

use crate::Outputs;
use crate::commands::{Session, check_duration};
use crate::output;

/// Run a single pulse.
pub fn execute(outputs: Outputs, duration_ms: i64, duty: Option<i64>, json: bool) -> Result<()> {
    let expected = check_duration(duration_ms)?;
    let session = Session::attach(outputs)?;
    if let Some(duty) = duty {
        session.controller.set_duty_cycle(duty);
    }

    session.controller.enable(duration_ms);
    let remaining = session.controller.remaining_ms();
    session.wait_idle(expected)?;

    let report = session.finish("pulse");
    output::print_report(&report, json, Some(remaining))
}

/// Start a pulse, then replace it after `delay_ms`.
pub fn retrigger(
    outputs: Outputs,
    first_ms: i64,
    second_ms: i64,
    delay_ms: u64,
    json: bool,
) -> Result<()> {
    let first = check_duration(first_ms)?;
    let second = check_duration(second_ms)?;
    let session = Session::attach(outputs)?;

    session.controller.enable(first_ms);
    std::thread::sleep(Duration::from_millis(delay_ms));
    session.controller.enable(second_ms);
    let remaining = session.controller.remaining_ms();
    session.wait_idle(first.max(second))?;

    let report = session.finish("retrigger");
    output::print_report(&report, json, Some(remaining))
}
