//! Suspend/resume command

use anyhow::Result;
use std::time::Duration;

use crate::Outputs;
use crate::commands::{Session, check_duration};
use crate::output;

/// Start a pulse, suspend part way through, then resume.
pub fn execute(outputs: Outputs, pulse_ms: i64, after_ms: u64, json: bool) -> Result<()> {
    check_duration(pulse_ms)?;
    let session = Session::attach(outputs)?;

    session.controller.enable(pulse_ms);
    std::thread::sleep(Duration::from_millis(after_ms));
    session.controller.suspend();
    let remaining = session.controller.remaining_ms();
    session.controller.resume();

    let report = session.finish("suspend-cycle");
    output::print_report(&report, json, Some(remaining))
}
