//! Duty-cycle command

use anyhow::Result;

use crate::Outputs;
use crate::commands::Session;
use crate::output;

/// Set the duty cycle and report what was stored.
pub fn execute(outputs: Outputs, value: i64, json: bool) -> Result<()> {
    let session = Session::attach(outputs)?;
    let stored = session.controller.set_duty_cycle(value);
    let period = session.controller.config().playback_period_us;
    let report = session.finish("duty");
    output::print_duty(value, stored, period, &report, json)
}
