//! PM-QoS lookup command

use anyhow::Result;
use timed_output_pmqos::{PmQosMode, PmQosState};

use crate::output;

pub fn execute(powersave: bool, audio: bool, json: bool) -> Result<()> {
    let state = PmQosState::new(PmQosMode::new(powersave, audio));
    output::print_pmqos(&state, json)
}
