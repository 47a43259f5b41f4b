//! Output formatting for CLI responses

use anyhow::{Error, Result};
use colored::*;
use serde::Serialize;
use serde_json::json;
use timed_output_pmqos::PmQosState;
use timed_output_vibrator::{PulseState, VibratorMetrics};

use crate::error::CliError;

/// One actuator transition, offset from attach.
#[derive(Debug, Clone, Serialize)]
pub struct EventLine {
    pub at_us: u64,
    pub event: String,
}

/// What a command observed before detaching.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub command: String,
    pub state: PulseState,
    pub duty_us: u32,
    pub elapsed_ms: u64,
    pub metrics: VibratorMetrics,
    pub events: Vec<EventLine>,
}

/// Print error in JSON format
pub fn print_error_json(error: &Error) {
    let error_json = json!({
        "success": false,
        "error": {
            "message": error.to_string(),
            "type": error_type_name(error)
        }
    });
    match serde_json::to_string_pretty(&error_json) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("Failed to format error as JSON: {}", e),
    }
}

/// Print error in human-readable format
pub fn print_error_human(error: &Error) {
    eprintln!("{} {}", "Error:".red().bold(), error);

    let mut source = error.source();
    while let Some(err) = source {
        eprintln!("  {} {}", "Caused by:".yellow(), err);
        source = err.source();
    }
}

/// Print a pulse report, with the remaining time sampled right after enable.
pub fn print_report(report: &Report, json: bool, remaining_ms: Option<u64>) -> Result<()> {
    if json {
        let output = json!({
            "success": true,
            "remaining_ms": remaining_ms,
            "report": report,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).map_err(CliError::from)?
        );
        return Ok(());
    }

    println!("{} {}", report.command.bold(), state_label(report.state));
    if let Some(remaining) = remaining_ms {
        println!("  remaining after enable: {} ms", remaining);
    }
    println!("  duty: {} us", report.duty_us);
    println!("  elapsed: {} ms", report.elapsed_ms);
    print_metrics_human(&report.metrics);
    println!("  {}", "Events:".bold());
    for line in &report.events {
        println!("    {:>9} us  {}", line.at_us, line.event.dimmed());
    }
    Ok(())
}

/// Print the outcome of a duty-cycle write.
pub fn print_duty(
    requested: i64,
    stored: u32,
    period_us: u32,
    report: &Report,
    json: bool,
) -> Result<()> {
    let clamped = i64::from(stored) != requested;
    if json {
        let output = json!({
            "success": true,
            "requested": requested,
            "duty_us": stored,
            "period_us": period_us,
            "clamped": clamped,
            "events": report.events,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).map_err(CliError::from)?
        );
        return Ok(());
    }

    let note = if clamped {
        format!(" (clamped from {})", requested).yellow().to_string()
    } else {
        String::new()
    };
    println!("duty: {} / {} us{}", stored.to_string().bold(), period_us, note);
    Ok(())
}

/// Print the CPU frequency floor for a PM-QoS mode.
pub fn print_pmqos(state: &PmQosState, json: bool) -> Result<()> {
    if json {
        let output = json!({
            "success": true,
            "powersave": state.mode().powersave,
            "audio": state.mode().audio,
            "min_cpu_freq_khz": state.min_cpu_freq_khz(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).map_err(CliError::from)?
        );
        return Ok(());
    }

    let mode = state.mode();
    println!(
        "powersave={} audio={}: min CPU freq {} kHz",
        mode.powersave,
        mode.audio,
        state.min_cpu_freq_khz().to_string().bold()
    );
    Ok(())
}

fn print_metrics_human(metrics: &VibratorMetrics) {
    println!("  {}", "Metrics:".bold());
    println!("    pulses started:   {}", metrics.pulses_started);
    println!("    pulses completed: {}", metrics.pulses_completed);
    println!("    explicit stops:   {}", metrics.explicit_stops);
    if metrics.overruns > 0 {
        println!(
            "    {} {} (worst {} ms)",
            "overruns:".yellow(),
            metrics.overruns,
            metrics.worst_overrun_ms
        );
    }
    if metrics.io_failures > 0 {
        println!("    {} {}", "io failures:".red(), metrics.io_failures);
    }
    if metrics.dropped_requests > 0 {
        println!("    {} {}", "dropped requests:".red(), metrics.dropped_requests);
    }
}

fn state_label(state: PulseState) -> ColoredString {
    match state {
        PulseState::Idle => "idle".green(),
        PulseState::Pulsing => "pulsing".yellow(),
    }
}

fn error_type_name(error: &Error) -> String {
    match error.downcast_ref::<CliError>() {
        Some(CliError::InvalidArgument(_)) => "InvalidArgument".to_string(),
        Some(CliError::Timeout(_)) => "Timeout".to_string(),
        Some(CliError::Controller(_)) => "Controller".to_string(),
        Some(CliError::JsonError(_)) => "JsonError".to_string(),
        None => format!("{:?}", error)
            .split('(')
            .next()
            .unwrap_or("Unknown")
            .to_string(),
    }
}
