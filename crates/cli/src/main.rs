//! vibectl - timed vibrator control CLI
//!
//! Attaches a controller to a recording software actuator and drives it
//! through pulse, retrigger, duty-cycle and suspend scenarios, printing the
//! resulting actuator trace and counters.

#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod commands;
mod error;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::CliError;

#[derive(Parser)]
#[command(name = "vibectl")]
#[command(about = "Drive a timed vibrator controller against a software actuator")]
#[command(version)]
#[command(long_about = "
vibectl attaches a vibrator controller to a recording software actuator and
runs one command against it. Every hardware transition the controller issues
is printed with its offset from attach.

Use --json for machine-readable output.
")]
struct Cli {
    /// Output in JSON format
    #[arg(long, global = true, help = "Output in JSON format for machine parsing")]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Outputs the simulated actuator exposes
    #[arg(long, global = true, value_enum, default_value_t = Outputs::Both)]
    outputs: Outputs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Outputs {
    /// Enable line and PWM channel
    Both,
    /// Enable line only
    Line,
    /// PWM channel only
    Pwm,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a single pulse and wait for it to end
    Pulse {
        /// Pulse length in milliseconds
        #[arg(allow_negative_numbers = true)]
        duration_ms: i64,
        /// Duty cycle in microseconds, clamped to the playback period
        #[arg(long, allow_negative_numbers = true)]
        duty: Option<i64>,
    },

    /// Start a pulse, then replace it after a delay
    Retrigger {
        /// First pulse length in milliseconds
        first_ms: i64,
        /// Replacement pulse length in milliseconds
        second_ms: i64,
        /// Delay before the replacement, in milliseconds
        delay_ms: u64,
    },

    /// Set the duty cycle and report the stored value
    Duty {
        /// Requested duty cycle in microseconds
        #[arg(allow_negative_numbers = true)]
        value: i64,
    },

    /// Suspend in the middle of a pulse, then resume
    SuspendCycle {
        /// Pulse length in milliseconds
        #[arg(long, default_value_t = 200)]
        pulse_ms: i64,
        /// Time into the pulse at which to suspend, in milliseconds
        #[arg(long, default_value_t = 50)]
        after_ms: u64,
    },

    /// Look up the minimum CPU frequency for a PM-QoS mode
    Pmqos {
        /// Power-save mode on
        #[arg(action = clap::ArgAction::Set)]
        powersave: bool,
        /// Audio playback active
        #[arg(action = clap::ArgAction::Set)]
        audio: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("vibectl={log_level},timed_output_vibrator={log_level}").into()
            }),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match execute_command(&cli) {
        Ok(()) => Ok(()),
        Err(e) => {
            if cli.json {
                output::print_error_json(&e);
            } else {
                output::print_error_human(&e);
            }

            let exit_code = e.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
            std::process::exit(exit_code);
        }
    }
}

fn execute_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Pulse { duration_ms, duty } => {
            commands::pulse::execute(cli.outputs, *duration_ms, *duty, cli.json)
        }
        Commands::Retrigger {
            first_ms,
            second_ms,
            delay_ms,
        } => commands::pulse::retrigger(cli.outputs, *first_ms, *second_ms, *delay_ms, cli.json),
        Commands::Duty { value } => commands::duty::execute(cli.outputs, *value, cli.json),
        Commands::SuspendCycle { pulse_ms, after_ms } => {
            commands::suspend::execute(cli.outputs, *pulse_ms, *after_ms, cli.json)
        }
        Commands::Pmqos { powersave, audio } => {
            commands::pmqos::execute(*powersave, *audio, cli.json)
        }
    }
}
