//! CPU frequency limits for power-management quality of service.
//!
//! The minimum CPU frequency floor depends on two flags: whether the device
//! is in power-save mode and whether audio playback is active. Audio needs a
//! higher floor to avoid underruns, except in power-save mode where the
//! default floor wins.
//!
//! | powersave | audio | min CPU freq (kHz) |
//! |-----------|-------|--------------------|
//! | no        | no    | 51 000             |
//! | no        | yes   | 102 000            |
//! | yes       | no    | 51 000             |
//! | yes       | yes   | 51 000             |
//!
//! ```
//! use timed_output_pmqos::{PmQosMode, min_cpu_freq_khz};
//!
//! let mode = PmQosMode { powersave: false, audio: true };
//! assert_eq!(min_cpu_freq_khz(mode), 102_000);
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod limits;
pub mod state;

pub use limits::{
    AUD_CPU_MIN_FREQ, BOOST_CPU_FREQ_MIN, CAP_CPU_FREQ_MAX, DEF_CPU_MIN_FREQ, LP_MAX_FREQ,
    PS_AUD_CPU_MIN_FREQ, PS_CPU_MAX_CORES, PS_CPU_MAX_FREQ, PmQosMode, min_cpu_freq_khz,
};
pub use state::PmQosState;
