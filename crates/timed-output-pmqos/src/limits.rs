//! Frequency constants and the minimum-frequency table.

use serde::{Deserialize, Serialize};

/// Frequency cap applied while the CPU is capped, in kHz.
pub const CAP_CPU_FREQ_MAX: u32 = 475_000;

/// Floor applied while boosting, in kHz.
pub const BOOST_CPU_FREQ_MIN: u32 = 1_400_000;

/// Default minimum CPU frequency, in kHz.
pub const DEF_CPU_MIN_FREQ: u32 = 51_000;

/// Minimum CPU frequency during audio playback, in kHz.
pub const AUD_CPU_MIN_FREQ: u32 = 102_000;

/// Minimum CPU frequency during audio playback in power-save mode, in kHz.
pub const PS_AUD_CPU_MIN_FREQ: u32 = 51_000;

/// Maximum frequency of the low-power cluster, in kHz.
pub const LP_MAX_FREQ: u32 = 475_000;

/// Maximum CPU frequency in power-save mode, in kHz.
pub const PS_CPU_MAX_FREQ: u32 = 1_150_000;

/// Maximum online cores in power-save mode.
pub const PS_CPU_MAX_CORES: u32 = 3;

/// The two flags that select a minimum frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PmQosMode {
    /// Power-save mode is on.
    pub powersave: bool,
    /// Audio playback is active.
    pub audio: bool,
}

impl PmQosMode {
    /// All four modes, in table order.
    pub const ALL: [Self; 4] = [
        Self::new(false, false),
        Self::new(false, true),
        Self::new(true, false),
        Self::new(true, true),
    ];

    /// Create a mode from its two flags.
    #[must_use]
    pub const fn new(powersave: bool, audio: bool) -> Self {
        Self { powersave, audio }
    }
}

/// Minimum CPU frequency for `mode`, in kHz.
#[must_use]
pub const fn min_cpu_freq_khz(mode: PmQosMode) -> u32 {
    match (mode.powersave, mode.audio) {
        (false, false) => DEF_CPU_MIN_FREQ,
        (false, true) => AUD_CPU_MIN_FREQ,
        (true, false) => DEF_CPU_MIN_FREQ,
        (true, true) => PS_AUD_CPU_MIN_FREQ,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_entries() {
        assert_eq!(min_cpu_freq_khz(PmQosMode::new(false, false)), 51_000);
        assert_eq!(min_cpu_freq_khz(PmQosMode::new(false, true)), 102_000);
        assert_eq!(min_cpu_freq_khz(PmQosMode::new(true, false)), 51_000);
        assert_eq!(min_cpu_freq_khz(PmQosMode::new(true, true)), 51_000);
    }

    #[test]
    fn test_caps_are_consistent() {
        assert!(CAP_CPU_FREQ_MAX <= PS_CPU_MAX_FREQ);
        assert!(PS_CPU_MAX_FREQ < BOOST_CPU_FREQ_MIN);
        assert_eq!(LP_MAX_FREQ, CAP_CPU_FREQ_MAX);
    }
}
