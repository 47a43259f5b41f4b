//! Tracked quality-of-service flags.

use crate::limits::{PmQosMode, min_cpu_freq_khz};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Current power-save and audio flags with the minimum frequency they imply.
///
/// The derived floor is recomputed on every flag change, so
/// [`min_cpu_freq_khz`](Self::min_cpu_freq_khz) is always consistent with
/// [`mode`](Self::mode).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PmQosState {
    mode: PmQosMode,
    min_cpu_freq_khz: u32,
}

impl PmQosState {
    /// Create a state for `mode`.
    #[must_use]
    pub fn new(mode: PmQosMode) -> Self {
        Self {
            mode,
            min_cpu_freq_khz: min_cpu_freq_khz(mode),
        }
    }

    /// Current flags.
    #[must_use]
    pub fn mode(&self) -> PmQosMode {
        self.mode
    }

    /// Minimum CPU frequency for the current flags, in kHz.
    #[must_use]
    pub fn min_cpu_freq_khz(&self) -> u32 {
        self.min_cpu_freq_khz
    }

    /// Set the power-save flag. Returns whether the floor changed.
    pub fn set_powersave(&mut self, on: bool) -> bool {
        self.update(PmQosMode {
            powersave: on,
            ..self.mode
        })
    }

    /// Set the audio flag. Returns whether the floor changed.
    pub fn set_audio(&mut self, on: bool) -> bool {
        self.update(PmQosMode {
            audio: on,
            ..self.mode
        })
    }

    fn update(&mut self, mode: PmQosMode) -> bool {
        let previous = self.min_cpu_freq_khz;
        self.mode = mode;
        self.min_cpu_freq_khz = min_cpu_freq_khz(mode);
        let changed = previous != self.min_cpu_freq_khz;
        if changed {
            debug!(
                powersave = mode.powersave,
                audio = mode.audio,
                from_khz = previous,
                to_khz = self.min_cpu_freq_khz,
                "minimum CPU frequency changed"
            );
        }
        changed
    }
}

impl Default for PmQosState {
    fn default() -> Self {
        Self::new(PmQosMode::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_raises_floor_outside_powersave() {
        let mut state = PmQosState::default();
        assert_eq!(state.min_cpu_freq_khz(), 51_000);
        assert!(state.set_audio(true));
        assert_eq!(state.min_cpu_freq_khz(), 102_000);
    }

    #[test]
    fn test_powersave_overrides_audio() {
        let mut state = PmQosState::new(PmQosMode::new(false, true));
        assert!(state.set_powersave(true));
        assert_eq!(state.min_cpu_freq_khz(), 51_000);
        assert!(!state.set_audio(false));
        assert_eq!(state.mode(), PmQosMode::new(true, false));
    }
}
