//! Pulse state machine.
//!
//! The controller has two states. `Pulsing` is entered on activation and
//! left only by a full deactivation:
//!
//! ```text
//!          enable(v>0)
//!   Idle ───────────────► Pulsing ──┐ enable(v>0): re-arm
//!    ▲                       │  ◄───┘ stop job, short: arm feedback
//!    │                       │
//!    └───────────────────────┘
//!     enable(0), stop job, feedback job, suspend
//! ```

use portable_atomic::{AtomicU8, Ordering};
use serde::{Deserialize, Serialize};

/// Controller pulse state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum PulseState {
    /// Actuator off, no pulse in flight.
    #[default]
    Idle = 0,
    /// A pulse is in flight.
    Pulsing = 1,
}

impl PulseState {
    /// Convert from raw u8 value.
    #[must_use]
    pub fn from_raw(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Idle),
            1 => Some(Self::Pulsing),
            _ => None,
        }
    }

    /// Convert to raw u8 value.
    #[must_use]
    pub fn to_raw(self) -> u8 {
        self as u8
    }

    /// Get the state as a string slice.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Pulsing => "Pulsing",
        }
    }
}

impl core::fmt::Display for PulseState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lock-free cell holding a [`PulseState`].
///
/// Read from timer context, written under the controller's transition lock.
#[derive(Debug)]
pub struct AtomicPulseState {
    raw: AtomicU8,
}

impl AtomicPulseState {
    /// Create a cell in `Idle`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            raw: AtomicU8::new(PulseState::Idle.to_raw()),
        }
    }

    /// Current state.
    #[must_use]
    pub fn load(&self) -> PulseState {
        PulseState::from_raw(self.raw.load(Ordering::Acquire)).unwrap_or(PulseState::Idle)
    }

    /// Store `state` and return the previous one.
    pub fn swap(&self, state: PulseState) -> PulseState {
        PulseState::from_raw(self.raw.swap(state.to_raw(), Ordering::AcqRel))
            .unwrap_or(PulseState::Idle)
    }

    /// Whether a pulse is in flight.
    #[must_use]
    pub fn is_pulsing(&self) -> bool {
        self.load() == PulseState::Pulsing
    }
}

impl Default for AtomicPulseState {
    fn default() -> Self {
        Self::new()
    }
}
