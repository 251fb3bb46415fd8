//! Save state
//!
//! Everything the host CPU can observe through the register window, plus the
//! timer phase. The ROM, lookup tables and IRQ listener are not part of it.

use serde::{Deserialize, Serialize};

use super::constants::{RAMP_MAX, VOICE_COUNT};
use super::voice::Voice;
use crate::timers::TimerSubsystem;
use crate::{Ics2115Error, Result};

/// Serializable snapshot of an ICS2115
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChipState {
    /// Per-voice state
    pub voices: [Voice; VOICE_COUNT],
    /// Highest voice index that is mixed and polled
    pub active_voices: u8,
    /// Voice addressed by per-voice registers
    pub selected_voice: u8,
    /// Register addressed by the data ports
    pub selected_register: u8,
    /// Timer interrupt enable mask
    pub irq_enabled: u8,
    /// Timer interrupt pending bits
    pub irq_pending: u8,
    /// Global voice mode
    pub vmode: u8,
    /// Latched interrupt line
    pub irq_on: bool,
    /// Interval timers
    pub timers: TimerSubsystem,
}

impl ChipState {
    /// Check everything the chip relies on to run without overflowing:
    /// voice indices, ramp levels and timer countdowns
    pub fn validate(&self) -> Result<()> {
        if usize::from(self.active_voices) >= VOICE_COUNT {
            return Err(Ics2115Error::StateError(format!(
                "active voice count {} out of range",
                self.active_voices
            )));
        }
        if usize::from(self.selected_voice) >= VOICE_COUNT {
            return Err(Ics2115Error::StateError(format!(
                "selected voice {} out of range",
                self.selected_voice
            )));
        }
        if let Some(i) = self.voices.iter().position(|v| v.ramp > RAMP_MAX) {
            return Err(Ics2115Error::StateError(format!(
                "voice {i}: ramp {:#04x} above {RAMP_MAX:#04x}",
                self.voices[i].ramp
            )));
        }
        self.timers.validate()
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize from JSON and validate
    pub fn from_json(json: &str) -> Result<Self> {
        let state: ChipState = serde_json::from_str(json)?;
        state.validate()?;
        Ok(state)
    }
}
