//! ICS2115 Interval Timer
//!
//! Each timer counts `(prescale + 1) * (preset + 1)` ticks of a clock derived
//! from the master crystal and raises its interrupt-pending bit on expiry.
//! Time is tracked in units of `ns * master_clock` so that both sample-driven
//! and nanosecond-driven advancement stay exact.

use serde::{Deserialize, Serialize};

const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Programmable interval timer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer {
    /// Preset register
    preset: u8,
    /// Prescale register: bits 4-0 divider, bits 7-5 extra shift
    scale: u8,
    /// Period in nanoseconds, 0 when disabled
    period: u64,
    /// Time until the next expiry (ns * master clock), None when disabled
    remaining: Option<u64>,
}

impl Timer {
    /// Create a disabled timer
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the timer (disabled, registers cleared)
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Period in nanoseconds for a preset/prescale pair
    pub fn compute_period(preset: u8, scale: u8, master_clock: u32) -> u64 {
        let ticks = (u64::from(scale & 0x1F) + 1) * (u64::from(preset) + 1);
        let cycles = ticks << (4 + (scale >> 5));
        cycles * NANOS_PER_SECOND / u64::from(master_clock)
    }

    /// Set preset register (call `recalc` afterwards)
    pub fn set_preset(&mut self, value: u8) {
        self.preset = value;
    }

    /// Get preset register
    pub fn preset(&self) -> u8 {
        self.preset
    }

    /// Set prescale register (call `recalc` afterwards)
    pub fn set_scale(&mut self, value: u8) {
        self.scale = value;
    }

    /// Get prescale register
    pub fn scale(&self) -> u8 {
        self.scale
    }

    /// Current period in nanoseconds (0 = disabled)
    pub fn period(&self) -> u64 {
        self.period
    }

    /// Is the timer counting?
    pub fn is_active(&self) -> bool {
        self.remaining.is_some()
    }

    /// Time until the next expiry in `ns * master_clock` units
    pub fn remaining(&self) -> Option<u64> {
        self.remaining
    }

    /// Recompute the period from the registers.
    ///
    /// An unchanged period leaves the running countdown alone. A new period
    /// discards the pending expiry and re-arms one full period from now.
    /// Returns true if the timer was reprogrammed.
    pub fn recalc(&mut self, master_clock: u32) -> bool {
        let period = Self::compute_period(self.preset, self.scale, master_clock);
        if period == self.period {
            return false;
        }
        self.period = period;
        self.remaining = if period == 0 {
            None
        } else {
            Some(period.saturating_mul(u64::from(master_clock)))
        };
        true
    }

    /// Check that period and countdown agree with the registers.
    ///
    /// A disabled timer has no countdown; a running one has the period its
    /// registers produce and at most one period left.
    pub fn is_consistent(&self, master_clock: u32) -> bool {
        match self.remaining {
            None => self.period == 0,
            Some(remaining) => {
                self.period != 0
                    && self.period == Self::compute_period(self.preset, self.scale, master_clock)
                    && remaining <= self.period.saturating_mul(u64::from(master_clock))
            }
        }
    }

    /// Advance by `units` (ns * master clock). Returns true if the timer expired at least once.
    pub fn advance(&mut self, units: u64, master_clock: u32) -> bool {
        let Some(remaining) = self.remaining else {
            return false;
        };

        if units < remaining {
            self.remaining = Some(remaining - units);
            return false;
        }

        let span = self.period.saturating_mul(u64::from(master_clock));
        if span == 0 {
            self.remaining = None;
            return false;
        }
        let overshoot = (units - remaining) % span;
        self.remaining = Some(span - overshoot);
        true
    }
}
