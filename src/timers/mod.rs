//! Timer Subsystem
//!
//! The ICS2115 has two interval timers. Their expiries set bits in the chip's
//! interrupt-pending register. There is no host scheduler here: time advances
//! explicitly, either per generated sample or by a nanosecond amount.

pub mod timer;

pub use timer::Timer;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::ics2115::constants::{CLOCKS_PER_SAMPLE, DEFAULT_MASTER_CLOCK, TIMER_COUNT};
use crate::{Ics2115Error, Result};

/// Time units (ns * master clock) in one output sample
const UNITS_PER_SAMPLE: u64 = CLOCKS_PER_SAMPLE as u64 * 1_000_000_000;

/// The chip's two interval timers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSubsystem {
    timers: [Timer; TIMER_COUNT],
    master_clock: u32,
}

impl TimerSubsystem {
    /// Create disabled timers for the given master clock
    pub fn new(master_clock: u32) -> Self {
        TimerSubsystem {
            timers: [Timer::new(); TIMER_COUNT],
            master_clock,
        }
    }

    /// Disable both timers and clear their registers
    pub fn reset(&mut self) {
        for timer in &mut self.timers {
            timer.reset();
        }
    }

    /// Access one timer (index is taken modulo the timer count)
    pub fn timer(&self, index: usize) -> &Timer {
        &self.timers[index % TIMER_COUNT]
    }

    /// Master clock the periods are derived from
    pub fn master_clock(&self) -> u32 {
        self.master_clock
    }

    /// Write a preset register and recompute that timer
    pub fn set_preset(&mut self, index: usize, value: u8) -> bool {
        self.timers[index % TIMER_COUNT].set_preset(value);
        self.recalc(index)
    }

    /// Write a prescale register and recompute that timer
    pub fn set_scale(&mut self, index: usize, value: u8) -> bool {
        self.timers[index % TIMER_COUNT].set_scale(value);
        self.recalc(index)
    }

    /// Recompute one timer's period. Returns true if it was reprogrammed.
    pub fn recalc(&mut self, index: usize) -> bool {
        let index = index % TIMER_COUNT;
        let timer = &mut self.timers[index];
        let changed = timer.recalc(self.master_clock);
        if changed {
            debug!(
                target: "ics2115",
                "timer {index}: preset {:#04x} scale {:#04x} -> period {} ns",
                timer.preset(),
                timer.scale(),
                timer.period()
            );
        }
        changed
    }

    /// Check a restored subsystem before it is allowed to run
    pub fn validate(&self) -> Result<()> {
        if self.master_clock == 0 {
            return Err(Ics2115Error::StateError(
                "timer master clock must be non-zero".to_string(),
            ));
        }
        for (i, timer) in self.timers.iter().enumerate() {
            if !timer.is_consistent(self.master_clock) {
                return Err(Ics2115Error::StateError(format!(
                    "timer {i}: period {} ns and countdown {:?} do not match preset {:#04x} scale {:#04x}",
                    timer.period(),
                    timer.remaining(),
                    timer.preset(),
                    timer.scale()
                )));
            }
        }
        Ok(())
    }

    /// Advance by a number of output samples. Returns a bitmask of expired timers.
    pub fn advance_samples(&mut self, samples: usize) -> u8 {
        self.advance_units((samples as u64).saturating_mul(UNITS_PER_SAMPLE))
    }

    /// Advance by a number of nanoseconds. Returns a bitmask of expired timers.
    pub fn advance_nanos(&mut self, nanos: u64) -> u8 {
        self.advance_units(nanos.saturating_mul(u64::from(self.master_clock)))
    }

    fn advance_units(&mut self, units: u64) -> u8 {
        let mut fired = 0;
        for (i, timer) in self.timers.iter_mut().enumerate() {
            if timer.advance(units, self.master_clock) {
                fired |= 1 << i;
            }
        }
        fired
    }
}

impl Default for TimerSubsystem {
    fn default() -> Self {
        Self::new(DEFAULT_MASTER_CLOCK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timers_start_disabled() {
        let mut timers = TimerSubsystem::default();
        assert!(!timers.timer(0).is_active());
        assert!(!timers.timer(1).is_active());
        assert_eq!(timers.advance_samples(1_000_000), 0);
    }

    #[test]
    fn test_independent_expiry() {
        let mut timers = TimerSubsystem::default();
        timers.set_preset(0, 0);
        timers.set_preset(1, 0xFF);

        // 472 ns period: one sample (~30.2 us) is long enough for timer 0 only
        assert_eq!(timers.advance_samples(1), 0b01);

        // 256 * 16 cycles ~ 121 us, about four samples
        assert_eq!(timers.advance_samples(4), 0b11);
    }

    #[test]
    fn test_nanosecond_advance() {
        let mut timers = TimerSubsystem::default();
        timers.set_preset(1, 0);
        assert_eq!(timers.advance_nanos(471), 0);
        assert_eq!(timers.advance_nanos(1), 0b10);
    }

    #[test]
    fn test_same_value_does_not_rearm() {
        let mut timers = TimerSubsystem::default();
        assert!(timers.set_scale(0, 0x01));
        assert!(!timers.set_scale(0, 0x01));
        assert!(timers.set_preset(0, 0x02));
        assert!(!timers.set_preset(0, 0x02));
    }

    #[test]
    fn test_reset_disables() {
        let mut timers = TimerSubsystem::default();
        timers.set_preset(0, 3);
        timers.reset();
        assert!(!timers.timer(0).is_active());
        assert_eq!(timers.timer(0).preset(), 0);
    }

    #[test]
    fn test_validate() {
        let mut timers = TimerSubsystem::default();
        assert!(timers.validate().is_ok());
        timers.set_preset(0, 0x10);
        timers.advance_samples(3);
        assert!(timers.validate().is_ok());

        assert!(TimerSubsystem::new(0).validate().is_err());
    }
}
