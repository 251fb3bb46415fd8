//! Chip configuration
//!
//! The only board-level parameter is the master crystal. The output sample rate
//! and the timer time base are both derived from it.

use serde::{Deserialize, Serialize};

use crate::ics2115::constants::{CLOCKS_PER_SAMPLE, DEFAULT_MASTER_CLOCK};
use crate::{Ics2115Error, Result};

/// Board configuration for an ICS2115 instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChipConfig {
    /// Master clock in Hz (33.8688 MHz on the reference board)
    pub master_clock: u32,
}

impl ChipConfig {
    /// Configuration for a custom crystal
    pub fn with_master_clock(master_clock: u32) -> Self {
        ChipConfig { master_clock }
    }

    /// Output sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.master_clock / CLOCKS_PER_SAMPLE
    }

    /// Check that the clock is usable: non-zero and a whole number of samples
    pub fn validate(&self) -> Result<()> {
        if self.master_clock == 0 {
            return Err(Ics2115Error::ConfigError(
                "master clock must be non-zero".to_string(),
            ));
        }
        if self.master_clock % CLOCKS_PER_SAMPLE != 0 {
            return Err(Ics2115Error::ConfigError(format!(
                "master clock {} Hz is not a multiple of {CLOCKS_PER_SAMPLE}",
                self.master_clock
            )));
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ChipConfig = serde_json::from_str(json)
            .map_err(|e| Ics2115Error::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for ChipConfig {
    fn default() -> Self {
        ChipConfig {
            master_clock: DEFAULT_MASTER_CLOCK,
        }
    }
}
