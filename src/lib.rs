//! ICS2115 WaveFront Synthesizer Emulator
//!
//! A sample-accurate emulator of the ICS2115 wavetable sound chip as used on
//! arcade boards of the late 1990s. The chip plays up to 32 voices from a
//! sample ROM, each with its own oscillator, volume envelope and release ramp,
//! and exposes two interval timers with a shared interrupt line.
//!
//! # Features
//! - 32 voices with 8-bit, 16-bit and µ-law sample formats
//! - Forward, bidirectional and one-shot loops with boundary interrupts
//! - Logarithmic volume envelopes with loop and IRQ support
//! - Two programmable interval timers driven by rendered audio or explicit time
//! - Byte-wide 4-port host interface, including read side effects
//! - Save states and WAV rendering
//!
//! # Quick start
//! ```no_run
//! use ics2115::Ics2115;
//!
//! let rom = std::fs::read("wavetable.bin").unwrap();
//! let mut chip = Ics2115::new(rom);
//!
//! chip.write(1, 0x4F); // Select voice register
//! chip.write(2, 0x00); // Voice 0
//! chip.write(1, 0x10); // Oscillator control
//! chip.write(3, 0x00); // Key on
//!
//! let mut left = vec![0i32; 512];
//! let mut right = vec![0i32; 512];
//! chip.generate(&mut left, &mut right);
//! ```
//!
//! ## Interrupts
//! ```no_run
//! use ics2115::Ics2115;
//!
//! let mut chip = Ics2115::new(vec![0u8; 0x1000]);
//! chip.set_irq_callback(Box::new(|asserted| {
//!     println!("IRQ line {}", if asserted { "high" } else { "low" });
//! }));
//! chip.write(1, 0x4A); // IRQ enable
//! chip.write(2, 0x01); // Timer 0
//! chip.write(1, 0x40); // Timer 0 preset
//! chip.write(2, 0x20);
//! chip.run_timers(1_000_000);
//! ```

#![warn(missing_docs)]

// Domain modules
pub mod config; // Board configuration
pub mod export; // WAV rendering
pub mod ics2115; // ICS2115 emulation (core)
pub mod shared; // Thread-safe chip handle
pub mod timers; // Interval timers

/// Error types for ICS2115 emulator operations
#[derive(thiserror::Error, Debug)]
pub enum Ics2115Error {
    /// Error writing audio file
    #[error("Audio file write error: {0}")]
    AudioFileError(String),

    /// IO error from filesystem or device
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Save state could not be encoded, decoded or applied
    #[error("Invalid save state: {0}")]
    StateError(String),
}

impl From<serde_json::Error> for Ics2115Error {
    /// Save states are the only JSON documents with no dedicated parser, so
    /// serde errors map to `StateError`.
    fn from(err: serde_json::Error) -> Self {
        Ics2115Error::StateError(err.to_string())
    }
}

/// Result type for emulator operations
pub type Result<T> = std::result::Result<T, Ics2115Error>;

// Public API exports
pub use config::ChipConfig;
pub use export::{render_wav, render_wav_with_config, ExportConfig};
pub use ics2115::{ChipState, Ics2115, IrqCallback, Register, Voice};
pub use shared::SharedIcs2115;
pub use timers::{Timer, TimerSubsystem};
