//! ICS2115 Wavetable Synthesizer Domain
//!
//! Voice engine, register protocol and output mixing for the ICS2115
//! WaveFront chip.
//!
//! Implementation:
//! - `chip` - host-facing façade (ports, register router, block rendering)
//! - `voice` - oscillator, volume envelope and release ramp
//! - `sample` - ROM fetch, interpolation and µ-law decoding
//! - `mixer` - per-voice accumulation and output scaling

// Internal modules
pub mod chip;
pub mod constants;
pub mod irq;
pub mod mixer;
pub mod registers;
pub mod sample;
pub mod state;
pub mod tables;
pub mod voice;

// Re-export public API
pub use chip::Ics2115;
pub use irq::IrqCallback;
pub use registers::{Half, Port, Register};
pub use state::ChipState;
pub use voice::{OscConf, Oscillator, VolCtrl, VolumeEnvelope, Voice};
