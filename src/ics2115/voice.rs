//! ICS2115 Voice
//!
//! One voice = wavetable oscillator + volume envelope + anti-click ramp.
//!
//! Both accumulators advance once per output sample. Boundary detection uses the
//! signed distance `left` to the loop edge in the current direction, so it keeps
//! working across 32-bit wraparound of the accumulators.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::constants::RAMP_MAX;

bitflags! {
    /// Oscillator configuration register (0x00)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct OscConf: u8 {
        /// Sample data is 8-bit µ-law
        const ULAW = 0x01;
        /// Oscillator stopped (also freezes the envelope when it is done)
        const STOP = 0x02;
        /// Sample data is 8-bit linear
        const EIGHT_BIT = 0x04;
        /// Loop between start and end
        const LOOP = 0x08;
        /// Ping-pong loop
        const LOOP_BIDIR = 0x10;
        /// Raise an interrupt at the boundary
        const IRQ = 0x20;
        /// Playing backwards
        const INVERT = 0x40;
        /// Boundary interrupt pending (read only from the host side)
        const IRQ_PENDING = 0x80;
    }
}

bitflags! {
    /// Volume envelope control register (0x0D)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct VolCtrl: u8 {
        /// Envelope reached its end
        const DONE = 0x01;
        /// Envelope halted
        const STOP = 0x02;
        /// Rollover (not emulated)
        const ROLLOVER = 0x04;
        /// Loop between start and end
        const LOOP = 0x08;
        /// Ping-pong loop
        const LOOP_BIDIR = 0x10;
        /// Raise an interrupt at the boundary
        const IRQ = 0x20;
        /// Ramping down
        const INVERT = 0x40;
        /// Boundary interrupt pending (read only from the host side)
        const IRQ_PENDING = 0x80;
    }
}

impl OscConf {
    /// Host write: bit 7 is chip-owned, bits 0-6 come from `value`
    pub fn apply_register(&mut self, value: u8) {
        *self = Self::from_bits_retain((self.bits() & 0x80) | (value & 0x7F));
    }
}

impl VolCtrl {
    /// Host write: bit 7 is chip-owned, bits 0-6 come from `value`
    pub fn apply_register(&mut self, value: u8) {
        *self = Self::from_bits_retain((self.bits() & 0x80) | (value & 0x7F));
    }
}

/// Wavetable phase accumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Oscillator {
    /// Phase accumulator; bits 31-12 address the current bank, bits 11-3 are the fraction
    pub acc: u32,
    /// Frequency control, added to `acc` four times per sample
    pub fc: u16,
    /// Loop start address
    pub start: u32,
    /// Loop end address
    pub end: u32,
    /// Last value written to the oscillator control register
    pub ctl: u8,
    /// ROM bank (address bits 27-20)
    pub saddr: u8,
    /// Signed distance to the boundary in the current direction
    pub left: i32,
    /// Configuration flags
    pub conf: OscConf,
}

/// Volume envelope accumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VolumeEnvelope {
    /// Volume accumulator (register value << 10)
    pub acc: u32,
    /// Raw 16-bit accumulator register
    pub regacc: u16,
    /// Raw increment register: bits 7-6 range, bits 5-0 rate
    pub incr: u8,
    /// Per-sample increment derived from `incr`
    pub add: u32,
    /// Envelope start
    pub start: u32,
    /// Envelope end
    pub end: u32,
    /// Stereo position (stored, not applied)
    pub pan: u8,
    /// Signed distance to the boundary in the current direction
    pub left: i32,
    /// Control flags
    pub ctrl: VolCtrl,
}

/// One of the 32 chip voices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Voice {
    /// Wavetable oscillator
    pub osc: Oscillator,
    /// Volume envelope
    pub vol: VolumeEnvelope,
    /// Anti-click ramp, 0..=0x40
    pub ramp: u8,
    /// Key-on state
    pub on: bool,
}

impl Voice {
    /// Voice state after a chip reset
    pub fn power_on() -> Self {
        Voice {
            osc: Oscillator {
                conf: OscConf::STOP,
                ..Oscillator::default()
            },
            vol: VolumeEnvelope {
                pan: 0x7F,
                ctrl: VolCtrl::DONE,
                ..VolumeEnvelope::default()
            },
            ramp: 0,
            on: false,
        }
    }

    /// A voice is playing while keyed on, unless both oscillator and envelope have halted
    pub fn playing(&self) -> bool {
        self.on
            && !(self.vol.ctrl.intersects(VolCtrl::DONE | VolCtrl::STOP)
                && self.osc.conf.contains(OscConf::STOP))
    }

    /// Key on: no attack phase, the ramp jumps straight to full level
    pub fn key_on(&mut self) {
        self.on = true;
        self.ramp = RAMP_MAX;
    }

    /// Halt oscillator and envelope and key the voice off
    pub fn force_stop(&mut self) {
        self.osc.conf.insert(OscConf::STOP);
        self.vol.ctrl.insert(VolCtrl::STOP);
        self.on = false;
    }

    /// Derive the envelope step from the increment register.
    ///
    /// The 2-bit range field divides the 6-bit rate by 1, 8, 64 or 512.
    pub fn refresh_volume_increment(&mut self) {
        let range = u32::from(self.vol.incr >> 6);
        self.vol.add = (u32::from(self.vol.incr & 0x3F) << 10) >> (3 * range);
    }

    /// Advance the oscillator by one sample. Returns true when a boundary interrupt fired.
    pub fn update_oscillator(&mut self) -> bool {
        let osc = &mut self.osc;
        if osc.conf.contains(OscConf::STOP) {
            return false;
        }

        let step = u32::from(osc.fc) << 2;
        if osc.conf.contains(OscConf::INVERT) {
            osc.acc = osc.acc.wrapping_sub(step);
            osc.left = osc.acc.wrapping_sub(osc.start) as i32;
        } else {
            osc.acc = osc.acc.wrapping_add(step);
            osc.left = osc.end.wrapping_sub(osc.acc) as i32;
        }

        if osc.left > 0 {
            return false;
        }

        let mut fired = false;
        if osc.conf.contains(OscConf::IRQ) {
            osc.conf.insert(OscConf::IRQ_PENDING);
            fired = true;
        }

        if osc.conf.contains(OscConf::LOOP) {
            if osc.conf.contains(OscConf::LOOP_BIDIR) {
                osc.conf.toggle(OscConf::INVERT);
            }
            // Re-home by the overshoot
            if osc.conf.contains(OscConf::INVERT) {
                osc.acc = osc.end.wrapping_add(osc.left as u32);
                osc.left = osc.acc.wrapping_sub(osc.start) as i32;
            } else {
                osc.acc = osc.start.wrapping_sub(osc.left as u32);
                osc.left = osc.end.wrapping_sub(osc.acc) as i32;
            }
        } else {
            self.on = false;
            osc.conf.insert(OscConf::STOP);
            osc.acc = if osc.conf.contains(OscConf::INVERT) {
                osc.start
            } else {
                osc.end
            };
        }

        fired
    }

    /// Advance the volume envelope by one sample. Returns true when a boundary interrupt fired.
    ///
    /// With 8-bit sample data the envelope never loops or finishes on its own.
    pub fn update_volume_envelope(&mut self) -> bool {
        let vol = &mut self.vol;
        if vol.ctrl.intersects(VolCtrl::DONE | VolCtrl::STOP) {
            return false;
        }

        if vol.ctrl.contains(VolCtrl::INVERT) {
            vol.acc = vol.acc.wrapping_sub(vol.add);
            vol.left = vol.acc.wrapping_sub(vol.start) as i32;
        } else {
            vol.acc = vol.acc.wrapping_add(vol.add);
            vol.left = vol.end.wrapping_sub(vol.acc) as i32;
        }

        if vol.left > 0 {
            return false;
        }

        let mut fired = false;
        if vol.ctrl.contains(VolCtrl::IRQ) {
            vol.ctrl.insert(VolCtrl::IRQ_PENDING);
            fired = true;
        }

        if self.osc.conf.contains(OscConf::EIGHT_BIT) {
            return fired;
        }

        if vol.ctrl.contains(VolCtrl::LOOP) {
            if vol.ctrl.contains(VolCtrl::LOOP_BIDIR) {
                vol.ctrl.toggle(VolCtrl::INVERT);
            }
            if vol.ctrl.contains(VolCtrl::INVERT) {
                vol.acc = vol.end.wrapping_add(vol.left as u32);
                vol.left = vol.acc.wrapping_sub(vol.start) as i32;
            } else {
                vol.acc = vol.start.wrapping_sub(vol.left as u32);
                vol.left = vol.end.wrapping_sub(vol.acc) as i32;
            }
        } else {
            self.on = false;
            vol.ctrl.insert(VolCtrl::DONE);
            vol.acc = if vol.ctrl.contains(VolCtrl::INVERT) {
                vol.start
            } else {
                vol.end
            };
        }

        fired
    }

    /// Slow attack while sounding, slow release otherwise
    pub fn update_ramp(&mut self) {
        if self.on && !self.osc.conf.contains(OscConf::STOP) {
            self.ramp = (self.ramp + 1).min(RAMP_MAX);
        } else {
            self.ramp = self.ramp.saturating_sub(1);
        }
    }
}
