//! ICS2115 WaveFront synthesizer
//!
//! 32-voice wavetable chip with a 4-byte host window:
//! port 0 status, port 1 register select, ports 2/3 register data low/high.
//! Operates at master clock / 1024 (33 075 Hz on the reference board).

use std::fmt;
use std::sync::Arc;

use log::{debug, trace};

use super::constants::{
    OSC_CTL_FORCE_STOP, REVISION, STATUS_IRQ, STATUS_OSC_IRQ, STATUS_TIMER_IRQ, VOICE_COUNT,
};
use super::irq::{self, IrqCallback, IrqLine};
use super::mixer;
use super::registers::{Half, Port, Register};
use super::state::ChipState;
use super::voice::{OscConf, VolCtrl, Voice};
use crate::config::ChipConfig;
use crate::timers::TimerSubsystem;
use crate::{Ics2115Error, Result};

/// Value read back from registers the chip does not decode
const UNMAPPED_READ: u16 = 0;

/// ICS2115 emulator
pub struct Ics2115 {
    voices: [Voice; VOICE_COUNT],
    active_voices: u8,
    selected_voice: u8,
    selected_reg: u8,
    irq_enabled: u8,
    irq_pending: u8,
    vmode: u8,
    timers: TimerSubsystem,
    irq: IrqLine,
    rom: Arc<[u8]>,
    config: ChipConfig,
}

impl Ics2115 {
    /// Create a chip on the reference 33.8688 MHz clock
    pub fn new(rom: impl Into<Arc<[u8]>>) -> Self {
        Self::build(rom.into(), ChipConfig::default())
    }

    /// Create a chip with a custom board configuration
    pub fn with_config(rom: impl Into<Arc<[u8]>>, config: ChipConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(rom.into(), config))
    }

    fn build(rom: Arc<[u8]>, config: ChipConfig) -> Self {
        let mut chip = Ics2115 {
            voices: [Voice::power_on(); VOICE_COUNT],
            active_voices: (VOICE_COUNT - 1) as u8,
            selected_voice: 0,
            selected_reg: 0,
            irq_enabled: 0,
            irq_pending: 0,
            vmode: 0,
            timers: TimerSubsystem::new(config.master_clock),
            irq: IrqLine::new(),
            rom,
            config,
        };
        chip.reset();
        chip
    }

    /// Reset the chip to its power-on state
    pub fn reset(&mut self) {
        self.voices = [Voice::power_on(); VOICE_COUNT];
        self.active_voices = (VOICE_COUNT - 1) as u8;
        self.selected_voice = 0;
        self.selected_reg = 0;
        self.irq_enabled = 0;
        self.irq_pending = 0;
        self.vmode = 0;
        self.timers.reset();
        self.irq.update(false);
    }

    /// Board configuration
    pub fn config(&self) -> ChipConfig {
        self.config
    }

    /// Output sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate()
    }

    /// Wavetable ROM
    pub fn rom(&self) -> &Arc<[u8]> {
        &self.rom
    }

    /// Swap the wavetable ROM
    pub fn set_rom(&mut self, rom: impl Into<Arc<[u8]>>) {
        self.rom = rom.into();
    }

    /// Install a listener for interrupt line changes
    pub fn set_irq_callback(&mut self, callback: IrqCallback) {
        self.irq.set_callback(callback);
    }

    /// Remove the interrupt listener
    pub fn clear_irq_callback(&mut self) {
        self.irq.clear_callback();
    }

    /// Current interrupt line level
    pub fn irq_line(&self) -> bool {
        self.irq.is_asserted()
    }

    /// Voice state (index wraps at 32)
    pub fn voice(&self, index: usize) -> &Voice {
        &self.voices[index % VOICE_COUNT]
    }

    /// Mutable voice state (index wraps at 32)
    pub fn voice_mut(&mut self, index: usize) -> &mut Voice {
        &mut self.voices[index % VOICE_COUNT]
    }

    /// Highest voice index that is mixed and polled
    pub fn active_voices(&self) -> u8 {
        self.active_voices
    }

    /// Voice addressed by the per-voice registers
    pub fn selected_voice(&self) -> u8 {
        self.selected_voice
    }

    /// Register addressed by the data ports
    pub fn selected_register(&self) -> u8 {
        self.selected_reg
    }

    /// Global voice mode
    pub fn vmode(&self) -> u8 {
        self.vmode
    }

    /// Timer interrupt pending bits
    pub fn irq_pending(&self) -> u8 {
        self.irq_pending
    }

    /// Timer interrupt enable mask
    pub fn irq_enabled(&self) -> u8 {
        self.irq_enabled
    }

    /// Interval timers
    pub fn timers(&self) -> &TimerSubsystem {
        &self.timers
    }

    /// Read from a host port
    ///
    /// Reading the data ports may acknowledge interrupts (registers 0x0F, 0x40, 0x41).
    pub fn read(&mut self, addr: u8) -> u8 {
        match Port::from_addr(addr) {
            Port::Status => self.status(),
            Port::Select => self.selected_reg,
            Port::DataLo => self.reg_read() as u8,
            Port::DataHi => (self.reg_read() >> 8) as u8,
        }
    }

    /// Write to a host port
    pub fn write(&mut self, addr: u8, data: u8) {
        match Port::from_addr(addr) {
            Port::Status => {}
            Port::Select => self.selected_reg = data,
            Port::DataLo => self.reg_write(data, Half::Lsb),
            Port::DataHi => self.reg_write(data, Half::Msb),
        }
    }

    /// Status port: only reports anything while the interrupt line is asserted
    pub fn status(&self) -> u8 {
        if !self.irq.is_asserted() {
            return 0;
        }

        let mut status = STATUS_IRQ;
        if self.irq_enabled != 0 && self.irq_pending & 0x03 != 0 {
            status |= STATUS_TIMER_IRQ;
        }
        if self.active_slice().iter().any(|v| v.osc.conf.contains(OscConf::IRQ_PENDING)) {
            status |= STATUS_OSC_IRQ;
        }
        status
    }

    fn active_slice(&self) -> &[Voice] {
        &self.voices[..=usize::from(self.active_voices)]
    }

    /// Read the selected register (16 bits)
    pub fn reg_read(&mut self) -> u16 {
        let Some(reg) = Register::from_index(self.selected_reg) else {
            trace!(target: "ics2115", "unhandled read of register {:#04x}", self.selected_reg);
            return UNMAPPED_READ;
        };

        let voice = &self.voices[usize::from(self.selected_voice)];
        match reg {
            Register::OscConfig => u16::from(voice.osc.conf.bits()) << 8,
            Register::Frequency => voice.osc.fc,
            Register::LoopStartHi => (voice.osc.start >> 16) as u16,
            Register::LoopStartLo => (voice.osc.start & 0xFF00) as u16,
            Register::LoopEndHi => (voice.osc.end >> 16) as u16,
            Register::LoopEndLo => (voice.osc.end & 0xFF00) as u16,
            Register::VolumeIncrement => u16::from(voice.vol.incr),
            Register::VolumeStart => (voice.vol.start >> (10 + 8)) as u16,
            Register::VolumeEnd => (voice.vol.end >> (10 + 8)) as u16,
            Register::VolumeAcc => (voice.vol.acc >> 10) as u16,
            Register::AddressHi => (voice.osc.acc >> 16) as u16,
            Register::AddressLo => (voice.osc.acc & 0xFFF8) as u16,
            Register::Pan => u16::from(voice.vol.pan) << 8,
            Register::VolumeControl => {
                // Reads back a fixed pattern rather than the written flags
                let value = if self.vmode == 0 && voice.vol.ctrl.contains(VolCtrl::IRQ) {
                    0x81
                } else {
                    0x01
                };
                value << 8
            }
            Register::ActiveVoices => u16::from(self.active_voices),
            Register::InterruptSource => self.acknowledge_voice_irq() << 8,
            Register::OscControl => u16::from(voice.osc.ctl) << 8,
            Register::RomBank => u16::from(voice.osc.saddr) << 8,
            Register::Timer0Preset | Register::Timer1Preset => {
                let index = reg.timer();
                let preset = self.timers.timer(index).preset();
                self.irq_pending &= !(1 << index);
                self.timers.recalc(index);
                self.recalc_irq();
                u16::from(preset)
            }
            Register::Timer1Prescale => u16::from(self.irq_pending & 0x03),
            Register::IrqEnable => u16::from(self.irq_pending),
            Register::IrqOscillator => 0x80,
            Register::Revision => REVISION,
            Register::VoiceMode | Register::Timer0Prescale | Register::VoiceSelect => {
                trace!(target: "ics2115", "unhandled read of {reg}");
                UNMAPPED_READ
            }
        }
    }

    /// Find the first active voice with a pending boundary interrupt, acknowledge it
    /// and report which condition fired. 0xFF when nothing is pending.
    fn acknowledge_voice_irq(&mut self) -> u16 {
        let Some(index) = self.active_slice().iter().position(|v| {
            v.osc.conf.contains(OscConf::IRQ_PENDING) || v.vol.ctrl.contains(VolCtrl::IRQ_PENDING)
        }) else {
            return 0xFF;
        };

        let voice = &mut self.voices[index];
        let mut source = index as u16 | 0xE0;
        if voice.osc.conf.contains(OscConf::IRQ_PENDING) {
            voice.osc.conf.remove(OscConf::IRQ_PENDING);
            source &= !0x80;
        }
        if voice.vol.ctrl.contains(VolCtrl::IRQ_PENDING) {
            voice.vol.ctrl.remove(VolCtrl::IRQ_PENDING);
            source &= !0x40;
        }
        self.recalc_irq();
        source
    }

    /// Write one byte of the selected register
    pub fn reg_write(&mut self, data: u8, half: Half) {
        let Some(reg) = Register::from_index(self.selected_reg) else {
            trace!(
                target: "ics2115",
                "unhandled write of {data:#04x} ({half:?}) to register {:#04x}",
                self.selected_reg
            );
            return;
        };

        let msb = half == Half::Msb;
        let value = u32::from(data);
        let selected = usize::from(self.selected_voice);
        let voice = &mut self.voices[selected];

        match reg {
            Register::OscConfig if msb => voice.osc.conf.apply_register(data),
            Register::Frequency => {
                voice.osc.fc = if msb {
                    (voice.osc.fc & 0x00FF) | (u16::from(data) << 8)
                } else {
                    // Bit 0 is not implemented
                    (voice.osc.fc & 0xFF00) | u16::from(data & 0xFE)
                };
            }
            Register::LoopStartHi => {
                voice.osc.start = if msb {
                    (voice.osc.start & 0x00FF_FFFF) | (value << 24)
                } else {
                    (voice.osc.start & 0xFF00_FFFF) | (value << 16)
                };
            }
            Register::LoopStartLo if msb => {
                voice.osc.start = (voice.osc.start & 0xFFFF_00FF) | (value << 8);
            }
            Register::LoopEndHi => {
                voice.osc.end = if msb {
                    (voice.osc.end & 0x00FF_FFFF) | (value << 24)
                } else {
                    (voice.osc.end & 0xFF00_FFFF) | (value << 16)
                };
            }
            Register::LoopEndLo if msb => {
                voice.osc.end = (voice.osc.end & 0xFFFF_00FF) | (value << 8);
            }
            Register::VolumeIncrement if msb => voice.vol.incr = data,
            Register::VolumeStart if !msb => voice.vol.start = value << (10 + 8),
            Register::VolumeEnd if !msb => voice.vol.end = value << (10 + 8),
            Register::VolumeAcc => {
                voice.vol.regacc = if msb {
                    (voice.vol.regacc & 0x00FF) | (u16::from(data) << 8)
                } else {
                    (voice.vol.regacc & 0xFF00) | u16::from(data)
                };
                voice.vol.acc = u32::from(voice.vol.regacc) << 10;
            }
            Register::AddressHi => {
                voice.osc.acc = if msb {
                    (voice.osc.acc & 0x00FF_FFFF) | (value << 24)
                } else {
                    (voice.osc.acc & 0xFF00_FFFF) | (value << 16)
                };
            }
            Register::AddressLo => {
                voice.osc.acc = if msb {
                    (voice.osc.acc & 0xFFFF_00FF) | (value << 8)
                } else {
                    (voice.osc.acc & 0xFFFF_FF00) | (value & 0xF8)
                };
            }
            Register::Pan if msb => voice.vol.pan = data,
            Register::VolumeControl if msb => voice.vol.ctrl.apply_register(data),
            Register::ActiveVoices if msb => self.active_voices = data & 0x1F,
            Register::OscControl if msb => {
                voice.osc.ctl = data;
                if data == 0 {
                    voice.key_on();
                    debug!(target: "ics2115", "voice {selected} key on");
                } else if data == OSC_CTL_FORCE_STOP {
                    if self.vmode == 0 {
                        voice.force_stop();
                        debug!(target: "ics2115", "voice {selected} forced stop");
                    }
                } else {
                    trace!(target: "ics2115", "voice {selected}: unhandled oscillator control {data:#04x}");
                }
            }
            Register::RomBank if msb => voice.osc.saddr = data,
            Register::VoiceMode if msb => self.vmode = data,
            Register::Timer0Preset | Register::Timer1Preset if !msb => {
                self.timers.set_preset(reg.timer(), data);
            }
            Register::Timer0Prescale | Register::Timer1Prescale if !msb => {
                self.timers.set_scale(reg.timer(), data);
            }
            Register::IrqEnable if !msb => {
                self.irq_enabled = data;
                self.recalc_irq();
            }
            Register::VoiceSelect if !msb => {
                self.selected_voice = data % (self.active_voices + 1);
            }
            _ => {
                trace!(target: "ics2115", "ignored write of {data:#04x} ({half:?}) to {reg}");
            }
        }
    }

    /// Recompute the interrupt line and notify the host on change
    pub fn recalc_irq(&mut self) {
        let level = irq::line_level(self.irq_pending, self.irq_enabled, &self.voices);
        self.irq.update(level);
    }

    /// Render `min(out_l.len(), out_r.len())` stereo samples, then advance the timers
    /// by the same amount of time.
    ///
    /// Output is 16-bit range in 32-bit containers.
    pub fn generate(&mut self, out_l: &mut [i32], out_r: &mut [i32]) {
        let samples = out_l.len().min(out_r.len());
        let out_l = &mut out_l[..samples];
        let out_r = &mut out_r[..samples];
        out_l.fill(0);
        out_r.fill(0);

        let mut irq_dirty = false;
        let active = usize::from(self.active_voices);
        for voice in &mut self.voices[..=active] {
            irq_dirty |= mixer::mix_voice(voice, &self.rom, self.vmode, out_l, out_r);
        }

        mixer::rescale(out_l);
        mixer::rescale(out_r);

        if irq_dirty {
            self.recalc_irq();
        }

        let fired = self.timers.advance_samples(samples);
        self.timers_expired(fired);
    }

    /// Advance the timers without rendering audio
    pub fn run_timers(&mut self, nanos: u64) {
        let fired = self.timers.advance_nanos(nanos);
        self.timers_expired(fired);
    }

    fn timers_expired(&mut self, mask: u8) {
        if mask == 0 {
            return;
        }
        self.irq_pending |= mask;
        self.recalc_irq();
    }

    /// Snapshot everything the host can observe
    pub fn save_state(&self) -> ChipState {
        ChipState {
            voices: self.voices,
            active_voices: self.active_voices,
            selected_voice: self.selected_voice,
            selected_register: self.selected_reg,
            irq_enabled: self.irq_enabled,
            irq_pending: self.irq_pending,
            vmode: self.vmode,
            irq_on: self.irq.is_asserted(),
            timers: self.timers.clone(),
        }
    }

    /// Restore a snapshot taken by [`Ics2115::save_state`]
    pub fn load_state(&mut self, state: &ChipState) -> Result<()> {
        state.validate()?;
        if state.timers.master_clock() != self.config.master_clock {
            return Err(Ics2115Error::StateError(format!(
                "state was saved at {} Hz, chip runs at {} Hz",
                state.timers.master_clock(),
                self.config.master_clock
            )));
        }

        self.voices = state.voices;
        self.active_voices = state.active_voices;
        self.selected_voice = state.selected_voice;
        self.selected_reg = state.selected_register;
        self.irq_enabled = state.irq_enabled;
        self.irq_pending = state.irq_pending;
        self.vmode = state.vmode;
        self.timers = state.timers.clone();
        self.irq.update(state.irq_on);
        Ok(())
    }
}

impl fmt::Debug for Ics2115 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ics2115")
            .field("active_voices", &self.active_voices)
            .field("selected_voice", &self.selected_voice)
            .field("selected_reg", &self.selected_reg)
            .field("irq_enabled", &self.irq_enabled)
            .field("irq_pending", &self.irq_pending)
            .field("vmode", &self.vmode)
            .field("irq", &self.irq)
            .field("rom_len", &self.rom.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SELECT: u8 = 1;
    const LO: u8 = 2;
    const HI: u8 = 3;

    fn chip() -> Ics2115 {
        Ics2115::new(vec![0u8; 0x100])
    }

    fn write_reg(chip: &mut Ics2115, reg: u8, port: u8, data: u8) {
        chip.write(SELECT, reg);
        chip.write(port, data);
    }

    fn select_voice(chip: &mut Ics2115, voice: u8) {
        write_reg(chip, Register::VoiceSelect.index(), LO, voice);
    }

    #[test]
    fn test_reset_state() {
        let chip = chip();
        assert_eq!(chip.active_voices(), 31);
        assert_eq!(chip.selected_voice(), 0);
        assert!(!chip.irq_line());
        assert!(!chip.timers().timer(0).is_active());
        assert!(!chip.timers().timer(1).is_active());
        assert_eq!(chip.voice(7).vol.pan, 0x7F);
    }

    #[test]
    fn test_select_port_reads_back() {
        let mut chip = chip();
        chip.write(SELECT, 0x4C);
        assert_eq!(chip.read(SELECT), 0x4C);
        assert_eq!(chip.read(LO), REVISION as u8);
        assert_eq!(chip.read(HI), 0);
    }

    #[test]
    fn test_frequency_low_bit_masked() {
        let mut chip = chip();
        write_reg(&mut chip, 0x01, LO, 0xFF);
        write_reg(&mut chip, 0x01, HI, 0x12);
        assert_eq!(chip.voice(0).osc.fc, 0x12FE);
        chip.write(SELECT, 0x01);
        assert_eq!(chip.read(LO), 0xFE);
        assert_eq!(chip.read(HI), 0x12);
    }

    #[test]
    fn test_loop_start_halves() {
        let mut chip = chip();
        write_reg(&mut chip, 0x02, HI, 0x12);
        write_reg(&mut chip, 0x02, LO, 0x34);
        write_reg(&mut chip, 0x03, HI, 0x56);
        // Low half of the low word is not wired
        write_reg(&mut chip, 0x03, LO, 0x78);
        assert_eq!(chip.voice(0).osc.start, 0x1234_5600);

        chip.write(SELECT, 0x02);
        assert_eq!(chip.reg_read(), 0x1234);
        chip.write(SELECT, 0x03);
        assert_eq!(chip.reg_read(), 0x5600);
    }

    #[test]
    fn test_address_low_bits_masked_both_ways() {
        let mut chip = chip();
        write_reg(&mut chip, 0x0B, LO, 0xFF);
        assert_eq!(chip.voice(0).osc.acc, 0xF8);
        chip.voice_mut(0).osc.acc = 0xFFFF_FFFF;
        chip.write(SELECT, 0x0B);
        assert_eq!(chip.reg_read(), 0xFFF8);
    }

    #[test]
    fn test_volume_accumulator_register() {
        let mut chip = chip();
        write_reg(&mut chip, 0x09, HI, 0xAB);
        write_reg(&mut chip, 0x09, LO, 0xCD);
        assert_eq!(chip.voice(0).vol.acc, 0xABCD << 10);
        chip.write(SELECT, 0x09);
        assert_eq!(chip.reg_read(), 0xABCD);
    }

    #[test]
    fn test_volume_start_end_lsb_only() {
        let mut chip = chip();
        write_reg(&mut chip, 0x07, LO, 0x20);
        write_reg(&mut chip, 0x07, HI, 0xFF);
        write_reg(&mut chip, 0x08, LO, 0xF0);
        assert_eq!(chip.voice(0).vol.start, 0x20 << 18);
        assert_eq!(chip.voice(0).vol.end, 0xF0 << 18);
        chip.write(SELECT, 0x08);
        assert_eq!(chip.read(LO), 0xF0);
    }

    #[test]
    fn test_configuration_write_keeps_pending() {
        let mut chip = chip();
        chip.voice_mut(0).osc.conf = OscConf::IRQ_PENDING;
        write_reg(&mut chip, 0x00, HI, OscConf::LOOP.bits() | 0x80);
        assert_eq!(chip.voice(0).osc.conf, OscConf::LOOP | OscConf::IRQ_PENDING);
        // Low half ignored
        write_reg(&mut chip, 0x00, LO, 0x00);
        assert_eq!(chip.voice(0).osc.conf, OscConf::LOOP | OscConf::IRQ_PENDING);
    }

    #[test]
    fn test_volume_control_read_pattern() {
        let mut chip = chip();
        write_reg(&mut chip, 0x0D, HI, VolCtrl::IRQ.bits());
        chip.write(SELECT, 0x0D);
        assert_eq!(chip.read(HI), 0x81);

        write_reg(&mut chip, 0x12, HI, 1);
        chip.write(SELECT, 0x0D);
        assert_eq!(chip.read(HI), 0x01);
    }

    #[test]
    fn test_key_on_every_voice() {
        let mut chip = chip();
        for v in 0..32u8 {
            select_voice(&mut chip, v);
            write_reg(&mut chip, 0x10, HI, 0x00);
            assert!(chip.voice(v.into()).on, "voice {v}");
            assert_eq!(chip.voice(v.into()).ramp, 0x40, "voice {v}");
        }
    }

    #[test]
    fn test_force_stop_respects_mode() {
        let mut chip = chip();
        select_voice(&mut chip, 3);
        write_reg(&mut chip, 0x10, HI, 0x00);
        chip.voice_mut(3).osc.conf = OscConf::empty();
        chip.voice_mut(3).vol.ctrl = VolCtrl::empty();

        write_reg(&mut chip, 0x12, HI, 1);
        write_reg(&mut chip, 0x10, HI, OSC_CTL_FORCE_STOP);
        assert!(chip.voice(3).on);
        assert!(!chip.voice(3).osc.conf.contains(OscConf::STOP));

        write_reg(&mut chip, 0x12, HI, 0);
        write_reg(&mut chip, 0x10, HI, OSC_CTL_FORCE_STOP);
        assert!(!chip.voice(3).on);
        assert!(chip.voice(3).osc.conf.contains(OscConf::STOP));
        assert!(chip.voice(3).vol.ctrl.contains(VolCtrl::STOP));
        assert_eq!(chip.voice(3).osc.ctl, OSC_CTL_FORCE_STOP);
    }

    #[test]
    fn test_voice_select_wraps() {
        let mut chip = chip();
        for k in 0..32u8 {
            write_reg(&mut chip, 0x0E, HI, k);
            assert_eq!(chip.active_voices(), k);
            for data in 0..=u8::MAX {
                select_voice(&mut chip, data);
                assert_eq!(chip.selected_voice(), data % (k + 1), "k={k} data={data}");
            }
        }
    }

    #[test]
    fn test_interrupt_source_acknowledge() {
        let mut chip = chip();
        chip.voice_mut(5).osc.conf.insert(OscConf::IRQ_PENDING);

        chip.write(SELECT, 0x0F);
        assert_eq!(chip.read(HI), 0x65);
        assert!(!chip.voice(5).osc.conf.contains(OscConf::IRQ_PENDING));
        assert_eq!(chip.read(HI), 0xFF);
    }

    #[test]
    fn test_interrupt_source_reports_both_conditions() {
        let mut chip = chip();
        chip.voice_mut(2).osc.conf.insert(OscConf::IRQ_PENDING);
        chip.voice_mut(2).vol.ctrl.insert(VolCtrl::IRQ_PENDING);
        chip.recalc_irq();
        assert!(chip.irq_line());

        chip.write(SELECT, 0x0F);
        assert_eq!(chip.read(HI), 0x22);
        assert!(!chip.irq_line());
    }

    #[test]
    fn test_interrupt_source_ignores_inactive_voices() {
        let mut chip = chip();
        write_reg(&mut chip, 0x0E, HI, 3);
        chip.voice_mut(10).vol.ctrl.insert(VolCtrl::IRQ_PENDING);
        chip.write(SELECT, 0x0F);
        assert_eq!(chip.read(HI), 0xFF);
        assert!(chip.voice(10).vol.ctrl.contains(VolCtrl::IRQ_PENDING));
    }

    #[test]
    fn test_unknown_registers() {
        let mut chip = chip();
        for reg in [0x13u8, 0x20, 0x44, 0x4E, 0xFF] {
            chip.write(SELECT, reg);
            chip.write(LO, 0x55);
            chip.write(HI, 0xAA);
            assert_eq!(chip.read(LO), 0);
            assert_eq!(chip.read(HI), 0);
        }

        let mut fresh = self::chip();
        fresh.write(SELECT, 0xFF);
        assert_eq!(chip.save_state(), fresh.save_state());
    }

    #[test]
    fn test_timer_interrupt_flow() {
        let mut chip = chip();
        write_reg(&mut chip, 0x4A, LO, 0x01);
        write_reg(&mut chip, 0x40, LO, 0x00);
        assert!(chip.timers().timer(0).is_active());

        chip.run_timers(1_000);
        assert_eq!(chip.irq_pending() & 1, 1);
        assert!(chip.irq_line());
        assert_eq!(chip.status(), STATUS_IRQ | STATUS_TIMER_IRQ);

        chip.write(SELECT, 0x43);
        assert_eq!(chip.read(LO), 0x01);

        // Reading the preset acknowledges
        chip.write(SELECT, 0x40);
        assert_eq!(chip.read(LO), 0x00);
        assert_eq!(chip.irq_pending(), 0);
        assert!(!chip.irq_line());
        assert_eq!(chip.status(), 0);
    }

    #[test]
    fn test_masked_timer_sets_pending_only() {
        let mut chip = chip();
        write_reg(&mut chip, 0x41, LO, 0x00);
        chip.run_timers(1_000);
        assert_eq!(chip.irq_pending(), 0b10);
        assert!(!chip.irq_line());
        chip.write(SELECT, 0x4A);
        assert_eq!(chip.read(LO), 0b10);
    }

    #[test]
    fn test_status_reports_oscillator_irq() {
        let mut chip = chip();
        chip.voice_mut(4).osc.conf.insert(OscConf::IRQ_PENDING);
        chip.voice_mut(4).vol.ctrl.insert(VolCtrl::IRQ_PENDING);
        chip.recalc_irq();
        assert_eq!(chip.read(0), STATUS_IRQ | STATUS_OSC_IRQ);
    }

    #[test]
    fn test_generate_triggers_irq_once_per_block() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let mut chip = chip();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        chip.set_irq_callback(Box::new(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        }));

        let voice = chip.voice_mut(0);
        voice.on = true;
        voice.osc.conf = OscConf::IRQ | OscConf::LOOP;
        voice.osc.fc = 0x100;
        voice.osc.end = 0x1000;
        voice.vol.ctrl = VolCtrl::IRQ | VolCtrl::LOOP;
        voice.vol.incr = 0x3F;
        voice.vol.end = 0x3F << 10;

        let mut left = [0i32; 16];
        let mut right = [0i32; 16];
        chip.generate(&mut left, &mut right);

        assert!(chip.irq_line());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_generate_uses_shorter_buffer() {
        let mut chip = chip();
        let mut left = [7i32; 8];
        let mut right = [7i32; 4];
        chip.generate(&mut left, &mut right);
        assert_eq!(&left[..4], &[0; 4]);
        assert_eq!(&left[4..], &[7; 4]);
    }

    #[test]
    fn test_state_round_trip() {
        let mut chip = chip();
        select_voice(&mut chip, 9);
        write_reg(&mut chip, 0x01, HI, 0x04);
        write_reg(&mut chip, 0x10, HI, 0x00);
        write_reg(&mut chip, 0x40, LO, 0x10);
        let saved = chip.save_state();

        let mut other = Ics2115::new(vec![0u8; 0x100]);
        other.load_state(&saved).unwrap();
        assert_eq!(other.save_state(), saved);
        other.write(SELECT, 0x01);
        assert_eq!(other.read(HI), 0x04);
    }

    #[test]
    fn test_state_rejects_bad_indices_and_clock() {
        let mut chip = chip();
        let mut state = chip.save_state();
        state.selected_voice = 40;
        assert!(matches!(chip.load_state(&state), Err(Ics2115Error::StateError(_))));

        let other = Ics2115::with_config(
            vec![0u8; 4],
            ChipConfig::with_master_clock(1024 * 44_100),
        )
        .unwrap();
        assert!(chip.load_state(&other.save_state()).is_err());
    }
}
