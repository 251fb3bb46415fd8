//! Wavetable sample fetch
//!
//! Addresses are 24 bits: the voice's ROM bank supplies bits 23-20, the
//! oscillator accumulator bits 19-0. Reads past the end of the supplied ROM
//! wrap around instead of faulting.

use super::constants::ROM_ADDRESS_MASK;
use super::tables;
use super::voice::{OscConf, Oscillator, Voice};

/// Fractional bits used for linear interpolation
const FRACT_BITS: u32 = 9;
const FRACT_MASK: u32 = (1 << FRACT_BITS) - 1;

/// Read one ROM byte, wrapping at the ROM size
#[inline]
pub fn rom_byte(rom: &[u8], addr: u32) -> u8 {
    if rom.is_empty() {
        0
    } else {
        rom[addr as usize % rom.len()]
    }
}

#[inline]
fn rom_word(rom: &[u8], addr: u32) -> i32 {
    let lo = i32::from(rom_byte(rom, addr));
    let hi = i32::from(rom_byte(rom, addr.wrapping_add(1)) as i8);
    lo | (hi << 8)
}

#[inline]
fn rom_signed_byte(rom: &[u8], addr: u32) -> i32 {
    i32::from(rom_byte(rom, addr) as i8) << 8
}

/// Base address of the voice's ROM bank
#[inline]
pub fn bank_base(osc: &Oscillator) -> u32 {
    (u32::from(osc.saddr) << 20) & ROM_ADDRESS_MASK
}

/// ROM address the oscillator currently points at
#[inline]
pub fn current_address(osc: &Oscillator) -> u32 {
    bank_base(osc) | (osc.acc >> 12)
}

/// Linear interpolation between two samples using accumulator bits 11-3
#[inline]
pub fn interpolate(sample1: i32, sample2: i32, acc: u32) -> i32 {
    let fract = ((acc >> 3) & FRACT_MASK) as i32;
    let diff = sample2 - sample1;
    ((sample1 << FRACT_BITS) + diff * fract) >> FRACT_BITS
}

/// Fetch one interpolated linear PCM sample (8 or 16 bit)
pub fn fetch(rom: &[u8], voice: &Voice) -> i32 {
    let osc = &voice.osc;
    let curaddr = current_address(osc);

    // Forward loops interpolate across the seam towards the loop start
    let at_seam = voice.on
        && osc.conf.contains(OscConf::LOOP)
        && !osc.conf.contains(OscConf::LOOP_BIDIR)
        && osc.left < (i32::from(osc.fc) << 2);
    let nextaddr = if at_seam {
        bank_base(osc) | (osc.start >> 12)
    } else {
        curaddr.wrapping_add(2)
    };

    let (sample1, sample2) = if osc.conf.contains(OscConf::EIGHT_BIT) {
        (
            rom_signed_byte(rom, curaddr),
            rom_signed_byte(rom, curaddr.wrapping_add(1)),
        )
    } else {
        (rom_word(rom, curaddr), rom_word(rom, nextaddr))
    };

    interpolate(sample1, sample2, osc.acc)
}

/// Fetch one µ-law sample; no interpolation
pub fn fetch_ulaw(rom: &[u8], voice: &Voice) -> i32 {
    i32::from(tables::ulaw(rom_byte(rom, current_address(&voice.osc))))
}
