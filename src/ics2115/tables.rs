//! Lookup tables computed at compile time
//!
//! - 4096-entry logarithmic volume curve (8-bit mantissa, 4-bit exponent)
//! - 256-entry µ-law decoder per MIL-STD-188-113

use super::constants::VOLUME_BITS;

/// Number of volume table entries (12-bit index)
pub const VOLUME_TABLE_LEN: usize = 4096;

/// Logarithmic volume to linear amplitude (15-bit)
pub static VOLUME_TABLE: [u16; VOLUME_TABLE_LEN] = build_volume_table();

/// µ-law byte to signed 16-bit sample
pub static ULAW_TABLE: [i16; 256] = build_ulaw_table();

const fn build_volume_table() -> [u16; VOLUME_TABLE_LEN] {
    let mut table = [0u16; VOLUME_TABLE_LEN];
    let mut i = 0;
    while i < VOLUME_TABLE_LEN {
        let mantissa = (0x100 | (i & 0xFF)) as u32;
        let exponent = (i >> 8) as u32;
        table[i] = ((mantissa << (VOLUME_BITS - 9)) >> (15 - exponent)) as u16;
        i += 1;
    }
    table
}

const fn build_ulaw_table() -> [i16; 256] {
    // Segment base values, shifted up 2 bits for 16-bit range
    const LUT_INITIAL: u16 = 33 << 2;
    let mut lut = [0u16; 8];
    let mut e = 0;
    while e < 8 {
        lut[e] = (LUT_INITIAL << e) - LUT_INITIAL;
        e += 1;
    }

    let mut table = [0i16; 256];
    let mut i = 0;
    while i < 256 {
        let byte = i as u8;
        let exponent = ((!byte >> 4) & 0x07) as usize;
        let mantissa = (!byte & 0x0F) as u16;
        let value = (lut[exponent] + (mantissa << (exponent + 3))) as i16;
        table[i] = if byte & 0x80 != 0 { -value } else { value };
        i += 1;
    }
    table
}

/// Linear amplitude for a 12-bit volume index
#[inline]
pub fn volume(index: usize) -> u16 {
    VOLUME_TABLE[index & (VOLUME_TABLE_LEN - 1)]
}

/// Decode one µ-law byte
#[inline]
pub fn ulaw(byte: u8) -> i16 {
    ULAW_TABLE[byte as usize]
}
