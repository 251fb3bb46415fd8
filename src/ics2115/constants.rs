//! ICS2115 Hardware Constants
//!
//! Clocks, sizes and special register values shared across the chip components.

/// Reference crystal of the WaveFront board (33.8688 MHz)
pub const DEFAULT_MASTER_CLOCK: u32 = 33_868_800;

/// Master clocks per output sample in 32-voice mode
pub const CLOCKS_PER_SAMPLE: u32 = 1024;

/// Nominal output rate (33 075 Hz at the reference clock)
pub const DEFAULT_SAMPLE_RATE: u32 = DEFAULT_MASTER_CLOCK / CLOCKS_PER_SAMPLE;

/// Number of voices on the chip
pub const VOICE_COUNT: usize = 32;

/// Number of programmable interval timers
pub const TIMER_COUNT: usize = 2;

/// Value returned by the revision register (0x4C)
pub const REVISION: u16 = 0x01;

/// Maximum anti-click ramp level
pub const RAMP_MAX: u8 = 0x40;

/// Oscillator control value that forces a voice off
pub const OSC_CTL_FORCE_STOP: u8 = 0x0F;

/// Bit width of the volume table entries
pub const VOLUME_BITS: u32 = 15;

/// Per-voice contribution shift: 15-bit volume, 16-bit sample, 5 bits of headroom for 32 voices
pub const VOICE_MIX_SHIFT: u32 = 5 + VOLUME_BITS - 16;

/// Final rescale applied to each summed output channel
pub const OUTPUT_SHIFT: u32 = 16;

/// Address window covered by one ROM bank (`saddr << 20`), 24 address lines in total
pub const ROM_ADDRESS_MASK: u32 = 0x00FF_FFFF;

/// Status port bit: interrupt line asserted
pub const STATUS_IRQ: u8 = 0x80;
/// Status port bit: some voice has an oscillator interrupt pending
pub const STATUS_OSC_IRQ: u8 = 0x02;
/// Status port bit: an enabled timer interrupt is pending
pub const STATUS_TIMER_IRQ: u8 = 0x01;
