//! ICS2115 Register Definitions
//!
//! Registers 0x00-0x12 address the currently selected voice, 0x40-0x4F are
//! chip-global. Every register is 16 bits wide and accessed one byte at a time
//! through the data ports; many only respond to one of the two halves.

use std::fmt;

/// Host port, decoded from the low two address bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Port {
    /// Status (read only)
    Status = 0,
    /// Register select
    Select = 1,
    /// Data, low byte
    DataLo = 2,
    /// Data, high byte
    DataHi = 3,
}

impl Port {
    /// Decode a host address; only the low two bits are wired
    pub fn from_addr(addr: u8) -> Self {
        match addr & 3 {
            0 => Port::Status,
            1 => Port::Select,
            2 => Port::DataLo,
            _ => Port::DataHi,
        }
    }
}

/// Which byte of a 16-bit register an access targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Half {
    /// Low byte (port 2)
    Lsb,
    /// High byte (port 3)
    Msb,
}

/// ICS2115 register index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    /// Oscillator configuration (flags) - 0x00
    OscConfig = 0x00,
    /// Wavesample frequency - 0x01
    Frequency = 0x01,
    /// Loop start, high word - 0x02
    LoopStartHi = 0x02,
    /// Loop start, low word - 0x03
    LoopStartLo = 0x03,
    /// Loop end, high word - 0x04
    LoopEndHi = 0x04,
    /// Loop end, low word - 0x05
    LoopEndLo = 0x05,
    /// Volume increment (range + rate) - 0x06
    VolumeIncrement = 0x06,
    /// Volume envelope start - 0x07
    VolumeStart = 0x07,
    /// Volume envelope end - 0x08
    VolumeEnd = 0x08,
    /// Volume accumulator - 0x09
    VolumeAcc = 0x09,
    /// Wavesample address, high word - 0x0A
    AddressHi = 0x0A,
    /// Wavesample address, low word - 0x0B
    AddressLo = 0x0B,
    /// Pan - 0x0C
    Pan = 0x0C,
    /// Volume envelope control (flags) - 0x0D
    VolumeControl = 0x0D,
    /// Active voice count - 0x0E
    ActiveVoices = 0x0E,
    /// Interrupt source / oscillator (read acknowledges) - 0x0F
    InterruptSource = 0x0F,
    /// Oscillator control (key on / force stop) - 0x10
    OscControl = 0x10,
    /// Wavesample static address bits 27-20 - 0x11
    RomBank = 0x11,
    /// Global voice mode - 0x12
    VoiceMode = 0x12,
    /// Timer 0 preset (read acknowledges) - 0x40
    Timer0Preset = 0x40,
    /// Timer 1 preset (read acknowledges) - 0x41
    Timer1Preset = 0x41,
    /// Timer 0 prescale - 0x42
    Timer0Prescale = 0x42,
    /// Timer 1 prescale on write, timer status on read - 0x43
    Timer1Prescale = 0x43,
    /// IRQ enable on write, IRQ pending on read - 0x4A
    IrqEnable = 0x4A,
    /// Address of interrupting oscillator - 0x4B
    IrqOscillator = 0x4B,
    /// Chip revision - 0x4C
    Revision = 0x4C,
    /// Oscillator (voice) select - 0x4F
    VoiceSelect = 0x4F,
}

impl Register {
    /// Convert a raw register index to a known register
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0x00 => Some(Register::OscConfig),
            0x01 => Some(Register::Frequency),
            0x02 => Some(Register::LoopStartHi),
            0x03 => Some(Register::LoopStartLo),
            0x04 => Some(Register::LoopEndHi),
            0x05 => Some(Register::LoopEndLo),
            0x06 => Some(Register::VolumeIncrement),
            0x07 => Some(Register::VolumeStart),
            0x08 => Some(Register::VolumeEnd),
            0x09 => Some(Register::VolumeAcc),
            0x0A => Some(Register::AddressHi),
            0x0B => Some(Register::AddressLo),
            0x0C => Some(Register::Pan),
            0x0D => Some(Register::VolumeControl),
            0x0E => Some(Register::ActiveVoices),
            0x0F => Some(Register::InterruptSource),
            0x10 => Some(Register::OscControl),
            0x11 => Some(Register::RomBank),
            0x12 => Some(Register::VoiceMode),
            0x40 => Some(Register::Timer0Preset),
            0x41 => Some(Register::Timer1Preset),
            0x42 => Some(Register::Timer0Prescale),
            0x43 => Some(Register::Timer1Prescale),
            0x4A => Some(Register::IrqEnable),
            0x4B => Some(Register::IrqOscillator),
            0x4C => Some(Register::Revision),
            0x4F => Some(Register::VoiceSelect),
            _ => None,
        }
    }

    /// Get the register index
    pub fn index(&self) -> u8 {
        *self as u8
    }

    /// Timer addressed by a timer register (bit 0 of the index)
    pub fn timer(&self) -> usize {
        (self.index() & 1) as usize
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Register::OscConfig => "Oscillator Configuration",
            Register::Frequency => "Wavesample Frequency",
            Register::LoopStartHi => "Loop Start High",
            Register::LoopStartLo => "Loop Start Low",
            Register::LoopEndHi => "Loop End High",
            Register::LoopEndLo => "Loop End Low",
            Register::VolumeIncrement => "Volume Increment",
            Register::VolumeStart => "Volume Start",
            Register::VolumeEnd => "Volume End",
            Register::VolumeAcc => "Volume Accumulator",
            Register::AddressHi => "Wavesample Address High",
            Register::AddressLo => "Wavesample Address Low",
            Register::Pan => "Pan",
            Register::VolumeControl => "Volume Envelope Control",
            Register::ActiveVoices => "Active Voices",
            Register::InterruptSource => "Interrupt Source",
            Register::OscControl => "Oscillator Control",
            Register::RomBank => "Wavesample Static Address",
            Register::VoiceMode => "Voice Mode",
            Register::Timer0Preset => "Timer 0 Preset",
            Register::Timer1Preset => "Timer 1 Preset",
            Register::Timer0Prescale => "Timer 0 Prescale",
            Register::Timer1Prescale => "Timer 1 Prescale",
            Register::IrqEnable => "IRQ Enable",
            Register::IrqOscillator => "Interrupting Oscillator",
            Register::Revision => "Chip Revision",
            Register::VoiceSelect => "Oscillator Select",
        };
        write!(f, "{:#04X} ({})", self.index(), name)
    }
}
