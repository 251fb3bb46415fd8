//! ICS2115 command-line renderer
//!
//! Loads a wavetable ROM, plays it back on voice 0 through the chip's register
//! interface and writes the result to a WAV file.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context};

use ics2115::export::ExportConfig;
use ics2115::ics2115::voice::{OscConf, VolCtrl};
use ics2115::ics2115::Register;
use ics2115::{render_wav_with_config, ChipConfig, Ics2115};

const PORT_SELECT: u8 = 1;
const PORT_DATA_LO: u8 = 2;
const PORT_DATA_HI: u8 = 3;

/// Native playback rate for 16-bit samples: one word per output sample
const DEFAULT_FREQUENCY: u16 = 0x0800;
const DEFAULT_SECONDS: f32 = 5.0;
/// Largest loop end the 20-bit oscillator address can express
const MAX_LOOP_BYTES: usize = 0x000F_FFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SampleFormat {
    Pcm16,
    Pcm8,
    Ulaw,
}

impl FromStr for SampleFormat {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> anyhow::Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "16" | "pcm16" => Ok(SampleFormat::Pcm16),
            "8" | "pcm8" => Ok(SampleFormat::Pcm8),
            "ulaw" | "u-law" => Ok(SampleFormat::Ulaw),
            _ => bail!("unknown sample format: {value}"),
        }
    }
}

impl SampleFormat {
    fn conf(self) -> OscConf {
        match self {
            SampleFormat::Pcm16 => OscConf::empty(),
            SampleFormat::Pcm8 => OscConf::EIGHT_BIT,
            SampleFormat::Ulaw => OscConf::ULAW,
        }
    }
}

struct Options {
    rom: PathBuf,
    output: PathBuf,
    seconds: f32,
    frequency: u16,
    format: SampleFormat,
    looped: bool,
    config: ChipConfig,
    export: ExportConfig,
}

const USAGE: &str = "Usage:\n  ics2115 [options] <rom.bin>\n\nOptions:\n  -o, --output <file>    Output WAV (default: <rom>.wav)\n  -s, --seconds <n>      Length to render (default 5)\n  -f, --freq <value>     Oscillator frequency register, hex with 0x prefix (default 0x0800)\n  --format <16|8|ulaw>   Sample format of the ROM (default 16)\n  --no-loop              Play the ROM once instead of looping\n  --config <file.json>   Board configuration (master clock)\n  --normalize            Scale peak to full range\n  --fade <seconds>       Fade out at the end\n  -h, --help             Show this help\n";

fn parse_u16(value: &str) -> Option<u16> {
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}

fn parse_args() -> anyhow::Result<Option<Options>> {
    let mut rom: Option<PathBuf> = None;
    let mut output: Option<PathBuf> = None;
    let mut seconds = DEFAULT_SECONDS;
    let mut frequency = DEFAULT_FREQUENCY;
    let mut format = SampleFormat::Pcm16;
    let mut looped = true;
    let mut config = ChipConfig::default();
    let mut export = ExportConfig::default();

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        let mut value = |flag: &str| {
            args.next()
                .with_context(|| format!("{flag} requires an argument"))
        };
        match arg.as_str() {
            "--help" | "-h" => return Ok(None),
            "--output" | "-o" => output = Some(PathBuf::from(value(&arg)?)),
            "--seconds" | "-s" => {
                let raw = value(&arg)?;
                seconds = raw
                    .parse()
                    .with_context(|| format!("invalid length: {raw}"))?;
            }
            "--freq" | "-f" => {
                let raw = value(&arg)?;
                frequency = parse_u16(&raw).with_context(|| format!("invalid frequency: {raw}"))?;
            }
            "--format" => {
                format = value(&arg)?.parse()?;
            }
            "--no-loop" => looped = false,
            "--config" => {
                let path = value(&arg)?;
                let json = fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {path}"))?;
                config = ChipConfig::from_json(&json)?;
            }
            "--normalize" => export = export.normalize(true),
            "--fade" => {
                let raw = value(&arg)?;
                let fade: f32 = raw
                    .parse()
                    .with_context(|| format!("invalid fade length: {raw}"))?;
                export = export.fade_out(fade);
            }
            _ if arg.starts_with('-') => bail!("unknown flag: {arg}"),
            _ => rom = Some(PathBuf::from(arg)),
        }
    }

    let Some(rom) = rom else {
        return Ok(None);
    };
    if !seconds.is_finite() || seconds <= 0.0 {
        bail!("length must be positive");
    }
    let output = output.unwrap_or_else(|| rom.with_extension("wav"));

    Ok(Some(Options {
        rom,
        output,
        seconds,
        frequency,
        format,
        looped,
        config,
        export,
    }))
}

fn write_reg(chip: &mut Ics2115, reg: Register, lo: Option<u8>, hi: Option<u8>) {
    chip.write(PORT_SELECT, reg.index());
    if let Some(lo) = lo {
        chip.write(PORT_DATA_LO, lo);
    }
    if let Some(hi) = hi {
        chip.write(PORT_DATA_HI, hi);
    }
}

fn write_word(chip: &mut Ics2115, reg: Register, value: u16) {
    let [lo, hi] = value.to_le_bytes();
    write_reg(chip, reg, Some(lo), Some(hi));
}

/// Program voice 0 to play the whole ROM at full volume and key it on
fn program_voice(chip: &mut Ics2115, options: &Options, rom_len: usize) {
    // Only voice 0 is mixed
    write_reg(chip, Register::ActiveVoices, None, Some(0));
    write_reg(chip, Register::VoiceSelect, Some(0), None);

    let mut conf = options.format.conf();
    if options.looped {
        conf |= OscConf::LOOP;
    }
    write_reg(chip, Register::OscConfig, None, Some(conf.bits()));
    write_word(chip, Register::Frequency, options.frequency);

    // Byte addresses sit above 12 fractional bits
    let end = (rom_len.min(MAX_LOOP_BYTES) as u32) << 12;
    write_word(chip, Register::LoopStartHi, 0);
    write_word(chip, Register::LoopStartLo, 0);
    write_word(chip, Register::LoopEndHi, (end >> 16) as u16);
    write_word(chip, Register::LoopEndLo, (end & 0xFF00) as u16);
    write_word(chip, Register::AddressHi, 0);
    write_word(chip, Register::AddressLo, 0);

    // Hold the envelope at full level
    write_word(chip, Register::VolumeAcc, 0xFFFF);
    write_reg(chip, Register::VolumeControl, None, Some(VolCtrl::STOP.bits()));
    write_reg(chip, Register::Pan, None, Some(0x7F));

    write_reg(chip, Register::OscControl, None, Some(0x00));
}

fn run() -> anyhow::Result<()> {
    let Some(options) = parse_args()? else {
        eprint!("{USAGE}");
        return Ok(());
    };

    let rom = fs::read(&options.rom)
        .with_context(|| format!("failed to read ROM {}", options.rom.display()))?;
    if rom.is_empty() {
        bail!("ROM {} is empty", options.rom.display());
    }
    let rom_len = rom.len();

    let mut chip = Ics2115::with_config(rom, options.config)?;
    program_voice(&mut chip, &options, rom_len);

    let frames = (options.seconds * chip.sample_rate() as f32) as usize;
    println!(
        "Rendering {} ({} bytes, {:?}) at {} Hz, frequency {:#06x}",
        options.rom.display(),
        rom_len,
        options.format,
        chip.sample_rate(),
        options.frequency
    );
    render_wav_with_config(&mut chip, &options.output, frames, options.export)?;
    println!("Wrote {} frames to {}", frames, options.output.display());
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
