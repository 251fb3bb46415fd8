//! WAV file export

use std::path::Path;

use log::debug;

use super::{apply_fade_out, normalize_samples, render_interleaved, ExportConfig};
use crate::ics2115::Ics2115;
use crate::{Ics2115Error, Result};

/// Render `frames` stereo frames from the chip into a 16-bit WAV file
///
/// The file runs at the chip's native sample rate.
///
/// # Examples
///
/// ```no_run
/// use ics2115::{render_wav, Ics2115};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let rom = std::fs::read("wavetable.bin")?;
/// let mut chip = Ics2115::new(rom);
/// render_wav(&mut chip, "output.wav", 33_075)?;
/// # Ok(())
/// # }
/// ```
pub fn render_wav<P: AsRef<Path>>(chip: &mut Ics2115, output_path: P, frames: usize) -> Result<()> {
    render_wav_with_config(chip, output_path, frames, ExportConfig::default())
}

/// Render to a WAV file with post-processing
pub fn render_wav_with_config<P: AsRef<Path>>(
    chip: &mut Ics2115,
    output_path: P,
    frames: usize,
    config: ExportConfig,
) -> Result<()> {
    let sample_rate = chip.sample_rate();
    debug!(
        target: "ics2115::export",
        "rendering {frames} frames ({:.1}s)",
        frames as f32 / sample_rate as f32
    );
    let mut samples = render_interleaved(chip, frames);

    if config.normalize {
        normalize_samples(&mut samples);
    }
    if config.fade_out_duration > 0.0 {
        apply_fade_out(&mut samples, config.fade_out_duration, sample_rate);
    }

    debug!(target: "ics2115::export", "writing {}", output_path.as_ref().display());
    write_wav_file(output_path.as_ref(), &samples, sample_rate)
}

/// Write interleaved stereo samples to a WAV file
fn write_wav_file(path: &Path, samples: &[i16], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .map_err(|e| Ics2115Error::AudioFileError(format!("Failed to create WAV file: {}", e)))?;

    for &sample in samples {
        writer
            .write_sample(sample)
            .map_err(|e| Ics2115Error::AudioFileError(format!("Failed to write sample: {}", e)))?;
    }

    writer
        .finalize()
        .map_err(|e| Ics2115Error::AudioFileError(format!("Failed to finalize WAV file: {}", e)))?;

    Ok(())
}
