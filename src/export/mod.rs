//! Offline rendering
//!
//! Runs a chip for a fixed number of frames and post-processes the result
//! before it is written out.

pub mod wav;

pub use wav::{render_wav, render_wav_with_config};

use crate::ics2115::mixer;
use crate::ics2115::Ics2115;

/// Frames rendered per `generate` call
pub const RENDER_BLOCK: usize = 1024;

/// Export post-processing options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportConfig {
    /// Scale the peak to full range
    pub normalize: bool,
    /// Linear fade at the end, in seconds
    pub fade_out_duration: f32,
}

impl ExportConfig {
    /// Raw chip output, no post-processing
    pub fn raw() -> Self {
        ExportConfig {
            normalize: false,
            fade_out_duration: 0.0,
        }
    }

    /// Enable or disable peak normalization
    pub fn normalize(mut self, enabled: bool) -> Self {
        self.normalize = enabled;
        self
    }

    /// Set the fade-out length in seconds
    pub fn fade_out(mut self, seconds: f32) -> Self {
        self.fade_out_duration = seconds.max(0.0);
        self
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self::raw()
    }
}

/// Render `frames` stereo frames as interleaved 16-bit samples (L, R, L, R, ...)
pub fn render_interleaved(chip: &mut Ics2115, frames: usize) -> Vec<i16> {
    let mut out = Vec::with_capacity(frames * 2);
    let mut left = vec![0i32; RENDER_BLOCK];
    let mut right = vec![0i32; RENDER_BLOCK];

    let mut remaining = frames;
    while remaining > 0 {
        let block = remaining.min(RENDER_BLOCK);
        chip.generate(&mut left[..block], &mut right[..block]);
        for (&l, &r) in left[..block].iter().zip(&right[..block]) {
            out.push(mixer::to_i16(l));
            out.push(mixer::to_i16(r));
        }
        remaining -= block;
    }
    out
}

/// Scale samples so the loudest one reaches full range. Silence is left alone.
pub fn normalize_samples(samples: &mut [i16]) {
    let peak = samples
        .iter()
        .map(|s| i32::from(*s).abs())
        .max()
        .unwrap_or(0);
    if peak == 0 {
        return;
    }

    let gain = f32::from(i16::MAX) / peak as f32;
    for sample in samples.iter_mut() {
        *sample = (f32::from(*sample) * gain)
            .round()
            .clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16;
    }
}

/// Fade interleaved stereo samples linearly to silence over the last `seconds`
pub fn apply_fade_out(samples: &mut [i16], seconds: f32, sample_rate: u32) {
    let total_frames = samples.len() / 2;
    let fade_frames = ((seconds * sample_rate as f32) as usize).min(total_frames);
    if fade_frames == 0 {
        return;
    }

    let start = total_frames - fade_frames;
    for (i, frame) in samples.chunks_exact_mut(2).skip(start).enumerate() {
        let gain = 1.0 - (i + 1) as f32 / fade_frames as f32;
        for sample in frame.iter_mut() {
            *sample = (f32::from(*sample) * gain) as i16;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ExportConfig::raw().normalize(true).fade_out(-1.0);
        assert!(config.normalize);
        assert_eq!(config.fade_out_duration, 0.0);
        assert_eq!(ExportConfig::default(), ExportConfig::raw());
    }

    #[test]
    fn test_render_length_spans_blocks() {
        let mut chip = Ics2115::new(vec![0u8; 16]);
        let samples = render_interleaved(&mut chip, RENDER_BLOCK + 10);
        assert_eq!(samples.len(), (RENDER_BLOCK + 10) * 2);
    }

    #[test]
    fn test_normalize() {
        let mut samples = vec![100, -200, 50, 0];
        normalize_samples(&mut samples);
        assert_eq!(samples[1], -i16::MAX);
        assert_eq!(samples[3], 0);

        let mut silence = vec![0i16; 4];
        normalize_samples(&mut silence);
        assert_eq!(silence, vec![0; 4]);
    }

    #[test]
    fn test_fade_out_ends_silent() {
        let mut samples = vec![1000i16; 20];
        apply_fade_out(&mut samples, 1.0, 5);
        assert_eq!(&samples[..10], &[1000; 10]);
        assert_eq!(&samples[18..], &[0, 0]);
        assert!(samples[10] > samples[16]);
    }
}
