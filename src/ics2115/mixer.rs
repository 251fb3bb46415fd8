//! ICS2115 Output Mixer
//!
//! Sums every active voice into a pair of 32-bit stereo accumulators, then
//! rescales them to 16-bit range once the whole block has been mixed.
//!
//! All voices contribute to the sum even when they are not running: whatever
//! sample a stopped voice points at is still heard, scaled by its ramp. Only a
//! non-zero global voice mode skips non-playing voices.

use super::constants::{OUTPUT_SHIFT, VOICE_MIX_SHIFT};
use super::sample;
use super::tables;
use super::voice::{OscConf, Voice};

/// Linear output level of a voice: envelope position scaled by the ramp
#[inline]
pub fn voice_level(voice: &Voice) -> i32 {
    let volacc = (voice.vol.acc >> 10) & 0xFFFF;
    (i32::from(tables::volume((volacc >> 4) as usize)) * i32::from(voice.ramp)) >> 6
}

/// Mix one voice over the whole block, advancing its state per sample.
///
/// Returns true if an oscillator or envelope boundary raised an interrupt.
pub fn mix_voice(
    voice: &mut Voice,
    rom: &[u8],
    vmode: u8,
    out_l: &mut [i32],
    out_r: &mut [i32],
) -> bool {
    let mut irq_dirty = false;
    voice.refresh_volume_increment();

    for (left, right) in out_l.iter_mut().zip(out_r.iter_mut()) {
        let level = voice_level(voice);
        // Pan is stored but not applied; both sides get the same level
        let (level_l, level_r) = (level, level);

        let sample = if voice.osc.conf.contains(OscConf::ULAW) {
            sample::fetch_ulaw(rom, voice)
        } else {
            sample::fetch(rom, voice)
        };

        if vmode == 0 || voice.playing() {
            *left = left.wrapping_add((sample * level_l) >> VOICE_MIX_SHIFT);
            *right = right.wrapping_add((sample * level_r) >> VOICE_MIX_SHIFT);
        }

        voice.update_ramp();
        if voice.playing() {
            irq_dirty |= voice.update_oscillator();
            irq_dirty |= voice.update_volume_envelope();
        }
    }

    irq_dirty
}

/// Scale summed accumulators down to 16-bit range
pub fn rescale(samples: &mut [i32]) {
    for sample in samples.iter_mut() {
        *sample >>= OUTPUT_SHIFT;
    }
}

/// Convert a rescaled output sample to 16 bits, saturating
#[inline]
pub fn to_i16(sample: i32) -> i16 {
    sample.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}

/// Convert a rescaled output sample to a normalized float in [-1.0, 1.0]
#[inline]
pub fn to_f32(sample: i32) -> f32 {
    f32::from(to_i16(sample)) / 32768.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ics2115::constants::RAMP_MAX;
    use crate::ics2115::voice::VolCtrl;
    use approx::assert_abs_diff_eq;

    /// Voice parked on a constant 16-bit sample at full volume
    fn steady_voice() -> Voice {
        let mut voice = Voice::default();
        voice.on = true;
        voice.ramp = RAMP_MAX;
        voice.osc.end = 0x1000_0000;
        voice.vol.acc = 0xFFFF << 10;
        voice.vol.ctrl = VolCtrl::STOP;
        voice
    }

    #[test]
    fn test_voice_level_full_scale() {
        let voice = steady_voice();
        assert_eq!(voice_level(&voice), 0x7FC0);

        let mut quiet = voice;
        quiet.ramp = 0;
        assert_eq!(voice_level(&quiet), 0);
    }

    #[test]
    fn test_mix_constant_sample() {
        let rom = [0x00, 0x10, 0x00, 0x10];
        let mut voice = steady_voice();
        let mut left = [0i32; 4];
        let mut right = [0i32; 4];

        assert!(!mix_voice(&mut voice, &rom, 0, &mut left, &mut right));
        let expected = (0x1000 * 0x7FC0) >> VOICE_MIX_SHIFT;
        assert_eq!(left, [expected; 4]);
        assert_eq!(left, right);

        rescale(&mut left);
        assert_eq!(left[0], expected >> OUTPUT_SHIFT);
    }

    #[test]
    fn test_stopped_voice_still_sums_in_mode_zero() {
        let rom = [0x00, 0x10];
        let mut voice = steady_voice();
        voice.on = false;
        let mut left = [0i32; 1];
        let mut right = [0i32; 1];

        mix_voice(&mut voice, &rom, 0, &mut left, &mut right);
        assert_ne!(left[0], 0);

        let mut voice = steady_voice();
        voice.on = false;
        let mut left = [0i32; 1];
        let mut right = [0i32; 1];
        mix_voice(&mut voice, &rom, 1, &mut left, &mut right);
        assert_eq!(left[0], 0);
    }

    #[test]
    fn test_release_ramp_fades_out() {
        let rom = [0x00, 0x10];
        let mut voice = steady_voice();
        voice.on = false;
        let mut left = [0i32; 0x48];
        let mut right = [0i32; 0x48];
        mix_voice(&mut voice, &rom, 0, &mut left, &mut right);

        assert!(left.windows(2).all(|w| w[1] <= w[0]));
        assert_eq!(left[0x47], 0);
        assert_eq!(voice.ramp, 0);
    }

    #[test]
    fn test_boundary_marks_irq_dirty() {
        let rom = [0u8; 4];
        let mut voice = steady_voice();
        voice.osc.fc = 0x100;
        voice.osc.end = 0x800;
        voice.osc.conf = OscConf::IRQ;
        let mut left = [0i32; 4];
        let mut right = [0i32; 4];
        assert!(mix_voice(&mut voice, &rom, 0, &mut left, &mut right));
        assert!(voice.osc.conf.contains(OscConf::IRQ_PENDING));
    }

    #[test]
    fn test_float_conversion() {
        assert_abs_diff_eq!(to_f32(16384), 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(to_f32(-40000), -1.0, epsilon = 1e-6);
        assert_eq!(to_i16(40000), i16::MAX);
    }
}
