//! Offline rendering and WAV export
//!
//! Renders a tone sequence the way the sequencer would play it (each tone
//! starts where the previous one's duration ends) into one buffer, for
//! auditioning outside the game.

#[cfg(feature = "wav-export")]
use std::path::Path;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::generation::{frame_count, generate_with_rng};
use super::{SampleBuffer, ToneDescriptor};

/// Convert f32 samples (-1.0 to 1.0) to 16-bit PCM
pub fn to_pcm_i16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
        .collect()
}

/// Render a tone sequence into a single buffer.
///
/// Rests become silence. Each tone occupies exactly
/// `frame_count(duration)` frames, so the result is as long as the sum of
/// the tone durations.
pub fn render_sequence(tones: &[ToneDescriptor], sample_rate: u32) -> SampleBuffer {
    render_sequence_with_rng(tones, sample_rate, &mut rand::rng())
}

/// [`render_sequence`] with noise drawn from a PCG stream seeded by `seed`,
/// so the same seed renders the same file
pub fn render_sequence_seeded(tones: &[ToneDescriptor], sample_rate: u32, seed: u64) -> SampleBuffer {
    render_sequence_with_rng(tones, sample_rate, &mut Pcg32::seed_from_u64(seed))
}

fn render_sequence_with_rng<R: Rng>(
    tones: &[ToneDescriptor],
    sample_rate: u32,
    rng: &mut R,
) -> SampleBuffer {
    let total: usize = tones
        .iter()
        .map(|t| frame_count(t.duration_sec, sample_rate))
        .sum();
    let mut samples = Vec::with_capacity(total);

    for tone in tones {
        let slot = frame_count(tone.duration_sec, sample_rate);
        let buffer = generate_with_rng(tone, sample_rate, rng);
        let start = samples.len();
        samples.extend_from_slice(&buffer.samples[..buffer.frame_count().min(slot)]);
        samples.resize(start + slot, 0.0);
    }

    SampleBuffer::new(sample_rate, samples)
}

/// Write a buffer to a 16-bit mono WAV file.
///
/// Requires the `wav-export` feature.
#[cfg(feature = "wav-export")]
pub fn write_wav(buffer: &SampleBuffer, path: &Path) -> Result<(), crate::AudioError> {
    use hound::{SampleFormat, WavSpec, WavWriter};

    let spec = WavSpec {
        channels: 1,
        sample_rate: buffer.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    for sample in to_pcm_i16(&buffer.samples) {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::{WaveformKind, generate};

    #[test]
    fn test_to_pcm_i16() {
        let pcm = to_pcm_i16(&[0.0, 0.5, 1.0, -1.0, 2.0]);
        assert_eq!(pcm[0], 0);
        assert!(pcm[1] > 0);
        assert_eq!(pcm[2], i16::MAX);
        assert_eq!(pcm[3], -i16::MAX);
        assert_eq!(pcm[4], i16::MAX);
    }

    #[test]
    fn test_render_sequence_length_includes_rests() {
        let tones = [
            ToneDescriptor::new(440.0, 0.1, 0.5, WaveformKind::Square),
            ToneDescriptor::rest(0.05),
            ToneDescriptor::new(660.0, 0.1, 0.5, WaveformKind::Sine),
        ];
        let buf = render_sequence(&tones, 8000);
        assert_eq!(buf.frame_count(), 800 + 400 + 800);
        assert!(buf.samples[800..1200].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_render_sequence_matches_generated_tone() {
        let tone = ToneDescriptor::new(523.0, 0.12, 0.3, WaveformKind::Square);
        let buf = render_sequence(&[tone], 8000);
        assert_eq!(buf, generate(&tone, 8000));
    }

    #[test]
    fn test_seeded_render_is_reproducible() {
        let tones = [
            ToneDescriptor::new(1.0, 0.05, 0.5, WaveformKind::Noise),
            ToneDescriptor::new(220.0, 0.05, 0.3, WaveformKind::Square),
        ];
        let a = render_sequence_seeded(&tones, 8000, 7);
        let b = render_sequence_seeded(&tones, 8000, 7);
        let c = render_sequence_seeded(&tones, 8000, 8);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[cfg(feature = "wav-export")]
    #[test]
    fn test_write_wav_roundtrip_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let tone = ToneDescriptor::new(440.0, 0.1, 0.5, WaveformKind::Sine);
        write_wav(&generate(&tone, 8000), &path).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 8000);
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.len(), 800);
    }
}
