//! Tone to sample buffer generation

use std::f64::consts::TAU;

use rand::Rng;
use tracing::warn;

use super::envelope::apply_edge_fade;
use super::{SampleBuffer, ToneDescriptor, WaveformKind};

/// Number of frames a tone of `duration_sec` occupies at `sample_rate`.
///
/// Returns 0 for non-positive or non-finite durations.
pub fn frame_count(duration_sec: f32, sample_rate: u32) -> usize {
    if !duration_sec.is_finite() || duration_sec <= 0.0 {
        return 0;
    }
    (sample_rate as f64 * duration_sec as f64).round() as usize
}

/// Generate the buffer for one tone using the thread-local RNG for noise.
///
/// Square and sine output is fully determined by the inputs. A rest, an
/// invalid duration or a failed allocation yields an empty buffer, which
/// callers treat as "skip this tone".
pub fn generate(tone: &ToneDescriptor, sample_rate: u32) -> SampleBuffer {
    generate_with_rng(tone, sample_rate, &mut rand::rng())
}

/// Generate the buffer for one tone, drawing noise from `rng`
pub fn generate_with_rng<R: Rng>(
    tone: &ToneDescriptor,
    sample_rate: u32,
    rng: &mut R,
) -> SampleBuffer {
    if tone.is_rest() || sample_rate == 0 {
        return SampleBuffer::empty(sample_rate);
    }

    let num_frames = frame_count(tone.duration_sec, sample_rate);
    let mut samples = Vec::new();
    if let Err(e) = samples.try_reserve_exact(num_frames) {
        warn!(
            "Skipping tone: couldn't allocate {} frames ({}Hz, {}s): {}",
            num_frames, tone.frequency_hz, tone.duration_sec, e
        );
        return SampleBuffer::empty(sample_rate);
    }

    let volume = tone.volume.clamp(0.0, 1.0);
    let frequency = tone.frequency_hz as f64;
    let rate = sample_rate as f64;

    for i in 0..num_frames {
        let t = i as f64 / rate;
        let sample = match tone.waveform {
            WaveformKind::Square => {
                if (t * frequency).fract() < 0.5 {
                    volume
                } else {
                    -volume
                }
            }
            WaveformKind::Sine => volume * (TAU * frequency * t).sin() as f32,
            WaveformKind::Noise => volume * rng.random_range(-1.0f32..1.0) * 0.5,
        };
        samples.push(sample);
    }

    apply_edge_fade(&mut samples, sample_rate);
    SampleBuffer::new(sample_rate, samples)
}
