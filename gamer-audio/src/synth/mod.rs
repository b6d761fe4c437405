//! Procedural waveform synthesis
//!
//! Every sound the game makes is built from [`ToneDescriptor`]s: a frequency,
//! a duration, a volume and a [`WaveformKind`]. [`generate`] turns one tone
//! into a mono [`SampleBuffer`] with a short linear fade at both edges so
//! buffers can be butted together without clicks.
//!
//! # Example
//! ```
//! use gamer_audio::synth::{ToneDescriptor, WaveformKind, generate};
//!
//! let tone = ToneDescriptor::new(440.0, 0.25, 0.5, WaveformKind::Sine);
//! let buffer = generate(&tone, 44_100);
//! assert_eq!(buffer.frame_count(), 11_025);
//! ```

mod envelope;
mod export;
mod generation;

use std::time::Duration;

pub use envelope::{FADE_SECONDS, apply_edge_fade, fade_frames};
pub use export::{render_sequence, render_sequence_seeded, to_pcm_i16};
pub use generation::{frame_count, generate, generate_with_rng};

#[cfg(feature = "wav-export")]
pub use export::write_wav;

/// Oscillator shape used for a tone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaveformKind {
    /// 50% duty cycle square wave - the retro "chip" voice
    Square,
    /// Pure sine wave
    Sine,
    /// Uniform white noise at half amplitude
    Noise,
}

/// A single note request: frequency, duration, volume and waveform.
///
/// A zero frequency is a rest; the sequencer and scheduler wait out its
/// duration without generating anything.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneDescriptor {
    /// Frequency in Hz (0 = rest)
    pub frequency_hz: f32,
    /// Duration in seconds
    pub duration_sec: f32,
    /// Peak amplitude, 0.0 - 1.0
    pub volume: f32,
    /// Oscillator shape
    pub waveform: WaveformKind,
}

impl ToneDescriptor {
    pub const fn new(
        frequency_hz: f32,
        duration_sec: f32,
        volume: f32,
        waveform: WaveformKind,
    ) -> Self {
        Self {
            frequency_hz,
            duration_sec,
            volume,
            waveform,
        }
    }

    /// Silence of the given duration
    pub const fn rest(duration_sec: f32) -> Self {
        Self {
            frequency_hz: 0.0,
            duration_sec,
            volume: 0.0,
            waveform: WaveformKind::Sine,
        }
    }

    /// Whether this tone is a rest (no buffer should be generated).
    ///
    /// Applies to noise too, so noise tones carry a nominal non-zero frequency.
    pub fn is_rest(&self) -> bool {
        self.frequency_hz <= 0.0
    }

    /// Wall-clock length of the tone, saturating to zero for invalid durations
    pub fn duration(&self) -> Duration {
        Duration::try_from_secs_f32(self.duration_sec.max(0.0)).unwrap_or(Duration::ZERO)
    }
}

/// Mono PCM produced by the generator
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Samples in -1.0 to 1.0 range
    pub samples: Vec<f32>,
}

impl SampleBuffer {
    pub fn new(sample_rate: u32, samples: Vec<f32>) -> Self {
        Self {
            sample_rate,
            samples,
        }
    }

    /// A zero-length buffer; what the generator hands back when it can't
    /// produce anything usable.
    pub fn empty(sample_rate: u32) -> Self {
        Self::new(sample_rate, Vec::new())
    }

    pub fn frame_count(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rest_detection() {
        assert!(ToneDescriptor::rest(0.2).is_rest());
        assert!(!ToneDescriptor::new(440.0, 0.2, 0.5, WaveformKind::Square).is_rest());
        assert!(ToneDescriptor::new(0.0, 0.1, 0.4, WaveformKind::Noise).is_rest());
        assert!(!ToneDescriptor::new(1.0, 0.1, 0.4, WaveformKind::Noise).is_rest());
    }

    #[test]
    fn test_tone_duration_saturates() {
        assert_eq!(ToneDescriptor::rest(-1.0).duration(), Duration::ZERO);
        assert_eq!(ToneDescriptor::rest(f32::NAN).duration(), Duration::ZERO);
        let d = ToneDescriptor::rest(0.25).duration();
        assert!((d.as_secs_f32() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_sample_buffer_duration() {
        let buf = SampleBuffer::new(8000, vec![0.0; 4000]);
        assert_eq!(buf.frame_count(), 4000);
        assert!((buf.duration() - 0.5).abs() < 1e-6);
        assert_eq!(SampleBuffer::empty(0).duration(), 0.0);
    }
}
