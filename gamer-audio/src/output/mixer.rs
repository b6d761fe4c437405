//! Channel queues and the final mix
//!
//! Rendered from inside the cpal callback, so nothing here allocates or
//! frees. Finished and cleared buffers are handed to a [`BufferSink`] and
//! released somewhere else.

use std::collections::VecDeque;

use crate::synth::SampleBuffer;

use super::Channel;

/// 17-point lookup of tanh(t) for t = 0.0..=4.0 in steps of 0.25
const TANH_LUT: [f32; 17] = [
    0.0, 0.244919, 0.462117, 0.635149, 0.761594, 0.848284, 0.905148, 0.941389, 0.964028,
    0.978034, 0.986614, 0.991815, 0.995055, 0.997109, 0.998396, 0.999198, 0.999665,
];

/// Soft clipping on the summed mix.
///
/// Values in [-1, 1] pass through unchanged; anything beyond is compressed
/// toward ±2.0 with a tanh knee.
#[inline]
pub fn soft_clip(x: f32) -> f32 {
    if x.abs() <= 1.0 {
        return x;
    }

    let pos = ((x.abs() - 1.0) * 4.0).min(16.0);
    let idx = (pos as usize).min(15);
    let frac = pos - idx as f32;
    let tanh_val = TANH_LUT[idx] * (1.0 - frac) + TANH_LUT[idx + 1] * frac;

    x.signum() * (1.0 + tanh_val)
}

/// Takes buffers the mixer is done with
pub trait BufferSink {
    fn retire(&mut self, buffer: SampleBuffer);
}

impl BufferSink for Vec<SampleBuffer> {
    fn retire(&mut self, buffer: SampleBuffer) {
        self.push(buffer);
    }
}

/// One channel's FIFO of buffers and its playhead
#[derive(Debug, Default)]
struct ChannelVoice {
    queue: VecDeque<SampleBuffer>,
    /// Playhead within the front buffer, in source frames
    position: f64,
    gain: f32,
}

impl ChannelVoice {
    /// Next output sample, advancing through the queue.
    ///
    /// Buffers at a different rate than the output are resampled with linear
    /// interpolation.
    fn next_sample(&mut self, output_rate: u32, sink: &mut impl BufferSink) -> f32 {
        loop {
            let Some(buffer) = self.queue.front() else {
                return 0.0;
            };

            let idx = self.position as usize;
            if idx >= buffer.samples.len() || buffer.sample_rate == 0 {
                if let Some(done) = self.queue.pop_front() {
                    sink.retire(done);
                }
                self.position = 0.0;
                continue;
            }

            let s1 = buffer.samples[idx];
            let s2 = buffer.samples.get(idx + 1).copied().unwrap_or(s1);
            let frac = (self.position - idx as f64) as f32;

            self.position += buffer.sample_rate as f64 / output_rate.max(1) as f64;

            return (s1 + (s2 - s1) * frac) * self.gain;
        }
    }

    fn clear(&mut self, sink: &mut impl BufferSink) {
        for buffer in self.queue.drain(..) {
            sink.retire(buffer);
        }
        self.position = 0.0;
    }
}

/// Two-channel mixer rendered by the output stream
#[derive(Debug)]
pub struct Mixer {
    voices: [ChannelVoice; 2],
    master_volume: f32,
    output_rate: u32,
    output_channels: usize,
}

impl Mixer {
    pub fn new(output_rate: u32, output_channels: usize, master_volume: f32) -> Self {
        Self {
            voices: Default::default(),
            master_volume: master_volume.clamp(0.0, 1.0),
            output_rate,
            output_channels: output_channels.max(1),
        }
    }

    /// Adopt the format the device actually opened with
    pub fn configure(&mut self, output_rate: u32, output_channels: usize) {
        self.output_rate = output_rate;
        self.output_channels = output_channels.max(1);
    }

    pub fn output_rate(&self) -> u32 {
        self.output_rate
    }

    pub fn set_gain(&mut self, channel: Channel, gain: f32) {
        self.voices[channel.index()].gain = gain.max(0.0);
    }

    pub fn push(&mut self, channel: Channel, buffer: SampleBuffer) {
        if buffer.is_empty() {
            return;
        }
        self.voices[channel.index()].queue.push_back(buffer);
    }

    /// Drop everything queued on `channel`, current buffer included
    pub fn clear(&mut self, channel: Channel, sink: &mut impl BufferSink) {
        self.voices[channel.index()].clear(sink);
    }

    /// Buffers still waiting or playing on `channel`
    pub fn queued(&self, channel: Channel) -> usize {
        self.voices[channel.index()].queue.len()
    }

    /// Fill an interleaved output slice; mono mix duplicated on every channel
    pub fn render(&mut self, out: &mut [f32], sink: &mut impl BufferSink) {
        let channels = self.output_channels;
        let rate = self.output_rate;

        for frame in out.chunks_mut(channels) {
            let mut sum = 0.0;
            for voice in &mut self.voices {
                sum += voice.next_sample(rate, sink);
            }
            let sample = soft_clip(sum * self.master_volume);
            frame.fill(sample);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixer(rate: u32, channels: usize) -> Mixer {
        let mut mixer = Mixer::new(rate, channels, 1.0);
        mixer.set_gain(Channel::Effects, 1.0);
        mixer.set_gain(Channel::Music, 1.0);
        mixer
    }

    #[test]
    fn test_soft_clip_passthrough() {
        assert_eq!(soft_clip(0.5), 0.5);
        assert_eq!(soft_clip(-1.0), -1.0);
    }

    #[test]
    fn test_soft_clip_limits() {
        let clipped = soft_clip(2.0);
        assert!(clipped > 1.0 && clipped < 2.0);
        let clipped_neg = soft_clip(-10.0);
        assert!(clipped_neg < -1.0 && clipped_neg >= -2.0);
    }

    #[test]
    fn test_silence_when_empty() {
        let mut m = mixer(8000, 2);
        let mut out = vec![1.0; 16];
        m.render(&mut out, &mut Vec::<SampleBuffer>::new());
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_buffers_play_back_to_back() {
        let mut m = mixer(8000, 1);
        m.push(Channel::Effects, SampleBuffer::new(8000, vec![0.1, 0.2]));
        m.push(Channel::Effects, SampleBuffer::new(8000, vec![0.3]));

        let mut out = vec![0.0; 4];
        let mut retired: Vec<SampleBuffer> = Vec::new();
        m.render(&mut out, &mut retired);
        assert_eq!(out, vec![0.1, 0.2, 0.3, 0.0]);
        assert_eq!(m.queued(Channel::Effects), 0);
        // Finished buffers leave through the sink in play order
        assert_eq!(
            retired,
            vec![
                SampleBuffer::new(8000, vec![0.1, 0.2]),
                SampleBuffer::new(8000, vec![0.3])
            ]
        );
    }

    #[test]
    fn test_channels_sum_with_gain() {
        let mut m = mixer(8000, 1);
        m.set_gain(Channel::Music, 0.5);
        m.push(Channel::Effects, SampleBuffer::new(8000, vec![0.25; 4]));
        m.push(Channel::Music, SampleBuffer::new(8000, vec![0.5; 4]));

        let mut out = vec![0.0; 4];
        m.render(&mut out, &mut Vec::<SampleBuffer>::new());
        assert!(out.iter().all(|&s| (s - 0.5).abs() < 1e-6));
    }

    #[test]
    fn test_interleaved_channels_duplicated() {
        let mut m = mixer(8000, 2);
        m.push(Channel::Effects, SampleBuffer::new(8000, vec![0.5, -0.5]));

        let mut out = vec![0.0; 4];
        m.render(&mut out, &mut Vec::<SampleBuffer>::new());
        assert_eq!(out, vec![0.5, 0.5, -0.5, -0.5]);
    }

    #[test]
    fn test_clear_only_affects_one_channel() {
        let mut m = mixer(8000, 1);
        m.push(Channel::Effects, SampleBuffer::new(8000, vec![0.25; 8]));
        m.push(Channel::Music, SampleBuffer::new(8000, vec![0.5; 8]));

        let mut out = vec![0.0; 2];
        let mut retired: Vec<SampleBuffer> = Vec::new();
        m.render(&mut out, &mut retired);
        m.clear(Channel::Music, &mut retired);
        assert_eq!(m.queued(Channel::Music), 0);
        assert_eq!(m.queued(Channel::Effects), 1);
        assert_eq!(retired, vec![SampleBuffer::new(8000, vec![0.5; 8])]);

        m.render(&mut out, &mut Vec::<SampleBuffer>::new());
        assert!(out.iter().all(|&s| (s - 0.25).abs() < 1e-6));
    }

    #[test]
    fn test_resamples_lower_rate_buffer() {
        // 4kHz buffer on an 8kHz output: each source frame lasts two output frames
        let mut m = mixer(8000, 1);
        m.push(Channel::Effects, SampleBuffer::new(4000, vec![0.0, 0.5, 0.5]));

        let mut out = vec![0.0; 6];
        m.render(&mut out, &mut Vec::<SampleBuffer>::new());
        assert!((out[0] - 0.0).abs() < 1e-6);
        assert!((out[1] - 0.25).abs() < 1e-6);
        assert!((out[2] - 0.5).abs() < 1e-6);
        assert!((out[4] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_master_volume_scales_mix() {
        let mut m = Mixer::new(8000, 1, 0.5);
        m.set_gain(Channel::Effects, 1.0);
        m.push(Channel::Effects, SampleBuffer::new(8000, vec![0.8]));

        let mut out = vec![0.0; 1];
        m.render(&mut out, &mut Vec::<SampleBuffer>::new());
        assert!((out[0] - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_empty_buffers_not_queued() {
        let mut m = mixer(8000, 1);
        m.push(Channel::Music, SampleBuffer::empty(8000));
        assert_eq!(m.queued(Channel::Music), 0);
    }
}
