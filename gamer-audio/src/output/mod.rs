//! Audio output graph
//!
//! Two logical channels, effects and music, feed one output mix:
//!
//! ```text
//! EffectSequencer ──► [Effects ×1.0] ──┐
//!                                      ├──► [× master] ──► soft clip ──► device
//! MusicScheduler  ──► [Music   ×0.4] ──┘
//! ```
//!
//! Each channel is a FIFO of [`SampleBuffer`]s played back to back. Both
//! producers submit through the shared [`OutputGraph`] from any thread.

mod cpal_device;
mod graph;
mod link;
mod mixer;
mod null;

pub use cpal_device::CpalDevice;
pub use graph::OutputGraph;
pub use link::{MixerCommand, MixerEndpoint, MixerLink, mixer_link};
pub use mixer::{BufferSink, Mixer, soft_clip};
pub use null::NullDevice;

use crate::error::AudioError;
use crate::synth::SampleBuffer;

/// Gain of the effects bus in the output mix
pub const EFFECTS_BUS_GAIN: f32 = 1.0;

/// Gain of the music bus; music sits under the effects
pub const MUSIC_BUS_GAIN: f32 = 0.4;

/// Independent playback lane on the shared mix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Effects,
    Music,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Effects, Channel::Music];

    /// Fixed mix gain of this channel's bus
    pub fn bus_gain(self) -> f32 {
        match self {
            Channel::Effects => EFFECTS_BUS_GAIN,
            Channel::Music => MUSIC_BUS_GAIN,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Channel::Effects => 0,
            Channel::Music => 1,
        }
    }
}

/// The platform output primitive the graph drives.
///
/// Shared between threads, so implementations synchronize internally. A
/// `start` may block for as long as the host takes to open a stream;
/// `schedule`, `halt` and `is_running` must not wait on it.
pub trait AudioDevice: Send + Sync {
    /// Route `channel` into the output mix at `gain`
    fn connect(&self, channel: Channel, gain: f32);

    /// Open and start the output. Must be a no-op when already running.
    fn start(&self) -> Result<(), AudioError>;

    /// Stop the output and drop anything queued
    fn stop(&self);

    fn is_running(&self) -> bool;

    /// Append a buffer to the channel's playback queue
    fn schedule(&self, channel: Channel, buffer: SampleBuffer);

    /// Drop the channel's current and queued buffers
    fn halt(&self, channel: Channel);

    /// Rate buffers should be generated at
    fn sample_rate(&self) -> u32;
}
