//! Procedural audio engine for the gamer RPG
//!
//! Everything the game hears is synthesized at runtime from short tone
//! descriptions: combat and UI sound effects play as fire-and-forget
//! sequences on an effects channel, and one looping background track plays on
//! a quieter music channel. No audio assets are loaded from disk.
//!
//! ```no_run
//! use gamer_audio::{AudioConfig, AudioEngine, MusicTrackId};
//!
//! let engine = AudioEngine::new(&AudioConfig::default())?;
//! engine.start_music(MusicTrackId::Exploration);
//! engine.play_dice_roll();
//! engine.play_hit();
//! # Ok::<(), gamer_audio::AudioError>(())
//! ```
//!
//! Playback never fails from the caller's point of view. A missing or broken
//! output device means silence plus a `tracing` warning, and the device is
//! retried on the next sound.

pub mod config;
pub mod effects;
pub mod engine;
pub mod error;
pub mod music;
pub mod output;
pub mod sequencer;
pub mod synth;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{AudioConfig, OutputBackend};
pub use effects::SoundEffect;
pub use engine::AudioEngine;
pub use error::{AudioError, UnknownNameError};
pub use music::{MusicTrackId, PlaybackState};
pub use output::Channel;
pub use synth::{SampleBuffer, ToneDescriptor, WaveformKind};
