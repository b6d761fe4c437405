//! Error types
//!
//! Nothing in here reaches game logic: the engine boundary logs these and
//! degrades to silence. They exist so the device, config and export layers can
//! use `?` internally.

use thiserror::Error;

/// Errors raised inside the audio engine.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no audio output device available")]
    NoOutputDevice,

    #[error("failed to query output config: {0}")]
    DeviceConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("unsupported sample format: {0}")]
    UnsupportedSampleFormat(String),

    #[error("failed to build audio stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to play audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("audio output thread exited before the stream was ready")]
    OutputThreadGone,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid audio config: {0}")]
    Config(#[from] toml::de::Error),

    #[cfg(feature = "wav-export")]
    #[error("WAV export failed: {0}")]
    Wav(#[from] hound::Error),
}

/// A sound effect or music track name that doesn't match any known entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{name}'")]
pub struct UnknownNameError {
    pub kind: &'static str,
    pub name: String,
}
