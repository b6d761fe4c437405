//! Play and music commands - audition through the configured output device

use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use gamer_audio::{AudioConfig, AudioEngine, MusicTrackId, SoundEffect};
use tracing::info;

/// Silence left after an effect so the last tone isn't cut off
const TAIL: Duration = Duration::from_millis(250);

/// Arguments for the play command
#[derive(Args)]
pub struct PlayArgs {
    /// Effect name (see `gamer-sfx list`)
    pub effect: SoundEffect,

    /// Number of times to trigger it, one after another
    #[arg(short, long, default_value_t = 1)]
    pub repeat: u32,
}

/// Arguments for the music command
#[derive(Args)]
pub struct MusicArgs {
    /// Track name (see `gamer-sfx list`)
    pub track: MusicTrackId,

    /// How long to play before stopping
    #[arg(short, long, default_value_t = 10.0)]
    pub seconds: f32,
}

/// Execute the play command
pub fn play(args: PlayArgs, config: &AudioConfig) -> Result<()> {
    let engine = AudioEngine::new(config).context("Failed to start audio engine")?;
    let length = Duration::from_secs_f32(args.effect.duration_sec());

    for _ in 0..args.repeat.max(1) {
        info!("Playing {}", args.effect);
        engine.play_effect(args.effect);
        thread::sleep(length);
    }
    thread::sleep(TAIL);

    Ok(())
}

/// Execute the music command
pub fn music(args: MusicArgs, config: &AudioConfig) -> Result<()> {
    let seconds = Duration::try_from_secs_f32(args.seconds)
        .with_context(|| format!("Invalid duration: {}s", args.seconds))?;
    let engine = AudioEngine::new(config).context("Failed to start audio engine")?;

    info!("Playing {} for {:.1}s", args.track, seconds.as_secs_f32());
    engine.start_music(args.track);
    thread::sleep(seconds);
    engine.stop_music();

    Ok(())
}
