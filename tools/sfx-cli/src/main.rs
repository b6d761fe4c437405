//! gamer-sfx - audition and render the game's procedural audio
//!
//! # Commands
//!
//! - `gamer-sfx list` - List sound effects and music tracks
//! - `gamer-sfx play <effect>` - Play one sound effect on the default output
//! - `gamer-sfx music <track>` - Loop a music track for a while
//! - `gamer-sfx render <effect|track> --out file.wav` - Render to a WAV file
//!
//! # Usage
//!
//! ```bash
//! # Hear the victory jingle
//! gamer-sfx play victory
//!
//! # Loop the combat track for 20 seconds with a custom config
//! gamer-sfx --config audio.toml music combat --seconds 20
//!
//! # Render two passes of the menu theme, reproducibly
//! gamer-sfx render menu --out menu.wav --loops 2 --seed 1
//! ```

mod list;
mod play;
mod render;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gamer_audio::AudioConfig;

/// gamer-sfx - audition and render the game's procedural audio
#[derive(Parser)]
#[command(name = "gamer-sfx")]
#[command(about = "Audition and render gamer-audio effects and music")]
#[command(version)]
struct Cli {
    /// Path to an audio.toml config (defaults apply when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List sound effects and music tracks
    List,

    /// Play one sound effect
    Play(play::PlayArgs),

    /// Loop a music track
    Music(play::MusicArgs),

    /// Render an effect or track to a WAV file
    Render(render::RenderArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::List => {
            list::execute();
            Ok(())
        }
        Commands::Play(args) => play::play(args, &load_config(cli.config.as_deref())?),
        Commands::Music(args) => play::music(args, &load_config(cli.config.as_deref())?),
        Commands::Render(args) => render::execute(args, &load_config(cli.config.as_deref())?),
    }
}

/// An explicit `--config` must load; without one the defaults are used
fn load_config(path: Option<&Path>) -> Result<AudioConfig> {
    match path {
        Some(path) => AudioConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(AudioConfig::default()),
    }
}
