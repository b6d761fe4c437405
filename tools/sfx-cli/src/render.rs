//! Render command - write an effect or a music track to a WAV file

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use clap::Args;
use gamer_audio::music::melody;
use gamer_audio::synth::{render_sequence, render_sequence_seeded, write_wav};
use gamer_audio::{AudioConfig, MusicTrackId, SoundEffect, ToneDescriptor};

/// Arguments for the render command
#[derive(Args)]
pub struct RenderArgs {
    /// Effect or track name (see `gamer-sfx list`)
    pub target: RenderTarget,

    /// Output .wav file path
    #[arg(short, long)]
    pub out: PathBuf,

    /// Passes through a music track (ignored for effects)
    #[arg(short, long, default_value_t = 1)]
    pub loops: u32,

    /// Sample rate of the file (defaults to the config's sample_rate)
    #[arg(long)]
    pub sample_rate: Option<u32>,

    /// Seed noise so repeated renders are identical
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Something that can be rendered: a sound effect or a music track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTarget {
    Effect(SoundEffect),
    Track(MusicTrackId),
}

impl RenderTarget {
    /// Tones to render, with a track repeated `loops` times
    fn tones(self, loops: u32) -> Vec<ToneDescriptor> {
        match self {
            RenderTarget::Effect(effect) => effect.tones().to_vec(),
            RenderTarget::Track(track) => melody(track).repeat(loops.max(1) as usize),
        }
    }
}

impl fmt::Display for RenderTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderTarget::Effect(effect) => write!(f, "effect {}", effect),
            RenderTarget::Track(track) => write!(f, "track {}", track),
        }
    }
}

impl FromStr for RenderTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(effect) = s.parse::<SoundEffect>() {
            return Ok(RenderTarget::Effect(effect));
        }
        if let Ok(track) = s.parse::<MusicTrackId>() {
            return Ok(RenderTarget::Track(track));
        }
        Err(format!("'{}' is neither a sound effect nor a music track", s))
    }
}

/// Execute the render command
pub fn execute(args: RenderArgs, config: &AudioConfig) -> Result<()> {
    let sample_rate = args.sample_rate.unwrap_or(config.sample_rate);
    if sample_rate == 0 {
        bail!("Sample rate must be greater than 0");
    }

    let tones = args.target.tones(args.loops);
    let buffer = match args.seed {
        Some(seed) => render_sequence_seeded(&tones, sample_rate, seed),
        None => render_sequence(&tones, sample_rate),
    };

    write_wav(&buffer, &args.out)
        .with_context(|| format!("Failed to write {}", args.out.display()))?;

    println!(
        "Rendered {} to {} ({:.2}s at {}Hz)",
        args.target,
        args.out.display(),
        buffer.duration(),
        sample_rate
    );

    Ok(())
}
