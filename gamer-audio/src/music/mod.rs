//! Background music
//!
//! The [`MusicScheduler`] loops one melody from the [track library](melody)
//! on the music channel until stopped or switched.
//!
//! ```text
//!            start(t)                    start(t')  (t' != t)
//! Stopped ───────────► Running(t) ─────────────────► Stopped ─► Running(t')
//!    ▲                   │  start(t): no-op
//!    └──── stop() ───────┘
//! ```

mod scheduler;
mod tracks;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub use scheduler::MusicScheduler;
pub use tracks::melody;

use crate::error::UnknownNameError;

/// Music tracks the game can play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MusicTrackId {
    Menu,
    Exploration,
    Combat,
}

impl MusicTrackId {
    pub const ALL: [MusicTrackId; 3] = [
        MusicTrackId::Menu,
        MusicTrackId::Exploration,
        MusicTrackId::Combat,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MusicTrackId::Menu => "menu",
            MusicTrackId::Exploration => "exploration",
            MusicTrackId::Combat => "combat",
        }
    }

    /// Length of one pass through the track's melody
    pub fn loop_duration(self) -> Duration {
        melody(self).iter().map(|t| t.duration()).sum()
    }
}

impl fmt::Display for MusicTrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MusicTrackId {
    type Err = UnknownNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        MusicTrackId::ALL
            .into_iter()
            .find(|track| track.name() == wanted)
            .ok_or_else(|| UnknownNameError {
                kind: "music track",
                name: s.to_string(),
            })
    }
}

/// What the music channel is doing.
///
/// "Not running" and "no active track" are the same state, so they can't
/// disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Running(MusicTrackId),
}

impl PlaybackState {
    pub fn is_running(self) -> bool {
        matches!(self, PlaybackState::Running(_))
    }

    pub fn active_track(self) -> Option<MusicTrackId> {
        match self {
            PlaybackState::Running(track) => Some(track),
            PlaybackState::Stopped => None,
        }
    }
}
