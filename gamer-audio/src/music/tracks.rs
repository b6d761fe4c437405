//! Track library: one hand-written melody per music track

use crate::synth::ToneDescriptor;
use crate::synth::WaveformKind::{Noise, Sine, Square};

use super::MusicTrackId;

const fn note(frequency_hz: f32, duration_sec: f32) -> ToneDescriptor {
    ToneDescriptor::new(frequency_hz, duration_sec, 0.3, Sine)
}

const fn lead(frequency_hz: f32, duration_sec: f32) -> ToneDescriptor {
    ToneDescriptor::new(frequency_hz, duration_sec, 0.25, Square)
}

const fn rest(duration_sec: f32) -> ToneDescriptor {
    ToneDescriptor::rest(duration_sec)
}

/// Slow A minor arpeggio for the title menu
const MENU: &[ToneDescriptor] = &[
    note(220.0, 0.5),
    note(262.0, 0.5),
    note(330.0, 0.5),
    note(440.0, 0.75),
    rest(0.25),
    note(392.0, 0.5),
    note(330.0, 0.5),
    note(294.0, 0.5),
    note(330.0, 1.0),
    rest(0.5),
    note(175.0, 0.5),
    note(220.0, 0.5),
    note(262.0, 0.5),
    note(349.0, 0.75),
    rest(0.25),
    note(330.0, 0.5),
    note(294.0, 0.5),
    note(247.0, 0.5),
    note(220.0, 1.0),
    rest(0.75),
];

/// Walking D dorian line for dungeon exploration
const EXPLORATION: &[ToneDescriptor] = &[
    note(294.0, 0.4),
    note(349.0, 0.4),
    note(440.0, 0.4),
    rest(0.4),
    note(392.0, 0.4),
    note(349.0, 0.4),
    note(330.0, 0.8),
    rest(0.4),
    note(294.0, 0.4),
    note(262.0, 0.4),
    note(294.0, 0.4),
    note(330.0, 0.4),
    note(349.0, 0.6),
    note(330.0, 0.2),
    note(294.0, 0.8),
    rest(0.8),
];

/// Driving E minor riff for combat; every note is at most 0.3s
const COMBAT: &[ToneDescriptor] = &[
    lead(330.0, 0.15),
    lead(330.0, 0.15),
    lead(392.0, 0.15),
    lead(330.0, 0.15),
    ToneDescriptor::new(1.0, 0.05, 0.2, Noise),
    rest(0.1),
    lead(494.0, 0.15),
    lead(440.0, 0.15),
    lead(392.0, 0.3),
    lead(330.0, 0.15),
    lead(330.0, 0.15),
    lead(392.0, 0.15),
    lead(440.0, 0.15),
    ToneDescriptor::new(1.0, 0.05, 0.2, Noise),
    rest(0.1),
    lead(494.0, 0.15),
    lead(523.0, 0.15),
    lead(494.0, 0.3),
    rest(0.15),
];

/// The melody looped for `track`
pub fn melody(track: MusicTrackId) -> &'static [ToneDescriptor] {
    match track {
        MusicTrackId::Menu => MENU,
        MusicTrackId::Exploration => EXPLORATION,
        MusicTrackId::Combat => COMBAT,
    }
}
