//! Sound effect tone tables
//!
//! Each combat/UI event maps to one fixed tone sequence. Noise tones carry a
//! nominal 1Hz frequency; only a zero frequency marks a rest.

use std::fmt;
use std::str::FromStr;

use crate::error::UnknownNameError;
use crate::synth::ToneDescriptor;
use crate::synth::WaveformKind::{Noise, Sine, Square};

/// Game events that have a sound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEffect {
    Hit,
    Critical,
    Miss,
    MonsterAttack,
    BattleStart,
    Victory,
    Defeat,
    Save,
    Heal,
    DiceRoll,
}

const HIT: &[ToneDescriptor] = &[
    ToneDescriptor::new(1.0, 0.05, 0.5, Noise),
    ToneDescriptor::new(220.0, 0.08, 0.3, Square),
];

const CRITICAL: &[ToneDescriptor] = &[
    ToneDescriptor::new(880.0, 0.06, 0.3, Square),
    ToneDescriptor::new(1320.0, 0.06, 0.3, Square),
    ToneDescriptor::new(1.0, 0.08, 0.6, Noise),
    ToneDescriptor::new(1760.0, 0.12, 0.25, Square),
];

const MISS: &[ToneDescriptor] = &[
    ToneDescriptor::new(400.0, 0.1, 0.25, Sine),
    ToneDescriptor::new(300.0, 0.15, 0.2, Sine),
];

const MONSTER_ATTACK: &[ToneDescriptor] = &[
    ToneDescriptor::new(110.0, 0.15, 0.35, Square),
    ToneDescriptor::new(1.0, 0.12, 0.45, Noise),
    ToneDescriptor::new(82.0, 0.2, 0.3, Square),
];

const BATTLE_START: &[ToneDescriptor] = &[
    ToneDescriptor::new(330.0, 0.1, 0.3, Square),
    ToneDescriptor::new(440.0, 0.1, 0.3, Square),
    ToneDescriptor::new(330.0, 0.1, 0.3, Square),
    ToneDescriptor::new(523.0, 0.2, 0.35, Square),
];

const VICTORY: &[ToneDescriptor] = &[
    ToneDescriptor::new(523.0, 0.12, 0.3, Square),
    ToneDescriptor::new(587.0, 0.12, 0.3, Square),
    ToneDescriptor::new(659.0, 0.12, 0.3, Square),
    ToneDescriptor::new(784.0, 0.15, 0.3, Square),
    ToneDescriptor::new(1047.0, 0.25, 0.35, Square),
];

const DEFEAT: &[ToneDescriptor] = &[
    ToneDescriptor::new(392.0, 0.2, 0.3, Sine),
    ToneDescriptor::new(349.0, 0.2, 0.3, Sine),
    ToneDescriptor::new(311.0, 0.25, 0.3, Sine),
    ToneDescriptor::new(262.0, 0.4, 0.3, Sine),
];

const SAVE: &[ToneDescriptor] = &[
    ToneDescriptor::new(660.0, 0.08, 0.25, Sine),
    ToneDescriptor::new(880.0, 0.12, 0.25, Sine),
];

const HEAL: &[ToneDescriptor] = &[
    ToneDescriptor::new(523.0, 0.1, 0.25, Sine),
    ToneDescriptor::new(659.0, 0.1, 0.25, Sine),
    ToneDescriptor::new(784.0, 0.1, 0.25, Sine),
    ToneDescriptor::new(1047.0, 0.2, 0.25, Sine),
];

const DICE_ROLL: &[ToneDescriptor] = &[
    ToneDescriptor::new(1.0, 0.04, 0.3, Noise),
    ToneDescriptor::new(1.0, 0.04, 0.25, Noise),
    ToneDescriptor::new(1.0, 0.04, 0.3, Noise),
    ToneDescriptor::new(600.0, 0.06, 0.2, Square),
];

impl SoundEffect {
    pub const ALL: [SoundEffect; 10] = [
        SoundEffect::Hit,
        SoundEffect::Critical,
        SoundEffect::Miss,
        SoundEffect::MonsterAttack,
        SoundEffect::BattleStart,
        SoundEffect::Victory,
        SoundEffect::Defeat,
        SoundEffect::Save,
        SoundEffect::Heal,
        SoundEffect::DiceRoll,
    ];

    /// The fixed tone sequence for this effect
    pub fn tones(self) -> &'static [ToneDescriptor] {
        match self {
            SoundEffect::Hit => HIT,
            SoundEffect::Critical => CRITICAL,
            SoundEffect::Miss => MISS,
            SoundEffect::MonsterAttack => MONSTER_ATTACK,
            SoundEffect::BattleStart => BATTLE_START,
            SoundEffect::Victory => VICTORY,
            SoundEffect::Defeat => DEFEAT,
            SoundEffect::Save => SAVE,
            SoundEffect::Heal => HEAL,
            SoundEffect::DiceRoll => DICE_ROLL,
        }
    }

    /// Kebab-case name used in logs and on the command line
    pub fn name(self) -> &'static str {
        match self {
            SoundEffect::Hit => "hit",
            SoundEffect::Critical => "critical",
            SoundEffect::Miss => "miss",
            SoundEffect::MonsterAttack => "monster-attack",
            SoundEffect::BattleStart => "battle-start",
            SoundEffect::Victory => "victory",
            SoundEffect::Defeat => "defeat",
            SoundEffect::Save => "save",
            SoundEffect::Heal => "heal",
            SoundEffect::DiceRoll => "dice-roll",
        }
    }

    /// Total pacing time of the sequence in seconds
    pub fn duration_sec(self) -> f32 {
        self.tones().iter().map(|t| t.duration_sec).sum()
    }
}

impl fmt::Display for SoundEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SoundEffect {
    type Err = UnknownNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        match wanted.as_str() {
            "crit" => return Ok(SoundEffect::Critical),
            "dice" => return Ok(SoundEffect::DiceRoll),
            _ => {}
        }
        SoundEffect::ALL
            .into_iter()
            .find(|effect| effect.name() == wanted)
            .ok_or_else(|| UnknownNameError {
                kind: "sound effect",
                name: s.to_string(),
            })
    }
}
