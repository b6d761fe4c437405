//! Engine facade
//!
//! [`AudioEngine`] wires the output graph, the effect sequencer and the music
//! scheduler together and is the only type game code needs. Every method
//! returns immediately and none of them can fail; problems are logged and
//! the engine falls back to silence.

use std::borrow::Cow;
use std::sync::Arc;

use tokio::runtime::{Handle, Runtime};
use tracing::{debug, info};

use crate::config::AudioConfig;
use crate::effects::SoundEffect;
use crate::error::AudioError;
use crate::music::{MusicScheduler, MusicTrackId, PlaybackState};
use crate::output::{AudioDevice, OutputGraph};
use crate::sequencer::EffectSequencer;
use crate::synth::ToneDescriptor;

/// Procedural audio for the game: sound effects and looping music
pub struct AudioEngine {
    graph: Arc<OutputGraph>,
    effects: EffectSequencer,
    music: MusicScheduler,
    /// Present when the engine owns its runtime rather than borrowing a handle
    runtime: Option<Runtime>,
}

impl AudioEngine {
    /// Create an engine with its own scheduling runtime and the configured device.
    ///
    /// The device isn't opened until the first sound is played.
    ///
    /// # Errors
    ///
    /// Returns an error only if the runtime's worker threads can't be spawned.
    pub fn new(config: &AudioConfig) -> Result<Self, AudioError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(config.worker_threads.max(1))
            .thread_name("gamer-audio")
            .enable_time()
            .build()?;

        let mut engine = Self::with_device(config, config.open_device(), runtime.handle().clone());
        engine.runtime = Some(runtime);

        info!(
            "Audio engine ready ({:?} backend, {} workers)",
            config.effective_backend(),
            config.worker_threads.max(1)
        );
        Ok(engine)
    }

    /// Create an engine on a caller-supplied runtime and device
    pub fn with_device(config: &AudioConfig, device: Box<dyn AudioDevice>, handle: Handle) -> Self {
        let graph = Arc::new(OutputGraph::new(device));
        let effects = EffectSequencer::new(
            Arc::clone(&graph),
            handle.clone(),
            config.max_concurrent_effects,
        );
        let music = MusicScheduler::new(Arc::clone(&graph), handle);

        Self {
            graph,
            effects,
            music,
            runtime: None,
        }
    }

    pub fn play_hit(&self) {
        self.play_effect(SoundEffect::Hit);
    }

    pub fn play_crit(&self) {
        self.play_effect(SoundEffect::Critical);
    }

    pub fn play_miss(&self) {
        self.play_effect(SoundEffect::Miss);
    }

    pub fn play_monster_attack(&self) {
        self.play_effect(SoundEffect::MonsterAttack);
    }

    pub fn play_battle_start(&self) {
        self.play_effect(SoundEffect::BattleStart);
    }

    pub fn play_victory(&self) {
        self.play_effect(SoundEffect::Victory);
    }

    pub fn play_defeat(&self) {
        self.play_effect(SoundEffect::Defeat);
    }

    pub fn play_save(&self) {
        self.play_effect(SoundEffect::Save);
    }

    pub fn play_heal(&self) {
        self.play_effect(SoundEffect::Heal);
    }

    pub fn play_dice_roll(&self) {
        self.play_effect(SoundEffect::DiceRoll);
    }

    pub fn play_effect(&self, effect: SoundEffect) {
        self.effects.play(effect);
    }

    /// Play a custom tone sequence on the effects channel
    pub fn play_sequence(&self, tones: impl Into<Cow<'static, [ToneDescriptor]>>) {
        self.effects.play_sequence(tones);
    }

    /// Loop `track`, replacing whatever is playing. No-op if `track` is already on.
    pub fn start_music(&self, track: MusicTrackId) {
        self.music.start(track);
    }

    pub fn stop_music(&self) {
        self.music.stop();
    }

    pub fn music_state(&self) -> PlaybackState {
        self.music.state()
    }

    /// Music loop tasks still alive, including ones winding down after a stop
    pub fn active_music_loops(&self) -> usize {
        self.music.active_loops()
    }

    /// Effect sequences holding a slot under `max_concurrent_effects`
    pub fn effects_in_flight(&self) -> usize {
        self.effects.in_flight()
    }

    /// Whether the output device is currently open
    pub fn is_output_running(&self) -> bool {
        self.graph.is_running()
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        self.music.stop();
        self.graph.shutdown();

        if let Some(runtime) = self.runtime.take() {
            // Doesn't block, so the engine can be dropped from async code too
            runtime.shutdown_background();
        }
        debug!("Audio engine shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputBackend;

    #[test]
    fn test_owned_runtime_with_null_backend() {
        let config = AudioConfig {
            backend: OutputBackend::Null,
            worker_threads: 1,
            ..AudioConfig::default()
        };
        let engine = AudioEngine::new(&config).unwrap();

        assert!(!engine.is_output_running());
        engine.play_hit();
        engine.start_music(MusicTrackId::Menu);
        assert_eq!(engine.music_state(), PlaybackState::Running(MusicTrackId::Menu));

        engine.stop_music();
        assert_eq!(engine.music_state(), PlaybackState::Stopped);
    }

    #[test]
    fn test_disabled_engine_still_accepts_calls() {
        let config = AudioConfig {
            enabled: false,
            ..AudioConfig::default()
        };
        let engine = AudioEngine::new(&config).unwrap();

        for effect in SoundEffect::ALL {
            engine.play_effect(effect);
        }
        engine.start_music(MusicTrackId::Combat);
        drop(engine);
    }
}
