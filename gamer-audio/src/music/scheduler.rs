//! Music scheduler: loops one track's melody on the music channel

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::runtime::Handle;
use tracing::{debug, info, trace, warn};

use crate::output::{Channel, OutputGraph};
use crate::synth::{SampleBuffer, generate};

use super::{MusicTrackId, PlaybackState, melody};

#[derive(Debug, Default)]
struct SchedulerState {
    playback: PlaybackState,
    /// Bumped on every start; a loop only schedules while its generation is current
    generation: u64,
}

impl SchedulerState {
    fn is_current(&self, generation: u64) -> bool {
        self.playback.is_running() && self.generation == generation
    }
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<SchedulerState>,
    live_loops: AtomicUsize,
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(|e| {
            warn!("Music state mutex poisoned; continuing");
            e.into_inner()
        })
    }
}

/// Counts a running loop task for as long as the task's future is alive
struct LoopGuard {
    shared: Arc<Shared>,
}

impl LoopGuard {
    fn new(shared: &Arc<Shared>) -> Self {
        shared.live_loops.fetch_add(1, Ordering::SeqCst);
        Self {
            shared: Arc::clone(shared),
        }
    }
}

impl Drop for LoopGuard {
    fn drop(&mut self) {
        self.shared.live_loops.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Plays at most one music track at a time.
///
/// Starting the playing track is a no-op, starting another track replaces
/// it, and stopping cuts the music channel off immediately. The state check
/// and the queueing of each note happen under one lock, so nothing from a
/// stopped or replaced track reaches the channel after its halt.
pub struct MusicScheduler {
    shared: Arc<Shared>,
    graph: Arc<OutputGraph>,
    handle: Handle,
}

impl MusicScheduler {
    /// Loop tasks are spawned on `handle`
    pub fn new(graph: Arc<OutputGraph>, handle: Handle) -> Self {
        Self {
            shared: Arc::default(),
            graph,
            handle,
        }
    }

    /// Begin looping `track`
    pub fn start(&self, track: MusicTrackId) {
        let mut state = self.shared.lock_state();

        match state.playback {
            PlaybackState::Running(current) if current == track => {
                debug!("Music track {} already playing", track);
                return;
            }
            PlaybackState::Running(current) => {
                debug!("Switching music from {} to {}", current, track);
                self.stop_locked(&mut state);
            }
            PlaybackState::Stopped => {}
        }

        state.generation = state.generation.wrapping_add(1);
        state.playback = PlaybackState::Running(track);
        let generation = state.generation;

        let guard = LoopGuard::new(&self.shared);
        self.handle.spawn(run_loop(
            Arc::clone(&self.shared),
            Arc::clone(&self.graph),
            track,
            generation,
            guard,
        ));

        info!("Music started: {}", track);
    }

    /// Stop the music and silence the music channel. No-op when stopped.
    pub fn stop(&self) {
        let mut state = self.shared.lock_state();
        if state.playback.is_running() {
            self.stop_locked(&mut state);
        }
    }

    fn stop_locked(&self, state: &mut SchedulerState) {
        if let PlaybackState::Running(track) = state.playback {
            info!("Music stopped: {}", track);
        }
        state.playback = PlaybackState::Stopped;
        self.graph.halt(Channel::Music);
    }

    pub fn state(&self) -> PlaybackState {
        self.shared.lock_state().playback
    }

    /// Loop tasks that haven't exited yet, including superseded ones that
    /// are still asleep
    pub fn active_loops(&self) -> usize {
        self.shared.live_loops.load(Ordering::SeqCst)
    }
}

/// Schedule `track`'s notes back to back until the generation goes stale
async fn run_loop(
    shared: Arc<Shared>,
    graph: Arc<OutputGraph>,
    track: MusicTrackId,
    generation: u64,
    _guard: LoopGuard,
) {
    let melody = melody(track);
    let length: f32 = melody.iter().map(|t| t.duration_sec.max(0.0)).sum();
    if melody.is_empty() || length <= 0.0 {
        warn!("Music track {} has nothing to play", track);
        return;
    }

    loop {
        for tone in melody {
            if tone.is_rest() {
                if !shared.lock_state().is_current(generation) {
                    break;
                }
            } else {
                let buffer = generate(tone, graph.sample_rate());
                // Opening the device can block; never under the state lock
                if !buffer.is_empty() {
                    graph.ensure_running();
                }
                if !submit_if_current(&shared, &graph, generation, buffer) {
                    break;
                }
            }

            tokio::time::sleep(tone.duration()).await;
        }

        if !shared.lock_state().is_current(generation) {
            break;
        }
        trace!("Music track {} looping", track);
    }

    debug!("Music loop for {} exited", track);
}

/// Queue on the music channel if `generation` is still current.
///
/// Holding the state lock across the submit is what keeps a concurrent
/// `stop` from slipping its halt in between the check and the queueing.
/// The submit itself never starts the device, so the lock is only held for
/// the length of a queue push.
fn submit_if_current(
    shared: &Shared,
    graph: &OutputGraph,
    generation: u64,
    buffer: SampleBuffer,
) -> bool {
    let state = shared.lock_state();
    if !state.is_current(generation) {
        return false;
    }
    graph.submit(Channel::Music, buffer);
    true
}
