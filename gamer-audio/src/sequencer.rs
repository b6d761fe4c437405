//! Effect sequencer
//!
//! Plays a tone sequence on the effects channel: each tone is generated,
//! queued, and held for its duration before the next one goes out. Every
//! trigger runs as its own task, so overlapping effects interleave freely.

use std::borrow::Cow;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tracing::{debug, trace};

use crate::effects::SoundEffect;
use crate::output::{Channel, OutputGraph};
use crate::synth::{ToneDescriptor, generate};

/// Play `tones` back to back on the effects channel.
///
/// Rests only wait. Returns the number of buffers handed to the graph.
pub async fn run_sequence(graph: &OutputGraph, tones: &[ToneDescriptor]) -> usize {
    let mut queued = 0;

    for tone in tones {
        if !tone.is_rest() {
            let buffer = generate(tone, graph.sample_rate());
            if !buffer.is_empty() {
                graph.enqueue(Channel::Effects, buffer);
                queued += 1;
            }
        }
        tokio::time::sleep(tone.duration()).await;
    }

    queued
}

/// Fire-and-forget front end for [`run_sequence`]
pub struct EffectSequencer {
    graph: Arc<OutputGraph>,
    handle: Handle,
    /// `None` means no cap on concurrent sequences
    permits: Option<Arc<Semaphore>>,
    max_concurrent: usize,
}

impl EffectSequencer {
    /// `max_concurrent` of 0 leaves the number of overlapping sequences unbounded
    pub fn new(graph: Arc<OutputGraph>, handle: Handle, max_concurrent: usize) -> Self {
        let permits = (max_concurrent > 0).then(|| Arc::new(Semaphore::new(max_concurrent)));
        Self {
            graph,
            handle,
            permits,
            max_concurrent,
        }
    }

    pub fn play(&self, effect: SoundEffect) {
        trace!("Playing effect {}", effect);
        self.play_sequence(effect.tones());
    }

    /// Start an arbitrary sequence and return immediately.
    ///
    /// When the concurrency cap is reached the trigger is dropped.
    pub fn play_sequence(&self, tones: impl Into<Cow<'static, [ToneDescriptor]>>) {
        let tones = tones.into();
        if tones.is_empty() {
            return;
        }

        let permit = match &self.permits {
            Some(permits) => match Arc::clone(permits).try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    debug!("Too many effects playing; dropping a {} tone sequence", tones.len());
                    return;
                }
            },
            None => None,
        };

        let graph = Arc::clone(&self.graph);
        self.handle.spawn(async move {
            let _permit = permit;
            run_sequence(&graph, &tones).await;
        });
    }

    /// Sequences currently holding a slot; always 0 when uncapped
    pub fn in_flight(&self) -> usize {
        self.permits.as_ref().map_or(0, |permits| {
            self.max_concurrent.saturating_sub(permits.available_permits())
        })
    }
}
