//! Lock-free handoff between the device front end and the stream callback
//!
//! The callback owns its [`Mixer`] outright. Callers reach it only through a
//! command ring, and every buffer the mixer finishes with travels back over a
//! second ring so its memory is released on a caller thread, never inside the
//! callback.

use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use tracing::{trace, warn};

use crate::synth::SampleBuffer;

use super::Channel;
use super::mixer::{BufferSink, Mixer};

/// Commands in flight between two callbacks
const COMMAND_CAPACITY: usize = 256;

/// Retired buffers waiting to be freed
const RETIRED_CAPACITY: usize = 512;

/// A change to the mixer, applied at the start of the next callback
#[derive(Debug)]
pub enum MixerCommand {
    Push(Channel, SampleBuffer),
    Clear(Channel),
    SetGain(Channel, f32),
}

/// Create a connected link/endpoint pair around `mixer`
pub fn mixer_link(mixer: Mixer) -> (MixerLink, MixerEndpoint) {
    let (commands_tx, commands_rx) = HeapRb::<MixerCommand>::new(COMMAND_CAPACITY).split();
    let (retired_tx, retired_rx) = HeapRb::<SampleBuffer>::new(RETIRED_CAPACITY).split();

    (
        MixerLink {
            commands: commands_tx,
            retired: retired_rx,
        },
        MixerEndpoint {
            mixer,
            commands: commands_rx,
            retired: retired_tx,
        },
    )
}

/// Caller side of the link
pub struct MixerLink {
    commands: HeapProd<MixerCommand>,
    retired: HeapCons<SampleBuffer>,
}

impl MixerLink {
    /// Queue a command for the callback.
    ///
    /// Returns false if the ring is full; the command is dropped and the
    /// callback never sees it.
    pub fn send(&mut self, command: MixerCommand) -> bool {
        self.collect_retired();

        match self.commands.try_push(command) {
            Ok(()) => true,
            Err(command) => {
                warn!("Mixer command ring full; dropping {:?}", CommandKind::of(&command));
                false
            }
        }
    }

    /// Free buffers the callback has finished with. Returns how many.
    pub fn collect_retired(&mut self) -> usize {
        let mut freed = 0;
        while let Some(buffer) = self.retired.try_pop() {
            drop(buffer);
            freed += 1;
        }
        if freed > 0 {
            trace!("Freed {} retired buffers", freed);
        }
        freed
    }
}

/// Callback side of the link. Moved into the stream callback.
pub struct MixerEndpoint {
    mixer: Mixer,
    commands: HeapCons<MixerCommand>,
    retired: HeapProd<SampleBuffer>,
}

impl MixerEndpoint {
    pub fn mixer_mut(&mut self) -> &mut Mixer {
        &mut self.mixer
    }

    /// Apply pending commands, then mix into `out`
    pub fn render(&mut self, out: &mut [f32]) {
        while let Some(command) = self.commands.try_pop() {
            match command {
                MixerCommand::Push(channel, buffer) => self.mixer.push(channel, buffer),
                MixerCommand::Clear(channel) => self.mixer.clear(channel, &mut self.retired),
                MixerCommand::SetGain(channel, gain) => self.mixer.set_gain(channel, gain),
            }
        }

        self.mixer.render(out, &mut self.retired);
    }
}

impl BufferSink for HeapProd<SampleBuffer> {
    fn retire(&mut self, buffer: SampleBuffer) {
        // Only when the caller side stopped collecting; freeing here is the
        // one remaining option
        if let Err(buffer) = self.try_push(buffer) {
            drop(buffer);
        }
    }
}

/// Loggable summary of a command without its sample data
#[derive(Debug)]
enum CommandKind {
    Push(Channel),
    Clear(Channel),
    SetGain(Channel),
}

impl CommandKind {
    fn of(command: &MixerCommand) -> Self {
        match command {
            MixerCommand::Push(channel, _) => CommandKind::Push(*channel),
            MixerCommand::Clear(channel) => CommandKind::Clear(*channel),
            MixerCommand::SetGain(channel, _) => CommandKind::SetGain(*channel),
        }
    }
}
