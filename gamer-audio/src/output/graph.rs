//! Output graph: shared, thread-safe front end over one [`AudioDevice`]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, trace, warn};

use crate::synth::SampleBuffer;

use super::{AudioDevice, Channel};

/// Owns the device and the two channels feeding its mix.
///
/// Opening the device is serialized by `starting`, which nothing else
/// takes: a halt or a schedule never waits behind a slow start. Failures
/// are logged and swallowed; audio is never a reason for game logic to fail.
pub struct OutputGraph {
    device: Box<dyn AudioDevice>,
    starting: Mutex<()>,
    /// Set after a failed start so repeated failures log at debug level
    start_failed: AtomicBool,
}

impl OutputGraph {
    /// Wrap a device and connect both channel buses at their fixed gains
    pub fn new(device: Box<dyn AudioDevice>) -> Self {
        for channel in Channel::ALL {
            device.connect(channel, channel.bus_gain());
        }

        Self {
            device,
            starting: Mutex::new(()),
            start_failed: AtomicBool::new(false),
        }
    }

    fn lock_starting(&self) -> MutexGuard<'_, ()> {
        self.starting.lock().unwrap_or_else(|e| {
            warn!("Audio start mutex poisoned; continuing");
            e.into_inner()
        })
    }

    /// Start the device if it isn't running. Idempotent.
    ///
    /// Can block while the host opens a stream, so never call it with a
    /// lock held. Returns false when the device couldn't be started; the
    /// next playback request makes one more attempt.
    pub fn ensure_running(&self) -> bool {
        if self.device.is_running() {
            return true;
        }

        let _starting = self.lock_starting();
        // Someone else may have opened it while we waited
        if self.device.is_running() {
            return true;
        }

        match self.device.start() {
            Ok(()) => {
                if self.start_failed.swap(false, Ordering::Relaxed) {
                    debug!("Audio device recovered");
                }
                true
            }
            Err(e) => {
                if self.start_failed.swap(true, Ordering::Relaxed) {
                    debug!("Audio device still unavailable: {}", e);
                } else {
                    warn!("Failed to start audio output: {}. Audio disabled until it recovers.", e);
                }
                false
            }
        }
    }

    /// Queue a buffer on `channel`, starting the device first if needed.
    ///
    /// Empty buffers (a tone the generator couldn't produce) are skipped. If
    /// the device can't start, the buffer is dropped.
    pub fn enqueue(&self, channel: Channel, buffer: SampleBuffer) {
        if buffer.is_empty() {
            trace!("Skipping empty buffer on {:?}", channel);
            return;
        }
        if self.ensure_running() {
            self.device.schedule(channel, buffer);
        }
    }

    /// Queue a buffer only if the device is already running. Never blocks
    /// on a start, so it's safe under a caller's own lock.
    ///
    /// Returns false if the buffer was dropped because the device is down.
    pub fn submit(&self, channel: Channel, buffer: SampleBuffer) -> bool {
        if buffer.is_empty() {
            trace!("Skipping empty buffer on {:?}", channel);
            return true;
        }
        if !self.device.is_running() {
            return false;
        }
        self.device.schedule(channel, buffer);
        true
    }

    /// Cut `channel` off immediately, dropping its current and queued buffers
    pub fn halt(&self, channel: Channel) {
        self.device.halt(channel);
    }

    /// Stop the device. A later enqueue starts it again.
    pub fn shutdown(&self) {
        let _starting = self.lock_starting();
        if self.device.is_running() {
            self.device.stop();
            debug!("Audio output stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.device.is_running()
    }

    /// Rate to generate buffers at
    pub fn sample_rate(&self) -> u32 {
        self.device.sample_rate()
    }
}
