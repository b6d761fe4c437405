//! Silent output device
//!
//! Used when audio is disabled in config or no sound hardware is wanted
//! (headless servers, CI). Accepts everything and plays nothing.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::trace;

use crate::error::AudioError;
use crate::synth::SampleBuffer;

use super::{AudioDevice, Channel};

#[derive(Debug)]
pub struct NullDevice {
    sample_rate: u32,
    running: AtomicBool,
}

impl NullDevice {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            running: AtomicBool::new(false),
        }
    }
}

impl AudioDevice for NullDevice {
    fn connect(&self, _channel: Channel, _gain: f32) {}

    fn start(&self) -> Result<(), AudioError> {
        self.running.store(true, Ordering::Relaxed);
        Ok(())
    }

    fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    fn schedule(&self, channel: Channel, buffer: SampleBuffer) {
        trace!("Null device dropping {} frames on {:?}", buffer.frame_count(), channel);
    }

    fn halt(&self, _channel: Channel) {}

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
