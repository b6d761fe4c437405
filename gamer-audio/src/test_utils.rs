//! Shared test utilities for unit and integration tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use crate::error::AudioError;
use crate::output::{AudioDevice, Channel};
use crate::synth::SampleBuffer;

/// One call observed by a [`RecordingDevice`]
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    Connect { channel: Channel, gain: f32 },
    Start,
    StartFailed,
    Stop,
    Schedule { channel: Channel, buffer: SampleBuffer },
    Halt(Channel),
}

/// Cloneable view onto a [`RecordingDevice`]'s event log.
///
/// The device itself moves into the output graph; tests keep this handle.
#[derive(Debug, Clone, Default)]
pub struct DeviceLog {
    events: Arc<Mutex<Vec<DeviceEvent>>>,
}

impl DeviceLog {
    fn push(&self, event: DeviceEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }

    /// Snapshot of every event so far, in order
    pub fn events(&self) -> Vec<DeviceEvent> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Buffers scheduled on `channel`, in order
    pub fn scheduled(&self, channel: Channel) -> Vec<SampleBuffer> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                DeviceEvent::Schedule { channel: c, buffer } if c == channel => Some(buffer),
                _ => None,
            })
            .collect()
    }

    /// Buffers scheduled on `channel` after its most recent halt
    pub fn scheduled_since_halt(&self, channel: Channel) -> Vec<SampleBuffer> {
        let events = self.events();
        let start = events
            .iter()
            .rposition(|event| *event == DeviceEvent::Halt(channel))
            .map(|i| i + 1)
            .unwrap_or(0);

        events[start..]
            .iter()
            .filter_map(|event| match event {
                DeviceEvent::Schedule { channel: c, buffer } if *c == channel => {
                    Some(buffer.clone())
                }
                _ => None,
            })
            .collect()
    }

    pub fn halt_count(&self, channel: Channel) -> usize {
        self.count(|event| *event == DeviceEvent::Halt(channel))
    }

    pub fn start_count(&self) -> usize {
        self.count(|event| *event == DeviceEvent::Start)
    }

    pub fn failed_start_count(&self) -> usize {
        self.count(|event| *event == DeviceEvent::StartFailed)
    }

    fn count(&self, f: impl Fn(&DeviceEvent) -> bool) -> usize {
        self.events().iter().filter(|event| f(event)).count()
    }
}

/// Test device that records every call instead of producing sound
#[derive(Debug)]
pub struct RecordingDevice {
    log: DeviceLog,
    sample_rate: u32,
    running: AtomicBool,
    failures_remaining: AtomicUsize,
    gate: Option<Mutex<GateSide>>,
}

impl RecordingDevice {
    pub fn new(sample_rate: u32) -> (Self, DeviceLog) {
        let log = DeviceLog::default();
        let device = Self {
            log: log.clone(),
            sample_rate,
            running: AtomicBool::new(false),
            failures_remaining: AtomicUsize::new(0),
            gate: None,
        };
        (device, log)
    }

    /// Make the next `count` calls to `start` fail
    pub fn failing_starts(self, count: usize) -> Self {
        self.failures_remaining.store(count, Ordering::Relaxed);
        self
    }

    /// Make `start` block until the returned gate lets it through, the way
    /// a slow host blocks while it opens a stream
    pub fn gated_starts(mut self) -> (Self, StartGate) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        self.gate = Some(Mutex::new(GateSide {
            entered: entered_tx,
            release: release_rx,
        }));
        let gate = StartGate {
            entered: entered_rx,
            release: release_tx,
        };
        (self, gate)
    }
}

/// Device half of a [`StartGate`]
#[derive(Debug)]
struct GateSide {
    entered: Sender<()>,
    release: Receiver<()>,
}

/// Test half of [`RecordingDevice::gated_starts`]
#[derive(Debug)]
pub struct StartGate {
    entered: Receiver<()>,
    release: Sender<()>,
}

impl StartGate {
    /// Block until a `start` call is waiting at the gate
    pub fn wait_entered(&self) {
        let _ = self.entered.recv();
    }

    /// Let one waiting (or future) `start` call finish
    pub fn release(&self) {
        let _ = self.release.send(());
    }
}

impl AudioDevice for RecordingDevice {
    fn connect(&self, channel: Channel, gain: f32) {
        self.log.push(DeviceEvent::Connect { channel, gain });
    }

    fn start(&self) -> Result<(), AudioError> {
        if self.running.load(Ordering::Acquire) {
            return Ok(());
        }
        if let Some(gate) = &self.gate {
            let gate = gate.lock().unwrap_or_else(|e| e.into_inner());
            let _ = gate.entered.send(());
            // A dropped StartGate lets everything through
            let _ = gate.release.recv();
        }
        let failing = self
            .failures_remaining
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            self.log.push(DeviceEvent::StartFailed);
            return Err(AudioError::NoOutputDevice);
        }
        self.log.push(DeviceEvent::Start);
        self.running.store(true, Ordering::Release);
        Ok(())
    }

    fn stop(&self) {
        self.running.store(false, Ordering::Release);
        self.log.push(DeviceEvent::Stop);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn schedule(&self, channel: Channel, buffer: SampleBuffer) {
        self.log.push(DeviceEvent::Schedule { channel, buffer });
    }

    fn halt(&self, channel: Channel) {
        self.log.push(DeviceEvent::Halt(channel));
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
