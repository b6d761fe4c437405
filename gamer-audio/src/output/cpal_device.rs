//! Audio output using cpal
//!
//! The cpal stream is created, kept alive and dropped on a dedicated
//! `audio-output` thread; `cpal::Stream` isn't `Send` on every platform and
//! the device has to be shareable between scheduler tasks. The callback owns
//! its [`Mixer`] and is fed over a [`MixerLink`], so it never waits on a lock
//! a caller might hold.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{debug, error, info, trace, warn};

use crate::error::AudioError;
use crate::synth::SampleBuffer;

use super::link::{MixerCommand, MixerEndpoint, MixerLink, mixer_link};
use super::mixer::Mixer;
use super::{AudioDevice, Channel};

/// Output channel count assumed until the device reports its own
const DEFAULT_OUTPUT_CHANNELS: usize = 2;

/// Negotiated stream format
#[derive(Debug, Clone, Copy)]
struct StreamFormat {
    sample_rate: u32,
    channels: usize,
}

/// Owner thread for a running cpal stream
struct StreamThread {
    /// Dropping the sender wakes the thread, which then drops the stream
    shutdown: Option<mpsc::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Drop for StreamThread {
    fn drop(&mut self) {
        // Drop the sender first or the join below never returns
        drop(self.shutdown.take());

        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Real output device backed by the host's default cpal output.
///
/// Lock order is `stream` then `link`. Only start and stop take `stream`,
/// and they can hold it for as long as the host takes to open a stream;
/// `schedule` and `halt` only ever take `link`, for the length of one ring
/// push.
pub struct CpalDevice {
    master_volume: f32,
    gains: Mutex<[f32; 2]>,
    /// Present while a stream is running
    link: Mutex<Option<MixerLink>>,
    stream: Mutex<Option<StreamThread>>,
    running: AtomicBool,
    sample_rate: AtomicU32,
    /// Set by the stream error callback; the next start rebuilds the stream
    device_lost: Arc<AtomicBool>,
}

impl CpalDevice {
    /// Create the device without opening a stream.
    ///
    /// `fallback_sample_rate` is reported until a stream is open and the
    /// hardware rate is known.
    pub fn new(fallback_sample_rate: u32, master_volume: f32) -> Self {
        Self {
            master_volume,
            gains: Mutex::new([0.0; 2]),
            link: Mutex::new(None),
            stream: Mutex::new(None),
            running: AtomicBool::new(false),
            sample_rate: AtomicU32::new(fallback_sample_rate),
            device_lost: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Send a command to the callback, if a stream is running
    fn send(&self, command: MixerCommand) -> bool {
        match lock(&self.link).as_mut() {
            Some(link) => link.send(command),
            None => false,
        }
    }
}

impl AudioDevice for CpalDevice {
    fn connect(&self, channel: Channel, gain: f32) {
        lock(&self.gains)[channel.index()] = gain;
        self.send(MixerCommand::SetGain(channel, gain));
    }

    fn start(&self) -> Result<(), AudioError> {
        let mut stream = lock(&self.stream);
        if self.is_running() {
            return Ok(());
        }

        // Tear down a lost stream before building a fresh one
        self.running.store(false, Ordering::Release);
        *lock(&self.link) = None;
        *stream = None;
        self.device_lost.store(false, Ordering::Relaxed);

        let mut mixer = Mixer::new(
            self.sample_rate.load(Ordering::Relaxed),
            DEFAULT_OUTPUT_CHANNELS,
            self.master_volume,
        );
        let gains = *lock(&self.gains);
        for channel in Channel::ALL {
            mixer.set_gain(channel, gains[channel.index()]);
        }
        let (link, endpoint) = mixer_link(mixer);

        let (ready_tx, ready_rx) = mpsc::channel::<Result<StreamFormat, AudioError>>();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let device_lost = Arc::clone(&self.device_lost);

        let handle = thread::Builder::new()
            .name("audio-output".into())
            .spawn(move || {
                let stream = match build_output_stream(endpoint, &device_lost) {
                    Ok((stream, format)) => {
                        let _ = ready_tx.send(Ok(format));
                        stream
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                // Blocks until the sender is dropped
                let _ = shutdown_rx.recv();
                drop(stream);
                debug!("Audio output thread finished");
            })?;

        let stream_thread = StreamThread {
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        };

        match ready_rx.recv() {
            Ok(Ok(format)) => {
                info!(
                    "Audio stream started at {}Hz, {} channels",
                    format.sample_rate, format.channels
                );
                self.sample_rate.store(format.sample_rate, Ordering::Relaxed);
                *lock(&self.link) = Some(link);
                *stream = Some(stream_thread);
                self.running.store(true, Ordering::Release);
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(AudioError::OutputThreadGone),
        }
    }

    fn stop(&self) {
        let mut stream = lock(&self.stream);
        self.running.store(false, Ordering::Release);
        *lock(&self.link) = None;
        *stream = None;
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire) && !self.device_lost.load(Ordering::Relaxed)
    }

    fn schedule(&self, channel: Channel, buffer: SampleBuffer) {
        if !self.send(MixerCommand::Push(channel, buffer)) {
            trace!("No stream for {:?}; buffer dropped", channel);
        }
    }

    fn halt(&self, channel: Channel) {
        self.send(MixerCommand::Clear(channel));
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate.load(Ordering::Relaxed)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| {
        warn!("Audio device mutex poisoned; continuing");
        e.into_inner()
    })
}

fn build_output_stream(
    mut endpoint: MixerEndpoint,
    device_lost: &Arc<AtomicBool>,
) -> Result<(cpal::Stream, StreamFormat), AudioError> {
    let host = cpal::default_host();

    let device = host
        .default_output_device()
        .ok_or(AudioError::NoOutputDevice)?;

    debug!(
        "Selected audio device: {}",
        device.name().unwrap_or_else(|_| String::from("<no name>"))
    );

    let config = device.default_output_config()?;
    let format = StreamFormat {
        sample_rate: config.sample_rate().0,
        channels: config.channels() as usize,
    };
    endpoint.mixer_mut().configure(format.sample_rate, format.channels);

    let sample_format = config.sample_format();
    let stream_config: cpal::StreamConfig = config.into();

    let err_fn = {
        let device_lost = Arc::clone(device_lost);
        move |err: cpal::StreamError| {
            error!("Audio stream error: {}", err);
            device_lost.store(true, Ordering::Relaxed);
        }
    };

    let stream = match sample_format {
        cpal::SampleFormat::F32 => {
            device.build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    endpoint.render(data);
                },
                err_fn,
                None,
            )?
        }
        cpal::SampleFormat::I16 => {
            let mut temp_buffer: Vec<f32> = vec![0.0; 4096];
            device.build_output_stream(
                &stream_config,
                move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                    if temp_buffer.len() < data.len() {
                        temp_buffer.resize(data.len(), 0.0);
                    }
                    let temp = &mut temp_buffer[..data.len()];
                    endpoint.render(temp);
                    for (out, &f) in data.iter_mut().zip(temp.iter()) {
                        *out = (f * 32767.0).clamp(-32768.0, 32767.0) as i16;
                    }
                },
                err_fn,
                None,
            )?
        }
        cpal::SampleFormat::U16 => {
            let mut temp_buffer: Vec<f32> = vec![0.0; 4096];
            device.build_output_stream(
                &stream_config,
                move |data: &mut [u16], _: &cpal::OutputCallbackInfo| {
                    if temp_buffer.len() < data.len() {
                        temp_buffer.resize(data.len(), 0.0);
                    }
                    let temp = &mut temp_buffer[..data.len()];
                    endpoint.render(temp);
                    // 0x8000 is silence for u16 audio
                    for (out, &f) in data.iter_mut().zip(temp.iter()) {
                        *out = (f * 32767.0 + 32768.0).clamp(0.0, 65535.0) as u16;
                    }
                },
                err_fn,
                None,
            )?
        }
        other => {
            return Err(AudioError::UnsupportedSampleFormat(format!("{:?}", other)));
        }
    };

    stream.play()?;

    Ok((stream, format))
}

#[cfg(test)]
mod tests {
    use super::*;

    // These never open a stream, so they run without sound hardware.

    #[test]
    fn test_reports_fallback_rate_before_start() {
        let device = CpalDevice::new(48_000, 0.8);
        assert_eq!(device.sample_rate(), 48_000);
        assert!(!device.is_running());
    }

    #[test]
    fn test_calls_without_a_stream_are_dropped() {
        let device = CpalDevice::new(8000, 1.0);
        device.connect(Channel::Music, 0.4);
        device.schedule(Channel::Music, SampleBuffer::new(8000, vec![0.1; 4]));
        device.halt(Channel::Music);

        assert!(!device.is_running());
        assert!(lock(&device.link).is_none());
        assert_eq!(lock(&device.gains)[Channel::Music.index()], 0.4);
    }

    #[test]
    fn test_stop_without_start() {
        let device = CpalDevice::new(8000, 1.0);
        device.stop();
        assert!(!device.is_running());
    }
}
