//! End-to-end behaviour of the engine facade against a recording device

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use gamer_audio::music::melody;
use gamer_audio::synth::generate;
use gamer_audio::test_utils::{DeviceEvent, DeviceLog, RecordingDevice};
use gamer_audio::{
    AudioConfig, AudioEngine, Channel, MusicTrackId, PlaybackState, SoundEffect, ToneDescriptor,
    WaveformKind,
};
use tokio::runtime::Handle;
use tokio::time::Instant;

const RATE: u32 = 8000;

fn engine_with(config: &AudioConfig, device: RecordingDevice) -> AudioEngine {
    AudioEngine::with_device(config, Box::new(device), Handle::current())
}

fn engine() -> (AudioEngine, DeviceLog) {
    let (device, log) = RecordingDevice::new(RATE);
    (engine_with(&AudioConfig::default(), device), log)
}

fn buffers(tones: &[ToneDescriptor]) -> Vec<gamer_audio::SampleBuffer> {
    tones.iter().filter(|t| !t.is_rest()).map(|t| generate(t, RATE)).collect()
}

#[tokio::test(start_paused = true)]
async fn victory_plays_five_tones_over_its_duration() {
    let (engine, log) = engine();
    let started = Instant::now();

    engine.play_victory();

    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(log.scheduled(Channel::Effects).len(), 1);

    tokio::time::sleep(Duration::from_millis(700)).await;
    assert_eq!(log.scheduled(Channel::Effects).len(), 5);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(log.scheduled(Channel::Effects), buffers(SoundEffect::Victory.tones()));
    assert!(started.elapsed() >= Duration::from_millis(760));
    assert_eq!(engine.effects_in_flight(), 0);
}

#[tokio::test(start_paused = true)]
async fn device_starts_lazily_once() {
    let (engine, log) = engine();
    assert_eq!(log.start_count(), 0);

    engine.play_save();
    engine.play_heal();
    engine.start_music(MusicTrackId::Menu);
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(log.start_count(), 1);
    assert!(engine.is_output_running());
}

#[tokio::test(start_paused = true)]
async fn buses_are_connected_at_fixed_gains() {
    let (_engine, log) = engine();
    let events = log.events();
    assert!(events.contains(&DeviceEvent::Connect { channel: Channel::Effects, gain: 1.0 }));
    assert!(events.contains(&DeviceEvent::Connect { channel: Channel::Music, gain: 0.4 }));
}

#[tokio::test(start_paused = true)]
async fn start_music_twice_runs_one_loop() {
    let (engine, _log) = engine();

    engine.start_music(MusicTrackId::Exploration);
    engine.start_music(MusicTrackId::Exploration);

    assert_eq!(engine.music_state(), PlaybackState::Running(MusicTrackId::Exploration));
    assert_eq!(engine.active_music_loops(), 1);
}

#[tokio::test(start_paused = true)]
async fn switching_tracks_restarts_from_first_note() {
    let (engine, log) = engine();

    engine.start_music(MusicTrackId::Menu);
    tokio::time::sleep(Duration::from_millis(1200)).await;
    engine.start_music(MusicTrackId::Exploration);
    tokio::time::sleep(Duration::from_millis(1)).await;

    assert_eq!(engine.music_state().active_track(), Some(MusicTrackId::Exploration));
    assert_eq!(log.halt_count(Channel::Music), 1);
    assert_eq!(
        log.scheduled_since_halt(Channel::Music),
        vec![generate(&melody(MusicTrackId::Exploration)[0], RATE)]
    );
}

#[tokio::test(start_paused = true)]
async fn stop_music_when_stopped_is_noop() {
    let (engine, log) = engine();

    engine.stop_music();
    engine.stop_music();

    assert_eq!(engine.music_state(), PlaybackState::Stopped);
    assert_eq!(log.halt_count(Channel::Music), 0);
}

#[tokio::test(start_paused = true)]
async fn combat_stops_within_one_note() {
    let (engine, log) = engine();

    engine.start_music(MusicTrackId::Combat);
    tokio::time::sleep(Duration::from_millis(400)).await;
    engine.stop_music();

    assert_eq!(engine.music_state(), PlaybackState::Stopped);
    assert!(!engine.music_state().is_running());

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(engine.active_music_loops(), 0);
    assert!(log.scheduled_since_halt(Channel::Music).is_empty());
}

#[tokio::test(start_paused = true)]
async fn effects_and_music_use_separate_channels() {
    let (engine, log) = engine();

    engine.start_music(MusicTrackId::Combat);
    engine.play_hit();
    engine.stop_music();
    tokio::time::sleep(Duration::from_millis(500)).await;

    // Halting music leaves the effect alone
    assert_eq!(log.scheduled(Channel::Effects).len(), SoundEffect::Hit.tones().len());
    assert_eq!(log.halt_count(Channel::Effects), 0);
}

#[tokio::test(start_paused = true)]
async fn custom_sequence_plays_on_effects_channel() {
    let (engine, log) = engine();
    let tones = vec![
        ToneDescriptor::new(300.0, 0.05, 0.4, WaveformKind::Sine),
        ToneDescriptor::rest(0.05),
        ToneDescriptor::new(600.0, 0.05, 0.4, WaveformKind::Square),
    ];

    engine.play_sequence(tones.clone());
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(log.scheduled(Channel::Effects), buffers(&tones));
}

#[tokio::test(start_paused = true)]
async fn unavailable_device_is_retried_on_next_sound() {
    let (device, log) = RecordingDevice::new(RATE);
    let engine = engine_with(&AudioConfig::default(), device.failing_starts(1));

    engine.play_save();
    tokio::time::sleep(Duration::from_millis(300)).await;

    // The first tone hit the failed start; the second one reopened the device
    assert_eq!(log.failed_start_count(), 1);
    assert_eq!(log.start_count(), 1);
    assert_eq!(
        log.scheduled(Channel::Effects),
        vec![generate(&SoundEffect::Save.tones()[1], RATE)]
    );
}

#[tokio::test(start_paused = true)]
async fn effect_cap_comes_from_config() {
    let (device, log) = RecordingDevice::new(RATE);
    let config = AudioConfig {
        max_concurrent_effects: 1,
        ..AudioConfig::default()
    };
    let engine = engine_with(&config, device);

    engine.play_save();
    engine.play_save();
    engine.play_save();
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(log.scheduled(Channel::Effects).len(), SoundEffect::Save.tones().len());
}

#[tokio::test(start_paused = true)]
async fn dropping_engine_stops_everything() {
    let (engine, log) = engine();

    engine.start_music(MusicTrackId::Menu);
    tokio::time::sleep(Duration::from_millis(10)).await;
    drop(engine);

    assert_eq!(log.halt_count(Channel::Music), 1);
    assert_eq!(log.events().last(), Some(&DeviceEvent::Stop));

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(log.scheduled_since_halt(Channel::Music).is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stop_music_returns_while_device_is_opening() {
    let (device, log) = RecordingDevice::new(RATE);
    let (device, gate) = device.gated_starts();
    let engine = engine_with(&AudioConfig::default(), device);

    engine.start_music(MusicTrackId::Combat);
    // The loop task is now stuck opening the device
    gate.wait_entered();

    let (done_tx, done_rx) = mpsc::channel();
    let returned = thread::scope(|scope| {
        scope.spawn(|| {
            engine.stop_music();
            let _ = done_tx.send(());
        });
        let returned = done_rx.recv_timeout(Duration::from_secs(5)).is_ok();
        gate.release();
        returned
    });

    assert!(returned, "stop_music waited for the device to open");
    assert_eq!(engine.music_state(), PlaybackState::Stopped);

    // Once the start completes the loop sees the stop and queues nothing
    for _ in 0..500 {
        if engine.active_music_loops() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(engine.active_music_loops(), 0);
    assert_eq!(log.start_count(), 1);
    assert!(log.scheduled(Channel::Music).is_empty());
}
