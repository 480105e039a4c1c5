// Tests for the capture backend types and the synthetic tone backend

use audio_session::audio::{AudioBackend, AudioBackendConfig, AudioFrame, ToneBackend};
use audio_session::config::RecordingConfig;
use std::time::Duration;

#[test]
fn test_audio_backend_config_default() {
    let config = AudioBackendConfig::default();

    assert_eq!(config.target_sample_rate, 16000, "Default should be 16kHz for speech-to-text");
    assert_eq!(config.target_channels, 1, "Default should be mono");
    assert_eq!(config.buffer_duration_ms, 100, "Default buffer should be 100ms");
}

#[test]
fn test_audio_frame_duration_of_empty_format() {
    let frame = AudioFrame {
        samples: vec![1, 2, 3],
        sample_rate: 0,
        channels: 0,
        timestamp_ms: 0,
    };

    assert_eq!(frame.duration_ms(), 0);
}

#[test]
fn test_audio_frame_duration_ms() {
    let frame = AudioFrame {
        samples: vec![0i16; 3200],
        sample_rate: 16000,
        channels: 2,
        timestamp_ms: 0,
    };

    assert_eq!(frame.duration_ms(), 100);
}

#[test]
fn test_audio_backend_config_from_recording_config() {
    let recording = RecordingConfig {
        sample_rate: 44100,
        channels: 2,
        buffer_duration_ms: 20,
        ..RecordingConfig::default()
    };

    let config = AudioBackendConfig::from(&recording);

    assert_eq!(config.target_sample_rate, 44100);
    assert_eq!(config.target_channels, 2);
    assert_eq!(config.buffer_duration_ms, 20);
}

#[tokio::test(start_paused = true)]
async fn test_tone_backend_delivers_buffer_sized_frames() {
    let mut backend = ToneBackend::new(AudioBackendConfig::default()).with_tone(1000.0, 0.5);
    let mut frames = backend.start().await.unwrap();
    assert!(backend.is_capturing());
    assert_eq!(backend.name(), "tone");

    let first = frames.recv().await.unwrap();
    let second = frames.recv().await.unwrap();
    assert_eq!(first.samples.len(), 1600);
    assert_eq!(first.duration_ms(), 100);
    assert_eq!(second.timestamp_ms, 100);
    assert!(first.samples.iter().any(|&s| s != 0));

    backend.stop().await.unwrap();
    assert!(!backend.is_capturing());
    tokio::time::sleep(Duration::from_millis(10)).await;

    // The channel closes once the capture task is gone
    while frames.recv().await.is_some() {}
}

#[tokio::test(start_paused = true)]
async fn test_tone_backend_rejects_double_start() {
    let mut backend = ToneBackend::new(AudioBackendConfig::default());
    let _frames = backend.start().await.unwrap();

    assert!(backend.start().await.is_err());
    backend.stop().await.unwrap();
}
