use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub playback: PlaybackConfig,
    pub recording: RecordingConfig,
    pub transcription: TranscriptionConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Cadence of the fine timeline observer
    pub timeline_interval_ms: u64,
    /// Cadence of the coarse "heard" progress observer
    pub progress_interval_secs: u64,
}

impl PlaybackConfig {
    pub fn timeline_interval(&self) -> Duration {
        Duration::from_millis(self.timeline_interval_ms)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_secs(self.progress_interval_secs)
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            timeline_interval_ms: 100,
            progress_interval_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Directory holding the capture artifact; `~` is expanded
    pub storage_dir: String,
    /// Artifact file name, overwritten by every session
    pub file_name: String,
    /// Period of the elapsed-time tick
    pub tick_interval_ms: u64,
    pub sample_rate: u32,
    pub channels: u16,
    pub buffer_duration_ms: u64,
}

impl RecordingConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Well-known location of the capture artifact.
    pub fn recording_location(&self) -> PathBuf {
        let dir = shellexpand::tilde(&self.storage_dir);
        PathBuf::from(dir.as_ref()).join(&self.file_name)
    }
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            storage_dir: "~/.audio-session".to_string(),
            file_name: "recording.wav".to_string(),
            tick_interval_ms: 1000,
            sample_rate: 16000, // speech-to-text expects 16kHz
            channels: 1,
            buffer_duration_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    /// NATS server for the speech-to-text bridge; unset disables transcription
    pub nats_url: Option<String>,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
