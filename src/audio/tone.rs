// Synthetic capture backend: a sine tone delivered in real-time sized frames

use anyhow::{bail, Result};
use std::f64::consts::TAU;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::info;

use super::backend::{AudioBackend, AudioBackendConfig, AudioFrame};

pub struct ToneBackend {
    config: AudioBackendConfig,
    frequency_hz: f64,
    amplitude: f64,
    task: Option<JoinHandle<()>>,
}

impl ToneBackend {
    pub fn new(config: AudioBackendConfig) -> Self {
        Self {
            config,
            frequency_hz: 440.0,
            amplitude: 0.25,
            task: None,
        }
    }

    pub fn with_tone(mut self, frequency_hz: f64, amplitude: f64) -> Self {
        self.frequency_hz = frequency_hz;
        self.amplitude = amplitude.clamp(0.0, 1.0);
        self
    }
}

#[async_trait::async_trait]
impl AudioBackend for ToneBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        if self.task.is_some() {
            bail!("Already capturing");
        }

        let (tx, rx) = mpsc::channel(64);
        let sample_rate = self.config.target_sample_rate;
        let channels = self.config.target_channels.max(1);
        let buffer_ms = self.config.buffer_duration_ms.max(1);
        let frames_per_buffer = (sample_rate as u64 * buffer_ms / 1000) as usize;
        let step = TAU * self.frequency_hz / sample_rate as f64;
        let amplitude = self.amplitude * i16::MAX as f64;

        info!(
            "Starting tone capture ({}Hz, {} channels, {}ms buffers)",
            sample_rate, channels, buffer_ms
        );

        self.task = Some(tokio::spawn(async move {
            let mut interval = time::interval(Duration::from_millis(buffer_ms));
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut phase = 0.0_f64;
            let mut timestamp_ms = 0;

            loop {
                interval.tick().await;

                let mut samples = Vec::with_capacity(frames_per_buffer * channels as usize);
                for _ in 0..frames_per_buffer {
                    let value = (phase.sin() * amplitude) as i16;
                    phase = (phase + step) % TAU;
                    for _ in 0..channels {
                        samples.push(value);
                    }
                }

                let frame = AudioFrame {
                    samples,
                    sample_rate,
                    channels,
                    timestamp_ms,
                };
                if tx.send(frame).await.is_err() {
                    break;
                }
                timestamp_ms += buffer_ms;
            }
        }));

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(task) = self.task.take() {
            task.abort();
            info!("Tone capture stopped");
        }
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.task.is_some()
    }

    fn name(&self) -> &str {
        "tone"
    }
}
