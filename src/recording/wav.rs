use anyhow::{anyhow, Context, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::recorder::{Recorder, RecorderFactory};
use crate::audio::{average_power_dbfs, AudioBackend, AudioBackendConfig, AudioFrame, ToneBackend};

type BackendBuilder = dyn Fn(AudioBackendConfig) -> Result<Box<dyn AudioBackend>> + Send + Sync;

/// Creates `WavRecorder`s on top of a fresh `AudioBackend` per session.
pub struct WavRecorderFactory {
    config: AudioBackendConfig,
    build_backend: Box<BackendBuilder>,
}

impl WavRecorderFactory {
    pub fn new<F>(config: AudioBackendConfig, build_backend: F) -> Self
    where
        F: Fn(AudioBackendConfig) -> Result<Box<dyn AudioBackend>> + Send + Sync + 'static,
    {
        Self {
            config,
            build_backend: Box::new(build_backend),
        }
    }

    /// Factory capturing a synthetic tone.
    pub fn tone(config: AudioBackendConfig) -> Self {
        Self::new(config, |config| {
            Ok(Box::new(ToneBackend::new(config)) as Box<dyn AudioBackend>)
        })
    }
}

#[async_trait::async_trait]
impl RecorderFactory for WavRecorderFactory {
    async fn create(&self, location: &Path) -> Result<Arc<dyn Recorder>> {
        if let Some(dir) = location.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create recording directory: {:?}", dir))?;
        }

        let spec = WavSpec {
            channels: self.config.target_channels,
            sample_rate: self.config.target_sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        // Truncates the artifact of any previous session
        let writer = WavWriter::create(location, spec)
            .with_context(|| format!("Failed to create WAV file: {:?}", location))?;

        let mut backend = (self.build_backend)(self.config.clone())?;
        let frames = backend
            .start()
            .await
            .with_context(|| format!("Failed to start {} capture", backend.name()))?;

        info!(
            "WAV recorder ready at {} ({}Hz, {} channels, {} backend)",
            location.display(),
            spec.sample_rate,
            spec.channels,
            backend.name()
        );

        Ok(Arc::new(WavRecorder::spawn(
            location.to_path_buf(),
            backend,
            frames,
            writer,
        )))
    }
}

struct Shared {
    recording: AtomicBool,
    metering: AtomicBool,
    // f32 bits; NaN until a level has been measured
    level: AtomicU32,
}

/// Capture handle that writes backend frames to a 16-bit PCM WAV file.
///
/// Frames that arrive while paused are dropped, so the artifact only holds
/// audio captured while recording.
pub struct WavRecorder {
    location: PathBuf,
    shared: Arc<Shared>,
    stop_tx: Mutex<Option<oneshot::Sender<()>>>,
    writer_task: Mutex<Option<JoinHandle<Result<u64>>>>,
}

impl WavRecorder {
    fn spawn(
        location: PathBuf,
        backend: Box<dyn AudioBackend>,
        frames: mpsc::Receiver<AudioFrame>,
        writer: WavWriter<BufWriter<File>>,
    ) -> Self {
        let shared = Arc::new(Shared {
            recording: AtomicBool::new(false),
            metering: AtomicBool::new(false),
            level: AtomicU32::new(f32::NAN.to_bits()),
        });
        let (stop_tx, stop_rx) = oneshot::channel();

        let task = tokio::spawn(write_frames(
            backend,
            frames,
            writer,
            Arc::clone(&shared),
            stop_rx,
        ));

        Self {
            location,
            shared,
            stop_tx: Mutex::new(Some(stop_tx)),
            writer_task: Mutex::new(Some(task)),
        }
    }
}

async fn write_frames(
    mut backend: Box<dyn AudioBackend>,
    mut frames: mpsc::Receiver<AudioFrame>,
    mut writer: WavWriter<BufWriter<File>>,
    shared: Arc<Shared>,
    mut stop_rx: oneshot::Receiver<()>,
) -> Result<u64> {
    let mut written_ms: u64 = 0;
    let mut failure = None;

    loop {
        tokio::select! {
            _ = &mut stop_rx => break,
            frame = frames.recv() => {
                let Some(frame) = frame else { break };
                if !shared.recording.load(Ordering::SeqCst) {
                    continue;
                }

                if let Err(e) = write_frame(&mut writer, &frame) {
                    failure = Some(e);
                    break;
                }
                written_ms += frame.duration_ms();

                if shared.metering.load(Ordering::SeqCst) {
                    let level = average_power_dbfs(&frame.samples);
                    shared.level.store(level.to_bits(), Ordering::SeqCst);
                }
            }
        }
    }

    if let Err(e) = backend.stop().await {
        warn!("Failed to stop {} capture: {:#}", backend.name(), e);
    }

    if let Some(e) = failure {
        return Err(e);
    }

    writer.finalize().context("Failed to finalize WAV file")?;
    Ok(written_ms)
}

fn write_frame(writer: &mut WavWriter<BufWriter<File>>, frame: &AudioFrame) -> Result<()> {
    for &sample in &frame.samples {
        writer
            .write_sample(sample)
            .context("Failed to write sample to WAV")?;
    }
    Ok(())
}

#[async_trait::async_trait]
impl Recorder for WavRecorder {
    fn location(&self) -> &Path {
        &self.location
    }

    fn record(&self) -> Result<()> {
        let stopped = self
            .stop_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none();
        if stopped {
            return Err(anyhow!("Recorder at {} is already stopped", self.location.display()));
        }

        self.shared.recording.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn pause(&self) {
        self.shared.recording.store(false, Ordering::SeqCst);
    }

    fn is_recording(&self) -> bool {
        self.shared.recording.load(Ordering::SeqCst)
    }

    fn set_metering_enabled(&self, enabled: bool) {
        self.shared.metering.store(enabled, Ordering::SeqCst);
    }

    fn level(&self) -> Option<f32> {
        if !self.shared.metering.load(Ordering::SeqCst) {
            return None;
        }
        let level = f32::from_bits(self.shared.level.load(Ordering::SeqCst));
        (!level.is_nan()).then_some(level)
    }

    async fn stop(&self) -> Result<()> {
        self.shared.recording.store(false, Ordering::SeqCst);

        let stop_tx = self
            .stop_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(stop_tx) = stop_tx {
            let _ = stop_tx.send(());
        }

        let task = self
            .writer_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(task) = task else {
            return Ok(());
        };

        match task.await {
            Ok(Ok(written_ms)) => {
                info!("Recording saved to {} ({}ms of audio)", self.location.display(), written_ms);
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(e) => {
                error!("WAV writer task panicked: {}", e);
                Err(anyhow!("WAV writer task failed: {}", e))
            }
        }
    }

    fn delete_recording(&self) -> Result<()> {
        match fs::remove_file(&self.location) {
            Ok(()) => {
                info!("Deleted recording {}", self.location.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to delete recording: {:?}", self.location)),
        }
    }
}
