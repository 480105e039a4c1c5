// Shared fakes for the engine integration tests

#![allow(dead_code)]

use anyhow::{bail, Result};
use audio_session::playback::{MediaBackend, MediaPlayer, MediaSource};
use audio_session::recording::{Recorder, RecorderFactory, Transcriber, TranscriptionOutcome};
use audio_session::session::{AudioSessionControl, CategoryOptions, SessionCategory};
use audio_session::{AudioEvent, EventSink};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Sink that collects events for inspection.
pub struct EventLog {
    pub sink: Arc<dyn EventSink>,
    rx: mpsc::UnboundedReceiver<AudioEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            sink: Arc::new(tx),
            rx,
        }
    }

    /// Everything received since the last drain
    pub fn drain(&mut self) -> Vec<AudioEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}

/// Session whose category can never be changed.
pub struct FailingSession;

impl AudioSessionControl for FailingSession {
    fn current_category_name(&self) -> Option<String> {
        Some("ambient".to_string())
    }

    fn set_category(&self, category: SessionCategory, _options: CategoryOptions) -> Result<()> {
        bail!("category {} rejected", category)
    }

    fn set_active(&self, _active: bool) -> Result<()> {
        Ok(())
    }
}

pub struct FakeRecorder {
    location: PathBuf,
    recording: AtomicBool,
    metering: AtomicBool,
    refuse_record: bool,
    pub stops: AtomicUsize,
    pub deleted: AtomicBool,
}

impl FakeRecorder {
    pub fn metering_enabled(&self) -> bool {
        self.metering.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Recorder for FakeRecorder {
    fn location(&self) -> &Path {
        &self.location
    }

    fn record(&self) -> Result<()> {
        if self.refuse_record {
            bail!("input device unavailable");
        }
        self.recording.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn pause(&self) {
        self.recording.store(false, Ordering::SeqCst);
    }

    fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }

    fn set_metering_enabled(&self, enabled: bool) {
        self.metering.store(enabled, Ordering::SeqCst);
    }

    fn level(&self) -> Option<f32> {
        self.metering_enabled().then_some(-20.0)
    }

    async fn stop(&self) -> Result<()> {
        self.recording.store(false, Ordering::SeqCst);
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn delete_recording(&self) -> Result<()> {
        self.deleted.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeRecorderFactory {
    fail: bool,
    refuse_record: bool,
    created: Mutex<Vec<Arc<FakeRecorder>>>,
}

impl FakeRecorderFactory {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Hands out recorders that cannot start capturing
    pub fn refusing_record() -> Self {
        Self {
            refuse_record: true,
            ..Self::default()
        }
    }

    pub fn created(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    pub fn last(&self) -> Arc<FakeRecorder> {
        self.created.lock().unwrap().last().cloned().expect("no recorder created")
    }
}

#[async_trait::async_trait]
impl RecorderFactory for FakeRecorderFactory {
    async fn create(&self, location: &Path) -> Result<Arc<dyn Recorder>> {
        if self.fail {
            bail!("microphone busy");
        }

        let recorder = Arc::new(FakeRecorder {
            location: location.to_path_buf(),
            recording: AtomicBool::new(false),
            metering: AtomicBool::new(false),
            refuse_record: self.refuse_record,
            stops: AtomicUsize::new(0),
            deleted: AtomicBool::new(false),
        });
        self.created.lock().unwrap().push(Arc::clone(&recorder));
        Ok(recorder)
    }
}

pub struct FakeTranscriber {
    outcome: TranscriptionOutcome,
    pub calls: AtomicUsize,
}

impl FakeTranscriber {
    pub fn new(outcome: TranscriptionOutcome) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, _location: &Path) -> TranscriptionOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

/// Media that is ready at once and remembers every seek target.
pub struct SeekLog {
    duration: f64,
    position: Mutex<f64>,
    seeks: Mutex<Vec<f64>>,
}

impl SeekLog {
    pub fn new(duration: f64) -> Arc<Self> {
        Arc::new(Self {
            duration,
            position: Mutex::new(0.0),
            seeks: Mutex::new(Vec::new()),
        })
    }

    pub fn seeks(&self) -> Vec<f64> {
        self.seeks.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl MediaPlayer for SeekLog {
    async fn ready(&self) -> Result<()> {
        Ok(())
    }

    async fn finished(&self) {
        std::future::pending::<()>().await
    }

    fn position(&self) -> f64 {
        *self.position.lock().unwrap()
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn is_playing(&self) -> bool {
        false
    }

    fn playback_rate(&self) -> f32 {
        0.0
    }

    fn play(&self) {}

    fn pause(&self) {}

    fn play_at_rate(&self, _rate: f32) {}

    fn set_rate(&self, _rate: f32) {}

    fn seek(&self, seconds: f64) {
        self.seeks.lock().unwrap().push(seconds);
        *self.position.lock().unwrap() = seconds;
    }
}

/// Backend that always opens the same `SeekLog`.
pub struct SeekLogBackend(pub Arc<SeekLog>);

impl MediaBackend for SeekLogBackend {
    fn open(&self, _source: &MediaSource) -> Result<Arc<dyn MediaPlayer>> {
        Ok(Arc::clone(&self.0) as Arc<dyn MediaPlayer>)
    }
}
