use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::recorder::{Recorder, RecorderFactory};
use super::transcription::{Transcriber, TranscriptionOutcome};
use crate::config::RecordingConfig;
use crate::error::{AudioError, AudioResult};
use crate::events::{AudioEvent, EventSink, Notifier};
use crate::observer::{spawn_periodic, ObserverKind, ObserverRegistry};
use crate::session::{
    ensure_category, restore_category, AudioSessionControl, CategoryOptions, PermissionProvider,
    PermissionState, SessionCategory,
};

/// Outcome of a completed recording session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioRecordingResult {
    pub location: PathBuf,
    pub transcription: Option<String>,
    pub recorded_duration_ms: u64,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeteringUpdate {
    /// Average power in dBFS, when available
    pub level: Option<f32>,
    pub duration_seconds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordingState {
    Idle,
    Recording,
    Paused,
}

struct ActiveRecording {
    // Declared before `recorder` so observers drop first
    observers: ObserverRegistry,
    recorder: Arc<dyn Recorder>,
    /// Category to put back when the session ends
    replaced_category: Option<SessionCategory>,
}

/// Voice recording with an elapsed-time tick, live metering and
/// transcription of the finished artifact.
pub struct RecordingEngine {
    factory: Arc<dyn RecorderFactory>,
    permissions: Arc<dyn PermissionProvider>,
    session: Arc<dyn AudioSessionControl>,
    transcriber: Arc<dyn Transcriber>,
    config: RecordingConfig,
    notifier: Notifier,
    elapsed: Arc<AtomicU64>,
    active: tokio::sync::Mutex<Option<ActiveRecording>>,
    metering_interval: Mutex<Option<Duration>>,
}

impl RecordingEngine {
    pub fn new(
        factory: Arc<dyn RecorderFactory>,
        permissions: Arc<dyn PermissionProvider>,
        session: Arc<dyn AudioSessionControl>,
        transcriber: Arc<dyn Transcriber>,
        config: RecordingConfig,
    ) -> Self {
        Self {
            factory,
            permissions,
            session,
            transcriber,
            config,
            notifier: Notifier::new(),
            elapsed: Arc::new(AtomicU64::new(0)),
            active: tokio::sync::Mutex::new(None),
            metering_interval: Mutex::new(None),
        }
    }

    pub fn set_event_sink(&self, sink: &Arc<dyn EventSink>) {
        self.notifier.attach(sink);
    }

    pub async fn request_permission(&self) -> bool {
        let granted = self.permissions.request().await;
        info!("Microphone permission granted: {}", granted);
        granted
    }

    pub fn permission_state(&self) -> PermissionState {
        self.permissions.current_state()
    }

    /// Start a session, or resume the current one.
    ///
    /// The capture handle is created only when no session exists, so calling
    /// this while recording or paused continues the same artifact.
    pub async fn start_or_resume_recording(&self) -> AudioResult<()> {
        if !self.permissions.current_state().is_granted() {
            warn!("Refusing to record without microphone permission");
            return Err(AudioError::PermissionDenied);
        }

        let mut slot = self.active.lock().await;

        let replaced = ensure_category(
            self.session.as_ref(),
            SessionCategory::can_record,
            SessionCategory::PlayAndRecord,
            CategoryOptions::for_recording(),
        )?;

        let active = match slot.take() {
            Some(mut active) => {
                if active.replaced_category.is_none() {
                    active.replaced_category = replaced;
                }
                active
            }
            None => {
                let location = self.config.recording_location();
                info!("Starting recording session at {}", location.display());

                let recorder = match self.factory.create(&location).await {
                    Ok(recorder) => recorder,
                    Err(e) => {
                        if let Some(previous) = replaced {
                            restore_category(self.session.as_ref(), previous);
                        }
                        return Err(AudioError::resource(e));
                    }
                };

                // A handle that never started is not a session
                if let Err(e) = recorder.record() {
                    if let Err(stop) = recorder.stop().await {
                        warn!("Recorder did not stop cleanly: {:#}", stop);
                    }
                    if let Err(discard) = recorder.delete_recording() {
                        warn!("Failed to discard recording: {:#}", discard);
                    }
                    if let Some(previous) = replaced {
                        restore_category(self.session.as_ref(), previous);
                    }
                    return Err(AudioError::resource(e));
                }

                ActiveRecording {
                    observers: ObserverRegistry::new(),
                    recorder,
                    replaced_category: replaced,
                }
            }
        };
        let resumed = active.recorder.is_recording();
        let active = slot.insert(active);

        if !resumed {
            active.recorder.record().map_err(AudioError::resource)?;
        }

        if !active.observers.is_active(ObserverKind::ElapsedTick) {
            let tick = self.spawn_tick(&active.recorder);
            active.observers.install(ObserverKind::ElapsedTick, tick);
        }

        active.recorder.set_metering_enabled(true);
        let metering = *self
            .metering_interval
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(period) = metering {
            if !active.observers.is_active(ObserverKind::Metering) {
                let handle = self.spawn_metering(&active.recorder, period);
                active.observers.install(ObserverKind::Metering, handle);
            }
        }

        info!(
            "Recording ({}s elapsed)",
            self.elapsed.load(Ordering::SeqCst)
        );
        Ok(())
    }

    /// Pause capture. The elapsed counter and its tick are kept.
    pub async fn pause_recording(&self) {
        if let Some(active) = self.active.lock().await.as_ref() {
            active.recorder.pause();
            info!(
                "Recording paused at {}s",
                self.elapsed.load(Ordering::SeqCst)
            );
        }
    }

    /// Report metering every `period`, replacing the previous cadence.
    pub async fn set_subscription_frequency(&self, period: Duration) {
        *self
            .metering_interval
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(period);

        if let Some(active) = self.active.lock().await.as_mut() {
            let handle = self.spawn_metering(&active.recorder, period);
            active.observers.install(ObserverKind::Metering, handle);
        }
    }

    /// Finish the session and transcribe it.
    ///
    /// Resolves to `None` when no session is active. A transcription that is
    /// unavailable or fails leaves `transcription` empty rather than failing
    /// the session.
    pub async fn end_recording_session(&self) -> Option<AudioRecordingResult> {
        let mut slot = self.active.lock().await;
        let Some(mut active) = slot.take() else {
            info!("No recording session to end");
            return None;
        };

        active.observers.clear();
        let recorded_duration_ms = self.reset_elapsed() * 1000;

        if let Err(e) = active.recorder.stop().await {
            warn!("Recorder did not stop cleanly: {:#}", e);
        }
        if let Some(previous) = active.replaced_category {
            restore_category(self.session.as_ref(), previous);
        }

        let location = active.recorder.location().to_path_buf();
        drop(active);
        drop(slot);

        info!(
            "Recording session ended ({}ms), transcribing {}",
            recorded_duration_ms,
            location.display()
        );

        let transcription = match self.transcriber.transcribe(&location).await {
            TranscriptionOutcome::Text(text) => Some(text),
            TranscriptionOutcome::Unavailable => {
                info!("Transcription unavailable, completing without it");
                None
            }
            TranscriptionOutcome::Failed(reason) => {
                warn!("Transcription failed, completing without it: {}", reason);
                None
            }
        };

        Some(AudioRecordingResult {
            location,
            transcription,
            recorded_duration_ms,
            finished_at: Utc::now(),
        })
    }

    /// Abandon the session and discard its artifact.
    pub async fn delete_recording_session(&self) {
        let mut slot = self.active.lock().await;
        let Some(mut active) = slot.take() else {
            return;
        };

        active.observers.clear();
        self.reset_elapsed();

        if let Err(e) = active.recorder.stop().await {
            warn!("Recorder did not stop cleanly: {:#}", e);
        }
        if let Err(e) = active.recorder.delete_recording() {
            warn!("Failed to discard recording: {:#}", e);
        }
        if let Some(previous) = active.replaced_category {
            restore_category(self.session.as_ref(), previous);
        }

        info!("Recording session deleted");
    }

    pub async fn state(&self) -> RecordingState {
        match self.active.lock().await.as_ref() {
            Some(active) if active.recorder.is_recording() => RecordingState::Recording,
            Some(_) => RecordingState::Paused,
            None => RecordingState::Idle,
        }
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed.load(Ordering::SeqCst)
    }

    /// Live periodic observers attached to the current session.
    pub async fn observer_count(&self) -> usize {
        self.active
            .lock()
            .await
            .as_ref()
            .map(|active| active.observers.periodic_count())
            .unwrap_or(0)
    }

    fn reset_elapsed(&self) -> u64 {
        let seconds = self.elapsed.swap(0, Ordering::SeqCst);
        self.notifier.notify(AudioEvent::RecorderElapsed { seconds: 0 });
        seconds
    }

    fn spawn_tick(&self, recorder: &Arc<dyn Recorder>) -> JoinHandle<()> {
        let recorder = Arc::clone(recorder);
        let elapsed = Arc::clone(&self.elapsed);
        let notifier = self.notifier.clone();

        spawn_periodic(self.config.tick_interval(), move || {
            if recorder.is_recording() {
                let seconds = elapsed.fetch_add(1, Ordering::SeqCst) + 1;
                notifier.notify(AudioEvent::RecorderElapsed { seconds });
            }
        })
    }

    fn spawn_metering(&self, recorder: &Arc<dyn Recorder>, period: Duration) -> JoinHandle<()> {
        let recorder = Arc::clone(recorder);
        let elapsed = Arc::clone(&self.elapsed);
        let notifier = self.notifier.clone();

        spawn_periodic(period, move || {
            notifier.notify(AudioEvent::RecorderMetering(MeteringUpdate {
                level: recorder.level(),
                duration_seconds: elapsed.load(Ordering::SeqCst),
            }));
        })
    }
}
