use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, error, info};

/// How often a finished handle is checked for having been moved off its end
const REARM_POLL: Duration = Duration::from_millis(250);

use super::player::{MediaBackend, MediaPlayer, MediaSource};
use super::snapshot::{PlaybackSnapshot, ProgressMilestone, TimelineUpdate};
use crate::config::PlaybackConfig;
use crate::error::{AudioError, AudioResult};
use crate::events::{AudioEvent, EventSink, Notifier};
use crate::observer::{spawn_periodic, ObserverKind, ObserverRegistry};
use crate::session::{ensure_category, AudioSessionControl, CategoryOptions, SessionCategory};
use crate::time::usable_duration;

/// What to play and how to start it.
#[derive(Debug, Clone)]
pub struct PlayRequest {
    pub source: MediaSource,
    /// Rate committed when the media becomes ready
    pub rate: f32,
    /// Fraction of the duration to start from
    pub start_fraction: f64,
}

impl PlayRequest {
    pub fn new(source: MediaSource) -> Self {
        Self {
            source,
            rate: 1.0,
            start_fraction: 0.0,
        }
    }

    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = rate;
        self
    }

    pub fn starting_at(mut self, fraction: f64) -> Self {
        self.start_fraction = fraction;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlaybackState {
    Idle,
    Preparing,
    Ready,
    Playing,
    Paused,
}

/// The media handle currently owned by the engine.
struct ActivePlayback {
    generation: u64,
    // Declared before `player` so observers drop first
    observers: ObserverRegistry,
    player: Arc<dyn MediaPlayer>,
    ready: bool,
    paused: bool,
    /// Rate requested while preparing, applied at readiness
    pending_rate: Option<f32>,
}

impl ActivePlayback {
    fn teardown(mut self) {
        debug!("Tearing down media handle (generation {})", self.generation);
        self.observers.clear();
        self.player.pause();
    }

    fn state(&self) -> PlaybackState {
        if !self.ready {
            PlaybackState::Preparing
        } else if self.player.is_playing() {
            PlaybackState::Playing
        } else if self.paused || self.player.position() > 0.0 {
            PlaybackState::Paused
        } else {
            PlaybackState::Ready
        }
    }
}

type ActiveSlot = Arc<Mutex<Option<ActivePlayback>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Media playback with periodic progress reporting.
///
/// Owns at most one media handle. Every handle carries its own observers
/// (timeline, milestone, end-of-media and optionally player info), which are
/// aborted before the handle is released.
pub struct PlaybackEngine {
    backend: Arc<dyn MediaBackend>,
    session: Arc<dyn AudioSessionControl>,
    config: PlaybackConfig,
    notifier: Notifier,
    generation: Arc<AtomicU64>,
    active: ActiveSlot,
    info_interval: Mutex<Option<Duration>>,
}

impl PlaybackEngine {
    pub fn new(
        backend: Arc<dyn MediaBackend>,
        session: Arc<dyn AudioSessionControl>,
        config: PlaybackConfig,
    ) -> Self {
        Self {
            backend,
            session,
            config,
            notifier: Notifier::new(),
            generation: Arc::new(AtomicU64::new(0)),
            active: Arc::new(Mutex::new(None)),
            info_interval: Mutex::new(None),
        }
    }

    pub fn set_event_sink(&self, sink: &Arc<dyn EventSink>) {
        self.notifier.attach(sink);
    }

    /// Replace whatever is playing with `request.source`.
    ///
    /// `on_ready` receives the outcome once the media is playable, after the
    /// start position and rate have been applied. It is dropped without being
    /// called if another `play` supersedes this one first.
    pub fn play<F>(&self, request: PlayRequest, on_ready: F)
    where
        F: FnOnce(AudioResult<()>) + Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.teardown_active();

        info!(
            "Preparing {} (rate {}, start {:.3}, generation {})",
            request.source.url, request.rate, request.start_fraction, generation
        );

        if let Err(e) = ensure_category(
            self.session.as_ref(),
            SessionCategory::can_play,
            SessionCategory::Playback,
            CategoryOptions::default(),
        ) {
            error!("Cannot configure audio session for playback: {}", e);
            on_ready(Err(e));
            return;
        }

        let player = match self.backend.open(&request.source) {
            Ok(player) => player,
            Err(e) => {
                error!("Failed to open {}: {:#}", request.source.url, e);
                on_ready(Err(AudioError::resource(e)));
                return;
            }
        };

        let mut observers = ObserverRegistry::new();
        observers.install(ObserverKind::Timeline, self.spawn_timeline(&player));
        observers.install(ObserverKind::Milestone, self.spawn_milestone(&player));
        observers.install(ObserverKind::Finished, self.spawn_finished(&player));
        if let Some(period) = *lock(&self.info_interval) {
            observers.install(ObserverKind::PlayerInfo, self.spawn_player_info(&player, period));
        }

        // Filled before the readiness task can look at it
        let mut slot = lock(&self.active);
        observers.install(
            ObserverKind::Readiness,
            self.spawn_readiness(generation, Arc::clone(&player), &request, on_ready),
        );
        *slot = Some(ActivePlayback {
            generation,
            observers,
            player,
            ready: false,
            paused: false,
            pending_rate: None,
        });
    }

    pub fn pause(&self) {
        if let Some(active) = lock(&self.active).as_mut() {
            active.player.pause();
            active.paused = true;
        }
    }

    pub fn resume(&self) {
        if let Some(active) = lock(&self.active).as_mut() {
            active.player.play();
            active.paused = false;
        }
    }

    /// Seek to `percentage` of the duration.
    ///
    /// The percentage is passed through unclamped; the player applies its own bounds.
    pub fn seek(&self, percentage: f64) {
        let slot = lock(&self.active);
        let Some(active) = slot.as_ref() else {
            return;
        };

        match usable_duration(active.player.duration()) {
            Some(duration) => active.player.seek(percentage * duration),
            None => debug!("Ignoring seek: duration is not known yet"),
        }
    }

    /// Step back by `by`, never past the start of the media.
    pub fn rewind(&self, by: Duration) {
        if let Some(active) = lock(&self.active).as_ref() {
            let target = (active.player.position() - by.as_secs_f64()).max(0.0);
            active.player.seek(target);
        }
    }

    /// Change the rate. Before the media is ready the rate replaces the one
    /// the media will start at.
    pub fn set_playback_speed(&self, rate: f32) {
        if let Some(active) = lock(&self.active).as_mut() {
            if !active.ready {
                active.pending_rate = Some(rate);
            } else if active.player.is_playing() {
                active.player.play();
                active.player.set_rate(rate);
            } else {
                active.player.set_rate(rate);
                active.player.pause();
            }
        }
    }

    /// Report `PlayerInfo` every `period`, replacing the previous cadence.
    ///
    /// The cadence is kept for media loaded later.
    pub fn set_subscription_frequency(&self, period: Duration) {
        *lock(&self.info_interval) = Some(period);

        let mut slot = lock(&self.active);
        if let Some(active) = slot.as_mut() {
            let handle = self.spawn_player_info(&active.player, period);
            active.observers.install(ObserverKind::PlayerInfo, handle);
        }
    }

    pub fn player_info(&self) -> PlaybackSnapshot {
        match lock(&self.active).as_ref() {
            Some(active) => PlaybackSnapshot::capture(active.player.as_ref()),
            None => PlaybackSnapshot::empty(),
        }
    }

    pub fn state(&self) -> PlaybackState {
        lock(&self.active)
            .as_ref()
            .map(ActivePlayback::state)
            .unwrap_or(PlaybackState::Idle)
    }

    /// Live periodic observers attached to the current media.
    pub fn observer_count(&self) -> usize {
        lock(&self.active)
            .as_ref()
            .map(|active| active.observers.periodic_count())
            .unwrap_or(0)
    }

    /// Release the current media, if any.
    pub fn stop(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.teardown_active();
    }

    fn teardown_active(&self) {
        let previous = lock(&self.active).take();
        if let Some(previous) = previous {
            previous.teardown();
        }
    }

    fn spawn_readiness<F>(
        &self,
        generation: u64,
        player: Arc<dyn MediaPlayer>,
        request: &PlayRequest,
        on_ready: F,
    ) -> JoinHandle<()>
    where
        F: FnOnce(AudioResult<()>) + Send + 'static,
    {
        let active = Arc::clone(&self.active);
        let latest = Arc::clone(&self.generation);
        let rate = request.rate;
        let start_fraction = request.start_fraction;
        let url = request.source.url.clone();

        tokio::spawn(async move {
            let outcome = player.ready().await;

            let mut slot = lock(&active);
            let is_current = latest.load(Ordering::SeqCst) == generation
                && slot.as_ref().map(|a| a.generation) == Some(generation);
            if !is_current {
                debug!("Ignoring readiness of superseded media (generation {})", generation);
                return;
            }

            match outcome {
                Ok(()) => {
                    let rate = slot
                        .as_ref()
                        .and_then(|current| current.pending_rate)
                        .unwrap_or(rate);

                    // Position and rate must both be in place before the first frame
                    if let Some(duration) = usable_duration(player.duration()) {
                        player.seek(start_fraction * duration);
                    }
                    player.play_at_rate(rate);

                    if let Some(current) = slot.as_mut() {
                        current.ready = true;
                        current.observers.release(ObserverKind::Readiness);
                    }
                    drop(slot);

                    info!("Playing {} at rate {}", url, rate);
                    on_ready(Ok(()));
                }
                Err(e) => {
                    let failed = slot.take();
                    drop(slot);

                    if let Some(mut failed) = failed {
                        failed.observers.release(ObserverKind::Readiness);
                        failed.teardown();
                    }

                    error!("Media {} failed to become ready: {:#}", url, e);
                    on_ready(Err(AudioError::resource(e)));
                }
            }
        })
    }

    fn spawn_timeline(&self, player: &Arc<dyn MediaPlayer>) -> JoinHandle<()> {
        let player = Arc::clone(player);
        let notifier = self.notifier.clone();
        let mut last: Option<TimelineUpdate> = None;

        spawn_periodic(self.config.timeline_interval(), move || {
            if usable_duration(player.duration()).is_none() {
                return;
            }
            let update = TimelineUpdate::capture(player.as_ref());
            if last.as_ref() != Some(&update) {
                last = Some(update.clone());
                notifier.notify(AudioEvent::TimelineChanged(update));
            }
        })
    }

    fn spawn_milestone(&self, player: &Arc<dyn MediaPlayer>) -> JoinHandle<()> {
        let player = Arc::clone(player);
        let notifier = self.notifier.clone();

        spawn_periodic(self.config.progress_interval(), move || {
            if let Some(milestone) = ProgressMilestone::capture(player.as_ref()) {
                notifier.notify(AudioEvent::ProgressMilestone(milestone));
            }
        })
    }

    fn spawn_player_info(&self, player: &Arc<dyn MediaPlayer>, period: Duration) -> JoinHandle<()> {
        let player = Arc::clone(player);
        let notifier = self.notifier.clone();

        spawn_periodic(period, move || {
            let snapshot = PlaybackSnapshot::capture(player.as_ref());
            notifier.notify(AudioEvent::PlayerInfo(snapshot));
        })
    }

    fn spawn_finished(&self, player: &Arc<dyn MediaPlayer>) -> JoinHandle<()> {
        let player = Arc::clone(player);
        let notifier = self.notifier.clone();

        tokio::spawn(async move {
            loop {
                player.finished().await;
                info!("Playback reached the end of the media");
                notifier.notify(AudioEvent::PlayerFinished);

                // Re-arm once the media has been moved back from its end
                loop {
                    time::sleep(REARM_POLL).await;
                    if let Some(duration) = usable_duration(player.duration()) {
                        if player.position() < duration {
                            break;
                        }
                    }
                }
            }
        })
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        self.teardown_active();
    }
}
