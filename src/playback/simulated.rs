//! Clock-driven media player on `tokio::time`.
//!
//! Nothing is decoded; the position is derived from the elapsed time and
//! the rate. Useful for headless hosts and for exercising the engine on a
//! paused test clock.

use anyhow::{bail, Result};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::time::{self, Instant};
use tracing::info;

use super::player::{MediaBackend, MediaPlayer, MediaSource};

const IDLE_POLL: Duration = Duration::from_millis(250);

#[derive(Debug)]
struct Clock {
    ready: bool,
    anchor_position: f64,
    running_since: Option<Instant>,
    rate: f32,
}

#[derive(Debug)]
pub struct SimulatedPlayer {
    source: MediaSource,
    duration: f64,
    ready_delay: Duration,
    failure: Option<String>,
    clock: Mutex<Clock>,
}

impl SimulatedPlayer {
    pub fn new(source: MediaSource, duration: Duration) -> Self {
        Self {
            source,
            duration: duration.as_secs_f64(),
            ready_delay: Duration::ZERO,
            failure: None,
            clock: Mutex::new(Clock {
                ready: false,
                anchor_position: 0.0,
                running_since: None,
                rate: 1.0,
            }),
        }
    }

    pub fn source(&self) -> &MediaSource {
        &self.source
    }

    fn clock(&self) -> MutexGuard<'_, Clock> {
        self.clock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn position_of(&self, clock: &Clock) -> f64 {
        match clock.running_since {
            Some(since) => {
                let advanced = since.elapsed().as_secs_f64() * clock.rate as f64;
                (clock.anchor_position + advanced).min(self.duration)
            }
            None => clock.anchor_position,
        }
    }

    /// Fold the elapsed run time into the anchor so the rate can change.
    fn rebase(&self, clock: &mut Clock) {
        clock.anchor_position = self.position_of(clock);
        if clock.running_since.is_some() {
            clock.running_since = Some(Instant::now());
        }
    }
}

#[async_trait::async_trait]
impl MediaPlayer for SimulatedPlayer {
    async fn ready(&self) -> Result<()> {
        if !self.ready_delay.is_zero() {
            time::sleep(self.ready_delay).await;
        }

        if let Some(reason) = &self.failure {
            bail!("Failed to load {}: {}", self.source.url, reason);
        }

        self.clock().ready = true;
        Ok(())
    }

    async fn finished(&self) {
        loop {
            let wait = {
                let clock = self.clock();
                let position = self.position_of(&clock);
                if clock.ready && position >= self.duration {
                    return;
                }
                match clock.running_since {
                    Some(_) if clock.ready => {
                        let remaining = (self.duration - position) / clock.rate as f64;
                        Duration::from_secs_f64(remaining.max(0.001))
                    }
                    _ => IDLE_POLL,
                }
            };

            time::sleep(wait).await;
        }
    }

    fn position(&self) -> f64 {
        let clock = self.clock();
        self.position_of(&clock)
    }

    fn duration(&self) -> f64 {
        if self.clock().ready {
            self.duration
        } else {
            f64::NAN
        }
    }

    fn is_playing(&self) -> bool {
        let clock = self.clock();
        clock.running_since.is_some() && self.position_of(&clock) < self.duration
    }

    fn playback_rate(&self) -> f32 {
        self.clock().rate
    }

    fn play(&self) {
        let mut clock = self.clock();
        if clock.running_since.is_none() {
            clock.running_since = Some(Instant::now());
        }
    }

    fn pause(&self) {
        let mut clock = self.clock();
        self.rebase(&mut clock);
        clock.running_since = None;
    }

    fn play_at_rate(&self, rate: f32) {
        let mut clock = self.clock();
        self.rebase(&mut clock);
        if rate > 0.0 {
            clock.rate = rate;
            clock.running_since = Some(Instant::now());
        } else {
            clock.running_since = None;
        }
    }

    fn set_rate(&self, rate: f32) {
        let mut clock = self.clock();
        self.rebase(&mut clock);
        if rate > 0.0 {
            clock.rate = rate;
            // Like platform players, a non-zero rate sets the clock running
            if clock.running_since.is_none() {
                clock.running_since = Some(Instant::now());
            }
        } else {
            clock.running_since = None;
        }
    }

    fn seek(&self, seconds: f64) {
        let mut clock = self.clock();
        if !clock.ready || !seconds.is_finite() {
            return;
        }
        clock.anchor_position = seconds.clamp(0.0, self.duration);
        if clock.running_since.is_some() {
            clock.running_since = Some(Instant::now());
        }
    }
}

/// Opens `SimulatedPlayer`s of a fixed duration.
#[derive(Debug)]
pub struct SimulatedBackend {
    duration: Duration,
    ready_delay: Duration,
    failure: Option<String>,
    opened: Mutex<Vec<Weak<SimulatedPlayer>>>,
}

impl SimulatedBackend {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            ready_delay: Duration::ZERO,
            failure: None,
            opened: Mutex::new(Vec::new()),
        }
    }

    /// Delay before opened players report ready
    pub fn with_ready_delay(mut self, delay: Duration) -> Self {
        self.ready_delay = delay;
        self
    }

    /// Make every opened player fail to become ready
    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.failure = Some(reason.into());
        self
    }

    pub fn opened_count(&self) -> usize {
        self.opened.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Players that are still referenced somewhere.
    pub fn live_players(&self) -> usize {
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|player| player.strong_count() > 0)
            .count()
    }
}

impl MediaBackend for SimulatedBackend {
    fn open(&self, source: &MediaSource) -> Result<Arc<dyn MediaPlayer>> {
        info!(
            "Opening simulated media {} ({:.1}s, {} headers)",
            source.url,
            self.duration.as_secs_f64(),
            source.headers.len()
        );

        let mut player = SimulatedPlayer::new(source.clone(), self.duration);
        player.ready_delay = self.ready_delay;
        player.failure = self.failure.clone();

        let player = Arc::new(player);
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::downgrade(&player));

        Ok(player)
    }
}
