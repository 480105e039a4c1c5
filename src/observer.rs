//! Named observer slots backed by tokio tasks.
//!
//! Each slot holds at most one task. Installing into an occupied slot aborts
//! the previous task first, and dropping the registry aborts everything it
//! still holds, so an observer can never outlive the resource it watches.

use std::collections::HashMap;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObserverKind {
    /// One-shot wait for a freshly opened media handle to become playable
    Readiness,
    /// Fine-grained timeline (~100 ms)
    Timeline,
    /// Coarse "heard" progress (~5 s)
    Milestone,
    /// Caller-configured player info cadence
    PlayerInfo,
    /// End-of-media notification
    Finished,
    /// Recorder one-second elapsed tick
    ElapsedTick,
    /// Caller-configured recorder metering cadence
    Metering,
}

impl ObserverKind {
    pub fn is_periodic(self) -> bool {
        !matches!(self, ObserverKind::Readiness | ObserverKind::Finished)
    }
}

#[derive(Debug, Default)]
pub struct ObserverRegistry {
    slots: HashMap<ObserverKind, JoinHandle<()>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `handle` into the slot for `kind`, aborting whatever was there.
    pub fn install(&mut self, kind: ObserverKind, handle: JoinHandle<()>) {
        if let Some(previous) = self.slots.insert(kind, handle) {
            debug!("Replacing {:?} observer", kind);
            previous.abort();
        }
    }

    /// Forget the observer of `kind` without aborting it.
    ///
    /// Used by a task that is tearing down its own slot.
    pub fn release(&mut self, kind: ObserverKind) {
        self.slots.remove(&kind);
    }

    /// Whether the slot holds a task that is still running.
    pub fn is_active(&self, kind: ObserverKind) -> bool {
        self.slots
            .get(&kind)
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Number of live periodic observers.
    pub fn periodic_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|(kind, handle)| kind.is_periodic() && !handle.is_finished())
            .count()
    }

    pub fn clear(&mut self) {
        for (_, handle) in self.slots.drain() {
            handle.abort();
        }
    }
}

impl Drop for ObserverRegistry {
    fn drop(&mut self) {
        self.clear();
    }
}

/// Spawn a task that calls `tick` every `period`, starting one period from now.
///
/// A zero period is bumped to one millisecond, because tokio intervals reject zero.
pub fn spawn_periodic<F>(period: Duration, mut tick: F) -> JoinHandle<()>
where
    F: FnMut() + Send + 'static,
{
    let period = period.max(Duration::from_millis(1));

    tokio::spawn(async move {
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            tick();
        }
    })
}
