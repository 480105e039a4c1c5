//! Outbound notifications and the non-owning sink they are delivered to.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock, Weak};
use tokio::sync::mpsc;

use crate::playback::{PlaybackSnapshot, ProgressMilestone, TimelineUpdate};
use crate::recording::MeteringUpdate;
use crate::session::RouteChange;

/// Every notification the engines and the session monitor can emit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AudioEvent {
    RouteChanged(RouteChange),
    InterruptionBegan,
    InterruptionEnded { should_resume: bool },
    TimelineChanged(TimelineUpdate),
    ProgressMilestone(ProgressMilestone),
    PlayerFinished,
    PlayerInfo(PlaybackSnapshot),
    RecorderElapsed { seconds: u64 },
    RecorderMetering(MeteringUpdate),
}

/// Receiver of engine notifications.
pub trait EventSink: Send + Sync {
    fn notify(&self, event: AudioEvent);
}

impl EventSink for mpsc::UnboundedSender<AudioEvent> {
    fn notify(&self, event: AudioEvent) {
        // A closed channel means nobody is listening any more
        let _ = self.send(event);
    }
}

/// Shared, non-owning handle to the current event sink.
///
/// Clones share the same slot, so observers spawned before a sink is attached
/// still deliver to it. A missing or dropped sink swallows events silently.
#[derive(Clone, Default)]
pub struct Notifier {
    sink: Arc<RwLock<Option<Weak<dyn EventSink>>>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, sink: &Arc<dyn EventSink>) {
        let mut slot = self.sink.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(Arc::downgrade(sink));
    }

    pub fn notify(&self, event: AudioEvent) {
        let sink = {
            let slot = self.sink.read().unwrap_or_else(PoisonError::into_inner);
            slot.as_ref().and_then(Weak::upgrade)
        };

        if let Some(sink) = sink {
            sink.notify(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notify_without_sink_is_silent() {
        let notifier = Notifier::new();
        notifier.notify(AudioEvent::PlayerFinished);
    }

    #[test]
    fn test_notify_reaches_attached_sink() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink: Arc<dyn EventSink> = Arc::new(tx);

        let notifier = Notifier::new();
        notifier.clone().attach(&sink);
        notifier.notify(AudioEvent::InterruptionBegan);

        assert_eq!(rx.try_recv().unwrap(), AudioEvent::InterruptionBegan);
    }

    #[test]
    fn test_dropped_sink_is_not_kept_alive() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink: Arc<dyn EventSink> = Arc::new(tx);

        let notifier = Notifier::new();
        notifier.attach(&sink);
        drop(sink);

        notifier.notify(AudioEvent::PlayerFinished);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_string(&AudioEvent::RecorderElapsed { seconds: 3 }).unwrap();
        assert_eq!(json, r#"{"type":"recorderElapsed","seconds":3}"#);
    }
}
