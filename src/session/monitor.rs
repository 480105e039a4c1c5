use std::sync::Arc;
use tracing::info;

use super::category::{current_category, AudioSessionControl, SessionCategory};
use super::route::{RouteChange, RouteControl};
use crate::events::{AudioEvent, EventSink, Notifier};

/// Introspection over the platform audio session.
///
/// The host forwards route-change and interruption notifications here; the
/// monitor turns them into events for the attached sink.
pub struct SessionMonitor {
    session: Arc<dyn AudioSessionControl>,
    routes: Arc<dyn RouteControl>,
    notifier: Notifier,
}

impl SessionMonitor {
    pub fn new(session: Arc<dyn AudioSessionControl>, routes: Arc<dyn RouteControl>) -> Self {
        Self {
            session,
            routes,
            notifier: Notifier::new(),
        }
    }

    pub fn set_event_sink(&self, sink: &Arc<dyn EventSink>) {
        self.notifier.attach(sink);
    }

    pub fn current_category(&self) -> Option<SessionCategory> {
        current_category(self.session.as_ref())
    }

    pub fn current_route(&self) -> RouteChange {
        RouteChange::from_ports(self.routes.current_input(), self.routes.current_output())
    }

    pub fn route_changed(&self) {
        let route = self.current_route();
        info!(
            "Audio route changed: input={:?} output={:?}",
            route.input_name, route.output_name
        );
        self.notifier.notify(AudioEvent::RouteChanged(route));
    }

    pub fn interruption_began(&self) {
        info!("Audio session interrupted");
        self.notifier.notify(AudioEvent::InterruptionBegan);
    }

    pub fn interruption_ended(&self, should_resume: bool) {
        info!("Audio session interruption ended (resume={})", should_resume);
        self.notifier
            .notify(AudioEvent::InterruptionEnded { should_resume });
    }

    pub fn present_route_picker(&self) {
        self.routes.present_route_picker();
    }
}
