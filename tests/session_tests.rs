// Tests for session introspection, route reporting and permissions

mod common;

use audio_session::session::{
    current_category, HeadlessAudioSession, HeadlessPermissions, PermissionProvider,
    PermissionState, PortDescription, RouteChange, SessionCategory, SessionMonitor,
};
use audio_session::AudioEvent;
use common::EventLog;
use std::sync::Arc;

fn monitor() -> (SessionMonitor, EventLog) {
    let session = Arc::new(HeadlessAudioSession::default());
    let monitor = SessionMonitor::new(session.clone(), session);
    let log = EventLog::new();
    monitor.set_event_sink(&log.sink);
    (monitor, log)
}

#[test]
fn test_route_change_reports_current_ports() {
    let (monitor, mut log) = monitor();

    monitor.route_changed();

    let expected = RouteChange {
        input_name: Some("Built-In Microphone".to_string()),
        input_type: Some("MicrophoneBuiltIn".to_string()),
        output_name: Some("Speaker".to_string()),
        output_type: Some("Speaker".to_string()),
    };
    assert_eq!(log.drain(), vec![AudioEvent::RouteChanged(expected)]);
}

#[test]
fn test_route_change_without_ports() {
    let route = RouteChange::from_ports(None, Some(PortDescription::new("AirPods", "BluetoothA2DP")));

    assert_eq!(route.input_name, None);
    assert_eq!(route.input_type, None);
    assert_eq!(route.output_name.as_deref(), Some("AirPods"));

    let json = serde_json::to_value(&route).unwrap();
    assert_eq!(json["outputType"], "BluetoothA2DP");
    assert!(json["inputName"].is_null());
}

#[test]
fn test_interruptions_are_forwarded() {
    let (monitor, mut log) = monitor();

    monitor.interruption_began();
    monitor.interruption_ended(true);

    assert_eq!(
        log.drain(),
        vec![
            AudioEvent::InterruptionBegan,
            AudioEvent::InterruptionEnded { should_resume: true },
        ]
    );
}

#[test]
fn test_events_dropped_once_sink_is_gone() {
    let session = Arc::new(HeadlessAudioSession::default());
    let monitor = SessionMonitor::new(session.clone(), session);
    {
        let log = EventLog::new();
        monitor.set_event_sink(&log.sink);
    }

    // Must not panic or keep the sink alive
    monitor.interruption_began();
}

#[test]
fn test_current_category_parses_known_names() {
    let session = HeadlessAudioSession::new(Some(SessionCategory::MultiRoute));
    assert_eq!(current_category(&session), Some(SessionCategory::MultiRoute));

    let unset = HeadlessAudioSession::new(None);
    assert_eq!(current_category(&unset), None);

    let (monitor, _log) = monitor();
    assert_eq!(monitor.current_category(), Some(SessionCategory::SoloAmbient));
}

#[tokio::test]
async fn test_permission_request_can_be_refused() {
    let permissions = HeadlessPermissions::new(PermissionState::Undetermined, false);

    assert!(!permissions.request().await);
    assert_eq!(permissions.current_state(), PermissionState::Denied);

    // A decided state is not asked again
    assert!(!permissions.request().await);
}

#[tokio::test]
async fn test_granted_permissions() {
    let permissions = HeadlessPermissions::granted();

    assert!(permissions.current_state().is_granted());
    assert!(permissions.request().await);
}
