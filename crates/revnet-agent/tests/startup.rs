//! Orchestrator behaviour against the in-memory backends.

use revnet_agent::{
    Agent, AgentState, LimitedReason, ListenerTarget, StartupMode, SyncOutcome, TestWriteOutcome,
};
use revnet_core::{AgentSettings, FirebaseConfig};
use revnet_memory::InMemoryConnector;
use revnet_observability::RecordingTelemetry;
use std::sync::Arc;

fn config() -> FirebaseConfig {
    FirebaseConfig::from_lookup(|name| match name {
        "FIREBASE_API_KEY" => Some("AIza-test".to_string()),
        "FIREBASE_PROJECT_ID" => Some("revnet-test".to_string()),
        "FIREBASE_APP_ID" => Some("1:123:web:abc".to_string()),
        _ => None,
    })
}

fn agent(
    connector: &InMemoryConnector,
    config: FirebaseConfig,
    telemetry: &RecordingTelemetry,
) -> Agent {
    Agent::new(Arc::new(connector.clone()), config).with_telemetry(Arc::new(telemetry.clone()))
}

#[tokio::test]
async fn placeholder_config_starts_limited_without_store_calls() {
    let connector = InMemoryConnector::new();
    let telemetry = RecordingTelemetry::new();
    let agent = agent(&connector, FirebaseConfig::default(), &telemetry);
    assert_eq!(agent.state(), AgentState::NotStarted);

    let startup = agent.start().await;

    match &startup.mode {
        StartupMode::Limited(LimitedReason::ConfigIncomplete { missing }) => {
            assert_eq!(missing, &vec!["FIREBASE_API_KEY", "FIREBASE_PROJECT_ID"]);
        }
        other => panic!("unexpected mode: {:?}", other),
    }
    assert!(!startup.session().is_ready());
    assert!(startup.listeners.is_empty());
    assert!(startup.sync.is_none());
    assert_eq!(agent.state(), AgentState::Limited);

    assert_eq!(connector.connect_calls(), 0);
    assert_eq!(connector.store_calls(), 0);

    let events = telemetry.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].name, "agent_start");
    assert_eq!(events[0].property("limited"), Some(&true.into()));
    assert_eq!(events[0].property("platform"), Some(&"web".into()));
}

#[tokio::test]
async fn connector_failure_starts_limited() {
    let connector = InMemoryConnector::new();
    connector.fail_next_connect("invalid api key");
    let telemetry = RecordingTelemetry::new();

    let agent = agent(&connector, config(), &telemetry);
    let startup = agent.start().await;

    match &startup.mode {
        StartupMode::Limited(LimitedReason::InitFailed { message }) => {
            assert!(message.contains("invalid api key"));
        }
        other => panic!("unexpected mode: {:?}", other),
    }
    assert_eq!(connector.store_calls(), 0);
    assert_eq!(telemetry.names(), vec!["agent_start"]);
}

#[tokio::test]
async fn full_startup_opens_listeners_and_syncs() {
    let connector = InMemoryConnector::new();
    connector.remote_config().publish("gemini_command", "idle");
    let telemetry = RecordingTelemetry::new();

    let agent = agent(&connector, config(), &telemetry);
    let startup = agent.start().await;

    assert!(startup.mode.is_full());
    assert_eq!(agent.state(), AgentState::Full);
    assert_eq!(startup.listeners.len(), 2);
    assert_eq!(
        startup.listeners[0].target(),
        &ListenerTarget::Collection("agent_logs".to_string())
    );
    assert_eq!(connector.documents().subscriber_count(), 1);
    assert_eq!(connector.realtime().subscriber_count(), 1);
    assert_eq!(connector.documents().add_calls(), 0);

    let Some(SyncOutcome::Synced(report)) = &startup.sync else {
        panic!("unexpected sync outcome: {:?}", startup.sync);
    };
    assert!(report.test_write.is_none());

    assert_eq!(telemetry.names(), vec!["remote_config_sync", "agent_start"]);
    assert_eq!(telemetry.events()[1].property("limited"), None);

    startup.stop_listeners();
}

#[tokio::test]
async fn custom_settings_flow_through_every_component() {
    let connector = InMemoryConnector::new();
    connector.remote_config().publish("gemini_command", "test_data");
    let telemetry = RecordingTelemetry::new();

    let settings = AgentSettings::from_lookup(|name| match name {
        "REVNET_DOCUMENT_COLLECTION" => Some("health_logs".to_string()),
        "REVNET_WRITE_PATH" => Some("health/cli".to_string()),
        "REVNET_NODE" => Some("cli".to_string()),
        _ => None,
    })
    .unwrap();

    let agent = agent(&connector, config(), &telemetry).with_settings(settings);
    let startup = agent.start().await;

    let report = startup.sync.as_ref().and_then(SyncOutcome::report).unwrap();
    assert!(matches!(
        report.test_write,
        Some(TestWriteOutcome::Completed { .. })
    ));
    assert_eq!(connector.documents().documents("health_logs").len(), 1);
    assert!(connector.documents().documents("agent_logs").is_empty());
    assert_eq!(connector.realtime().get("health/cli")["status"], "online");

    let writes: Vec<_> = telemetry
        .events()
        .into_iter()
        .filter(|e| e.name.starts_with("db_write"))
        .collect();
    assert_eq!(writes.len(), 2);
    assert!(writes.iter().all(|e| e.property("node") == Some(&"cli".into())));
}
