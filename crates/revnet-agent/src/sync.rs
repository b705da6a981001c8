//! Remote-config fetch, activation and command dispatch.

use crate::context::AgentContext;
use crate::test_write::{TestWriteOutcome, run_test_write};
use revnet_core::payload::{AGENT_MODE_KEY, GEMINI_COMMAND_KEY, WELCOME_MESSAGE_KEY};
use revnet_core::telemetry::REMOTE_CONFIG_SYNC_EVENT;
use revnet_core::{AgentCommand, RemoteConfig, ServiceError, TelemetryEvent};
use tracing::{error, info, warn};

/// The three values read after activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteValues {
    pub welcome_message: String,
    pub agent_mode: String,
    pub gemini_command: String,
}

impl RemoteValues {
    fn read(remote_config: &dyn RemoteConfig) -> Self {
        Self {
            welcome_message: remote_config.get_string(WELCOME_MESSAGE_KEY),
            agent_mode: remote_config.get_string(AGENT_MODE_KEY),
            gemini_command: remote_config.get_string(GEMINI_COMMAND_KEY),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub values: RemoteValues,
    /// Whether the fetch activated a new template
    pub activated: bool,
    pub command: AgentCommand,
    /// Set only when the command triggered a test write
    pub test_write: Option<TestWriteOutcome>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// The session is not ready
    Skipped,
    /// Fetch-and-activate failed; nothing was read or emitted
    FetchFailed(ServiceError),
    Synced(SyncReport),
}

impl SyncOutcome {
    pub fn report(&self) -> Option<&SyncReport> {
        match self {
            SyncOutcome::Synced(report) => Some(report),
            _ => None,
        }
    }
}

/// Fetch and activate remote configuration, log the three agent values,
/// then act on the remote command.
///
/// Emits `remote_config_sync` once per successful fetch, before the command
/// is dispatched. A `test_data` command runs the test write to completion
/// before this returns.
pub async fn sync_remote_config(ctx: &AgentContext) -> SyncOutcome {
    let Some(handles) = ctx.session().handles() else {
        warn!("Remote config not available; services not initialized");
        return SyncOutcome::Skipped;
    };

    info!("Remote config fetch and activate");
    let activated = match handles.remote_config.fetch_and_activate().await {
        Ok(activated) => activated,
        Err(e) => {
            error!(error = %e, "Remote config fetch failed");
            return SyncOutcome::FetchFailed(e);
        }
    };

    let values = RemoteValues::read(handles.remote_config.as_ref());
    info!("RC {} = {}", WELCOME_MESSAGE_KEY, values.welcome_message);
    info!("RC {} = {}", AGENT_MODE_KEY, values.agent_mode);
    info!(
        "RC {} = {}",
        GEMINI_COMMAND_KEY,
        if values.gemini_command.is_empty() {
            "(empty)"
        } else {
            values.gemini_command.as_str()
        }
    );

    ctx.telemetry().emit(
        TelemetryEvent::new(REMOTE_CONFIG_SYNC_EVENT).with("mode", values.agent_mode.as_str()),
    );

    let command = AgentCommand::parse(&values.gemini_command);
    let test_write = dispatch(ctx, &command).await;

    SyncOutcome::Synced(SyncReport {
        values,
        activated,
        command,
        test_write,
    })
}

async fn dispatch(ctx: &AgentContext, command: &AgentCommand) -> Option<TestWriteOutcome> {
    match command {
        AgentCommand::Idle => None,
        AgentCommand::TestData => {
            info!(command = %command, "Running remote command");
            Some(run_test_write(ctx).await)
        }
        AgentCommand::Unrecognized(value) => {
            warn!(command = %value, "Unrecognized remote command; ignoring");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use revnet_core::{AgentSettings, FirebaseConfig, ServiceConnector, Session};
    use revnet_memory::InMemoryConnector;
    use revnet_observability::RecordingTelemetry;
    use std::sync::Arc;

    async fn context(connector: &InMemoryConnector, telemetry: &RecordingTelemetry) -> AgentContext {
        let handles = connector.connect(&FirebaseConfig::default()).await.unwrap();
        handles
            .remote_config
            .set_defaults(revnet_core::remote_config_defaults());
        AgentContext::new(
            Session::Ready(handles),
            AgentSettings::default(),
            Arc::new(telemetry.clone()),
        )
    }

    #[tokio::test]
    async fn idle_command_reads_values_without_writing() {
        let connector = InMemoryConnector::new();
        let telemetry = RecordingTelemetry::new();
        let ctx = context(&connector, &telemetry).await;
        connector.remote_config().publish(GEMINI_COMMAND_KEY, "idle");
        connector.remote_config().publish(AGENT_MODE_KEY, "ACTIVE");

        let outcome = sync_remote_config(&ctx).await;
        let report = outcome.report().expect("sync should succeed");

        assert!(report.activated);
        assert_eq!(report.command, AgentCommand::Idle);
        assert_eq!(report.values.welcome_message, "Revolskyynet online");
        assert_eq!(report.values.agent_mode, "ACTIVE");
        assert!(report.test_write.is_none());
        assert_eq!(connector.documents().add_calls(), 0);

        let events = telemetry.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "remote_config_sync");
        assert_eq!(events[0].property("mode"), Some(&"ACTIVE".into()));
    }

    #[tokio::test]
    async fn empty_command_uses_defaults() {
        let connector = InMemoryConnector::new();
        let telemetry = RecordingTelemetry::new();
        let ctx = context(&connector, &telemetry).await;

        let report = sync_remote_config(&ctx).await.report().cloned().unwrap();
        assert_eq!(report.values.gemini_command, "");
        assert_eq!(report.values.agent_mode, "IDLE");
        assert_eq!(report.command, AgentCommand::Idle);
        assert_eq!(connector.realtime().set_calls(), 0);
    }

    #[tokio::test]
    async fn test_data_command_runs_one_test_write() {
        let connector = InMemoryConnector::new();
        let telemetry = RecordingTelemetry::new();
        let ctx = context(&connector, &telemetry).await;
        connector.remote_config().publish(GEMINI_COMMAND_KEY, "test_data");

        let report = sync_remote_config(&ctx).await.report().cloned().unwrap();
        assert!(matches!(
            report.test_write,
            Some(TestWriteOutcome::Completed { .. })
        ));
        assert_eq!(connector.documents().add_calls(), 1);
        assert_eq!(connector.realtime().set_calls(), 1);
        assert_eq!(
            telemetry.names(),
            vec!["remote_config_sync", "db_write_firestore", "db_write_rtdb"]
        );
    }

    #[tokio::test]
    async fn unknown_command_is_a_no_op() {
        let connector = InMemoryConnector::new();
        let telemetry = RecordingTelemetry::new();
        let ctx = context(&connector, &telemetry).await;
        connector.remote_config().publish(GEMINI_COMMAND_KEY, "TEST_DATA");

        let report = sync_remote_config(&ctx).await.report().cloned().unwrap();
        assert_eq!(
            report.command,
            AgentCommand::Unrecognized("TEST_DATA".to_string())
        );
        assert!(report.test_write.is_none());
        assert_eq!(connector.documents().add_calls(), 0);
    }

    #[tokio::test]
    async fn unknown_command_value_is_still_logged() {
        let connector = InMemoryConnector::new();
        let telemetry = RecordingTelemetry::new();
        let ctx = context(&connector, &telemetry).await;
        connector.remote_config().publish(GEMINI_COMMAND_KEY, "reboot_fleet");
        connector.remote_config().publish(WELCOME_MESSAGE_KEY, "hello operators");

        let (logs, _guard) = crate::log_capture::capture_logs();
        sync_remote_config(&ctx).await;

        let output = logs.contents();
        assert!(output.contains("RC gemini_command = reboot_fleet"), "{}", output);
        assert!(output.contains("RC welcome_message = hello operators"));
        assert!(output.contains("RC agent_mode = IDLE"));
        assert!(output.contains("Unrecognized remote command"));
        assert_eq!(telemetry.names(), vec!["remote_config_sync"]);
    }

    #[tokio::test]
    async fn fetch_failure_emits_nothing() {
        let connector = InMemoryConnector::new();
        let telemetry = RecordingTelemetry::new();
        let ctx = context(&connector, &telemetry).await;
        connector.remote_config().publish(GEMINI_COMMAND_KEY, "test_data");
        connector.remote_config().fail_next_fetch("network unreachable");

        let outcome = sync_remote_config(&ctx).await;
        assert!(matches!(outcome, SyncOutcome::FetchFailed(_)));
        assert!(telemetry.events().is_empty());
        assert_eq!(connector.documents().add_calls(), 0);
    }

    #[tokio::test]
    async fn uninitialized_session_is_skipped() {
        let ctx = AgentContext::new(
            Session::Uninitialized,
            AgentSettings::default(),
            Arc::new(RecordingTelemetry::new()),
        );
        assert_eq!(sync_remote_config(&ctx).await, SyncOutcome::Skipped);
    }
}
