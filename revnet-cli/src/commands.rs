use crate::error::CliError;
use clap::ValueEnum;
use revnet::{
    Agent, AgentContext, AgentSettings, ConfigField, FanoutTelemetry, FirebaseConfig,
    FirebaseConnector, InMemoryConnector, Initializer, MetricsTelemetry, ServiceConnector,
    StartupMode, SyncOutcome, Telemetry, TestWriteOutcome, TracingTelemetry, run_test_write,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Which collaborator implementation to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Firestore, Realtime Database and Remote Config over REST
    Firebase,
    /// In-process stores, nothing leaves the machine
    Memory,
}

pub struct StartOptions {
    pub backend: Backend,
    pub once: bool,
    pub remote_command: Option<String>,
}

fn connector(
    backend: Backend,
    settings: &AgentSettings,
    remote_command: Option<&str>,
) -> Result<Arc<dyn ServiceConnector>, CliError> {
    match backend {
        Backend::Firebase => {
            if remote_command.is_some() {
                warn!("--remote-command only applies to the memory backend; ignoring");
            }
            let connector = FirebaseConnector::new()?.with_poll_interval(settings.poll_interval);
            Ok(Arc::new(connector))
        }
        Backend::Memory => {
            let connector = InMemoryConnector::new();
            if let Some(command) = remote_command {
                connector
                    .remote_config()
                    .publish(revnet::core::payload::GEMINI_COMMAND_KEY, command);
            }
            Ok(Arc::new(connector))
        }
    }
}

/// Run the orchestrator once; unless `once` is set, keep the listeners
/// running until Ctrl-C.
pub async fn start(options: StartOptions) -> Result<(), CliError> {
    let config = FirebaseConfig::from_env();
    let settings = AgentSettings::from_env()?;
    let connector = connector(
        options.backend,
        &settings,
        options.remote_command.as_deref(),
    )?;

    let metrics = Arc::new(MetricsTelemetry::new("revnet")?);
    let telemetry: Arc<dyn Telemetry> = Arc::new(
        FanoutTelemetry::new()
            .with_sink(Arc::new(TracingTelemetry))
            .with_sink(metrics.clone()),
    );

    let agent = Agent::new(connector, config)
        .with_settings(settings)
        .with_telemetry(telemetry);
    let startup = agent.start().await;

    match &startup.mode {
        StartupMode::Full => {
            let command = match &startup.sync {
                Some(SyncOutcome::Synced(report)) => report.command.to_string(),
                Some(SyncOutcome::FetchFailed(_)) => "(fetch failed)".to_string(),
                _ => "(none)".to_string(),
            };
            info!(
                state = %agent.state(),
                listeners = startup.listeners.len(),
                command = %command,
                "Startup complete"
            );
        }
        StartupMode::Limited(reason) => {
            info!(state = %agent.state(), reason = %reason, "Startup complete");
        }
    }

    if !options.once && startup.mode.is_full() {
        info!("Listening for changes; press Ctrl-C to stop");
        tokio::signal::ctrl_c().await?;
        info!("Shutting down");
    }
    startup.stop_listeners();

    match metrics.render() {
        Ok(text) => debug!(metrics = %text, "Telemetry counters"),
        Err(e) => warn!(error = %e, "Failed to render telemetry counters"),
    }
    Ok(())
}

/// One line per configuration field: its variable, whether it is required,
/// and whether it still holds a placeholder.
pub fn config_report(config: &FirebaseConfig) -> Vec<String> {
    config
        .placeholder_fields()
        .into_iter()
        .map(|(field, placeholder)| {
            format!(
                "{:<30} {:<9} {}",
                field.env_var(),
                if field.is_required() { "required" } else { "optional" },
                if placeholder { "placeholder" } else { "set" }
            )
        })
        .collect()
}

/// Print the configuration status; fails when a required field is missing.
pub fn check_config() -> Result<(), CliError> {
    let config = FirebaseConfig::from_env();
    for line in config_report(&config) {
        println!("{}", line);
    }
    println!(
        "{:<30} {}",
        revnet::core::config::DATABASE_URL_ENV,
        config.realtime_database_url()
    );

    AgentSettings::from_env()?;
    config.validate().map_err(CliError::IncompleteConfig)?;
    println!(
        "Configuration complete ({} and {} set)",
        ConfigField::ApiKey.env_var(),
        ConfigField::ProjectId.env_var()
    );
    Ok(())
}

/// Initialize services and run the test write once.
pub async fn test_write(backend: Backend) -> Result<(), CliError> {
    let config = FirebaseConfig::from_env();
    let settings = AgentSettings::from_env()?;
    let connector = connector(backend, &settings, None)?;

    let session = Initializer::new(connector, settings.clone())
        .initialize(&config)
        .await;
    if !session.is_ready() {
        return Err(CliError::NotInitialized(
            "check the FIREBASE_* variables (see `revnet check-config`)".to_string(),
        ));
    }

    let ctx = AgentContext::new(session, settings, Arc::new(TracingTelemetry));
    match run_test_write(&ctx).await {
        TestWriteOutcome::Completed { document_id } => {
            println!("Test write completed (document {})", document_id);
            Ok(())
        }
        TestWriteOutcome::Skipped => Err(CliError::TestWrite("skipped".to_string())),
        TestWriteOutcome::DocumentWriteFailed(e) => Err(CliError::TestWrite(e.to_string())),
        TestWriteOutcome::RealtimeWriteFailed { document_id, error } => Err(CliError::TestWrite(
            format!("{} (document {} was kept)", error, document_id),
        )),
    }
}
