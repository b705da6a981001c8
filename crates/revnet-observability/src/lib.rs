//! Revnet Observability
//!
//! Logging setup and telemetry sinks for the agent bootstrap.
//!
//! - [`init_tracing`] installs the process-wide `tracing` subscriber
//! - [`TracingTelemetry`] turns telemetry events into structured log records
//! - [`RecordingTelemetry`] keeps events in memory for hosts and tests
//! - [`MetricsTelemetry`] counts events in a Prometheus registry
//! - [`FanoutTelemetry`] forwards events to several sinks

#[cfg(feature = "metrics")]
pub mod metrics;

pub mod sinks;

#[cfg(feature = "metrics")]
pub use metrics::MetricsTelemetry;

pub use sinks::{FanoutTelemetry, RecordingTelemetry, TracingTelemetry};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Output format
    pub format: LogFormat,
    /// Filter used when `RUST_LOG` is unset or invalid
    pub default_directive: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            default_directive: "info".to_string(),
        }
    }
}

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over [`LogConfig::default_directive`].
/// Calling this again once a global subscriber is in place is a no-op; the
/// first subscriber stays installed.
pub fn init_tracing(config: &LogConfig) -> Result<(), ObservabilityError> {
    use tracing_subscriber::EnvFilter;

    if tracing::dispatcher::has_been_set() {
        tracing::debug!("Tracing subscriber already installed");
        return Ok(());
    }

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.default_directive))
        .map_err(|e| ObservabilityError::TracingInit(e.to_string()))?;

    let builder = tracing_subscriber::fmt().with_env_filter(env_filter);
    let result = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    };
    if let Err(e) = result {
        // Lost a race with another initializer.
        if tracing::dispatcher::has_been_set() {
            return Ok(());
        }
        return Err(ObservabilityError::TracingInit(e.to_string()));
    }

    tracing::debug!(format = ?config.format, "Initialized structured tracing");
    Ok(())
}

/// Observability errors
#[derive(thiserror::Error, Debug)]
pub enum ObservabilityError {
    #[error("Tracing initialization failed: {0}")]
    TracingInit(String),

    #[error("Metrics error: {0}")]
    Metrics(String),
}
