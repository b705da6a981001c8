use revnet::ConfigError;
use revnet::ServiceError;
use revnet::observability::ObservabilityError;
use thiserror::Error;

/// Failures that end a CLI command with a non-zero exit code.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("invalid settings: {0}")]
    Settings(#[from] ConfigError),

    #[error("backend unavailable: {0}")]
    Backend(#[from] ServiceError),

    #[error(transparent)]
    Observability(#[from] ObservabilityError),

    #[error("{0}")]
    IncompleteConfig(ConfigError),

    #[error("services not initialized: {0}")]
    NotInitialized(String),

    #[error("test write did not complete: {0}")]
    TestWrite(String),

    #[error("failed to wait for shutdown signal: {0}")]
    Signal(#[from] std::io::Error),
}
