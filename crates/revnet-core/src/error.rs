//! # Error Types
//!
//! Structured errors for configuration loading, collaborator calls and
//! initialization. Every component catches these at its own boundary and
//! turns them into a typed outcome plus a log line, so none of them is
//! expected to reach the hosting process.

use thiserror::Error;

/// Result type for collaborator operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors raised while reading or validating configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Required settings are missing or still hold placeholder values.
    #[error("configuration incomplete: {} missing", missing.join(", "))]
    Incomplete {
        /// Names of the settings that are placeholders
        missing: Vec<&'static str>,
    },

    /// A setting holds a value that cannot be parsed.
    #[error("invalid value for {name}: {value:?} ({reason})")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Errors reported by the document store, realtime store or remote-config
/// collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// Service handles could not be constructed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A write to a store was rejected or did not complete
    #[error("Write failed at {target}: {reason}")]
    WriteFailed { target: String, reason: String },

    /// A change subscription could not be opened or was interrupted
    #[error("Subscription failed at {target}: {reason}")]
    SubscribeFailed { target: String, reason: String },

    /// Remote-config fetch-and-activate failed
    #[error("Fetch failed: {0}")]
    FetchFailed(String),

    /// The service answered with something we could not interpret
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Payload serialization failed
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// Backend-specific error
    #[error("Backend error: {0}")]
    Backend(String),
}

impl ServiceError {
    /// Create a write failure for the given collection or path
    pub fn write_failed(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::WriteFailed {
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Create a subscription failure for the given collection or path
    pub fn subscribe_failed(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SubscribeFailed {
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Create a lock-poisoning error for an in-process backend
    pub fn lock_poisoned(what: &str) -> Self {
        Self::Backend(format!("{} lock poisoned", what))
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::SerializationFailed(err.to_string())
    }
}

/// Why the initializer could not produce a ready session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InitError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("service initialization failed: {0}")]
    Connect(#[from] ServiceError),
}
