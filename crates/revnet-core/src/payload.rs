//! Test payload and remote-config defaults.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Remote-config key holding the greeting shown by the host.
pub const WELCOME_MESSAGE_KEY: &str = "welcome_message";
/// Remote-config key holding the agent mode.
pub const AGENT_MODE_KEY: &str = "agent_mode";
/// Remote-config key holding the pending command.
pub const GEMINI_COMMAND_KEY: &str = "gemini_command";

/// Fallback values installed before the first fetch.
pub fn remote_config_defaults() -> BTreeMap<String, String> {
    BTreeMap::from([
        (WELCOME_MESSAGE_KEY.to_string(), "Revolskyynet online".to_string()),
        (AGENT_MODE_KEY.to_string(), "IDLE".to_string()),
        (GEMINI_COMMAND_KEY.to_string(), String::new()),
    ])
}

/// Record written to both stores by the test write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestPayload {
    pub source: String,
    pub device: String,
    pub status: String,
    /// RFC 3339, UTC, millisecond precision
    pub timestamp: String,
}

impl TestPayload {
    /// Build a payload stamped with the current instant.
    pub fn now(
        source: impl Into<String>,
        device: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self::at(source, device, status, Utc::now())
    }

    pub fn at(
        source: impl Into<String>,
        device: impl Into<String>,
        status: impl Into<String>,
        instant: DateTime<Utc>,
    ) -> Self {
        Self {
            source: source.into(),
            device: device.into(),
            status: status.into(),
            timestamp: instant.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "source": self.source,
            "device": self.device,
            "status": self.status,
            "timestamp": self.timestamp,
        })
    }
}
