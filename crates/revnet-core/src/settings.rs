//! Non-credential agent knobs.
//!
//! Collection names, paths, payload identity and timing policy. Every value
//! has a documented default and may be overridden through a `REVNET_*`
//! environment variable.

use crate::error::ConfigError;
use std::time::Duration;

/// Default minimum interval between remote-config fetches.
pub const DEFAULT_MIN_FETCH_INTERVAL: Duration = Duration::from_millis(60_000);

/// Default poll interval for backends that emulate subscriptions by polling.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5_000);

/// Runtime settings shared by every agent component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSettings {
    /// Collection that receives agent log records
    pub document_collection: String,
    /// Number of most recent records the document listener follows
    pub listener_limit: usize,
    /// Field the document listener orders by, descending
    pub order_field: String,
    /// Realtime path the realtime listener watches
    pub watch_path: String,
    /// Realtime path overwritten by the test write
    pub write_path: String,
    /// Platform tag attached to `agent_start`
    pub platform: String,
    /// Node tag attached to write telemetry
    pub node: String,
    /// `source` of the test payload
    pub payload_source: String,
    /// `device` of the test payload
    pub payload_device: String,
    /// `status` of the test payload
    pub payload_status: String,
    /// Minimum interval between remote-config fetches
    pub min_fetch_interval: Duration,
    /// Poll interval for polling-based subscriptions
    pub poll_interval: Duration,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            document_collection: "agent_logs".to_string(),
            listener_limit: 10,
            order_field: "timestamp".to_string(),
            watch_path: "status".to_string(),
            write_path: "status/web".to_string(),
            platform: "web".to_string(),
            node: "web".to_string(),
            payload_source: "revnet_agent".to_string(),
            payload_device: "web".to_string(),
            payload_status: "online".to_string(),
            min_fetch_interval: DEFAULT_MIN_FETCH_INTERVAL,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl AgentSettings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings through an arbitrary lookup function, starting from
    /// [`AgentSettings::default`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        let strings: [(&str, &mut String); 9] = [
            ("REVNET_DOCUMENT_COLLECTION", &mut settings.document_collection),
            ("REVNET_ORDER_FIELD", &mut settings.order_field),
            ("REVNET_WATCH_PATH", &mut settings.watch_path),
            ("REVNET_WRITE_PATH", &mut settings.write_path),
            ("REVNET_PLATFORM", &mut settings.platform),
            ("REVNET_NODE", &mut settings.node),
            ("REVNET_PAYLOAD_SOURCE", &mut settings.payload_source),
            ("REVNET_DEVICE", &mut settings.payload_device),
            ("REVNET_PAYLOAD_STATUS", &mut settings.payload_status),
        ];
        for (name, slot) in strings {
            if let Some(value) = lookup(name).filter(|v| !v.trim().is_empty()) {
                *slot = value;
            }
        }

        if let Some(raw) = lookup("REVNET_LISTENER_LIMIT") {
            settings.listener_limit = parse_positive("REVNET_LISTENER_LIMIT", &raw)? as usize;
        }
        if let Some(raw) = lookup("REVNET_MIN_FETCH_INTERVAL_MS") {
            let millis = parse_u64("REVNET_MIN_FETCH_INTERVAL_MS", &raw)?;
            settings.min_fetch_interval = Duration::from_millis(millis);
        }
        if let Some(raw) = lookup("REVNET_POLL_INTERVAL_MS") {
            let millis = parse_positive("REVNET_POLL_INTERVAL_MS", &raw)?;
            settings.poll_interval = Duration::from_millis(millis);
        }

        Ok(settings)
    }
}

fn parse_u64(name: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidValue {
            name,
            value: raw.to_string(),
            reason: e.to_string(),
        })
}

fn parse_positive(name: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match parse_u64(name, raw)? {
        0 => Err(ConfigError::InvalidValue {
            name,
            value: raw.to_string(),
            reason: "must be greater than zero".to_string(),
        }),
        value => Ok(value),
    }
}
