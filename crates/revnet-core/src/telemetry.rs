//! Telemetry sink interface.
//!
//! Emission is fire-and-forget: sinks never report failure back to the
//! caller. Concrete sinks live in `revnet-observability`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Emitted after every successful remote-config sync.
pub const REMOTE_CONFIG_SYNC_EVENT: &str = "remote_config_sync";
/// Emitted after the document-store test write.
pub const DB_WRITE_FIRESTORE_EVENT: &str = "db_write_firestore";
/// Emitted after the realtime-store test write.
pub const DB_WRITE_RTDB_EVENT: &str = "db_write_rtdb";
/// Emitted once per orchestrator start.
pub const AGENT_START_EVENT: &str = "agent_start";

/// Property mapping attached to an event.
pub type EventProperties = Map<String, Value>;

/// A named telemetry event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub name: String,
    pub properties: EventProperties,
}

impl TelemetryEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: EventProperties::new(),
        }
    }

    /// Attach a property, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

/// Destination for named events.
pub trait Telemetry: Send + Sync {
    fn emit(&self, event: TelemetryEvent);

    /// Convenience wrapper around [`Telemetry::emit`].
    fn event(&self, name: &str, properties: EventProperties) {
        self.emit(TelemetryEvent {
            name: name.to_string(),
            properties,
        });
    }
}

/// Sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTelemetry;

impl Telemetry for NoopTelemetry {
    fn emit(&self, _event: TelemetryEvent) {}
}
