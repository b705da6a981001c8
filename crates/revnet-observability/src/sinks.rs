//! Telemetry sinks that need no external system.

use revnet_core::{Telemetry, TelemetryEvent};
use std::sync::{Arc, Mutex};

/// Writes every event as a structured `tracing` record.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTelemetry;

impl Telemetry for TracingTelemetry {
    fn emit(&self, event: TelemetryEvent) {
        let properties = serde_json::Value::Object(event.properties);
        tracing::info!(
            target: "revnet::telemetry",
            event = %event.name,
            properties = %properties,
            "event:{}",
            event.name
        );
    }
}

/// Keeps every event in emission order.
///
/// Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct RecordingTelemetry {
    events: Arc<Mutex<Vec<TelemetryEvent>>>,
}

impl RecordingTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Event names in emission order.
    pub fn names(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|event| event.name.clone())
            .collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|event| event.name == name)
            .count()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl Telemetry for RecordingTelemetry {
    fn emit(&self, event: TelemetryEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }
}

/// Forwards each event to several sinks.
#[derive(Clone, Default)]
pub struct FanoutTelemetry {
    sinks: Vec<Arc<dyn Telemetry>>,
}

impl FanoutTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: Arc<dyn Telemetry>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl Telemetry for FanoutTelemetry {
    fn emit(&self, event: TelemetryEvent) {
        if let Some((last, rest)) = self.sinks.split_last() {
            for sink in rest {
                sink.emit(event.clone());
            }
            last.emit(event);
        }
    }
}
