//! Prometheus counters for telemetry events.
//!
//! Each sink owns a private registry so several agents (or tests) in one
//! process never collide on metric registration.

use crate::ObservabilityError;
use prometheus::{CounterVec, Encoder, Opts, Registry, TextEncoder};
use revnet_core::{Telemetry, TelemetryEvent};

/// Counts events by name in `{namespace}_telemetry_events_total`.
#[derive(Clone)]
pub struct MetricsTelemetry {
    registry: Registry,
    events_total: CounterVec,
}

impl MetricsTelemetry {
    pub fn new(namespace: &str) -> Result<Self, ObservabilityError> {
        let registry = Registry::new();
        let events_total = CounterVec::new(
            Opts::new(
                format!("{}_telemetry_events_total", namespace),
                "Total number of telemetry events by event name",
            ),
            &["event"],
        )?;
        registry.register(Box::new(events_total.clone()))?;

        Ok(Self {
            registry,
            events_total,
        })
    }

    /// Current count for one event name.
    pub fn count(&self, event: &str) -> f64 {
        self.events_total.with_label_values(&[event]).get()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render the registry in the Prometheus text exposition format.
    pub fn render(&self) -> Result<String, ObservabilityError> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| ObservabilityError::Metrics(e.to_string()))
    }
}

impl Telemetry for MetricsTelemetry {
    fn emit(&self, event: TelemetryEvent) {
        self.events_total.with_label_values(&[event.name.as_str()]).inc();
    }
}

impl From<prometheus::Error> for ObservabilityError {
    fn from(err: prometheus::Error) -> Self {
        ObservabilityError::Metrics(err.to_string())
    }
}
