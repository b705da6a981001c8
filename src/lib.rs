//! # Revnet
//!
//! Bootstrap layer for a small agent that talks to three managed services:
//! a document store, a realtime key-value store and a remote-config service.
//!
//! On start the agent validates its configuration, builds handles for the
//! three services (all or nothing), subscribes to the agent-log collection
//! and the realtime status path, pulls remote configuration, and acts on
//! the remote command it finds there. A missing or placeholder
//! configuration is not an error: the agent comes up in limited mode and
//! says so.
//!
//! ## Quick Start
//!
//! ```rust
//! use revnet::{Agent, FirebaseConfig, InMemoryConnector, RecordingTelemetry, StartupMode};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let connector = InMemoryConnector::new();
//! connector.remote_config().publish("gemini_command", "test_data");
//!
//! let config = FirebaseConfig::from_lookup(|name| match name {
//!     "FIREBASE_API_KEY" => Some("local-key".to_string()),
//!     "FIREBASE_PROJECT_ID" => Some("local".to_string()),
//!     _ => None,
//! });
//! let telemetry = RecordingTelemetry::new();
//!
//! let agent = Agent::new(Arc::new(connector.clone()), config)
//!     .with_telemetry(Arc::new(telemetry.clone()));
//! let startup = agent.start().await;
//!
//! assert_eq!(startup.mode, StartupMode::Full);
//! assert_eq!(connector.documents().documents("agent_logs").len(), 1);
//! assert_eq!(telemetry.count("agent_start"), 1);
//! # });
//! ```
//!
//! ## Crates
//!
//! - [`core`]: configuration, session state, collaborator traits, errors
//! - [`memory`]: in-process backends with fault injection
//! - [`firebase`]: REST backends (feature `firebase`)
//! - [`observability`]: logging setup and telemetry sinks
//! - [`agent`]: the startup components and the orchestrator

pub use revnet_agent as agent;
pub use revnet_core as core;
#[cfg(feature = "firebase")]
pub use revnet_firebase as firebase;
pub use revnet_memory as memory;
pub use revnet_observability as observability;

// ============================================================================
// Configuration and session
// ============================================================================

pub use revnet_core::{
    AgentSettings, AppHandle, ConfigField, FirebaseConfig, ServiceHandles, Session,
    is_placeholder,
};

// ============================================================================
// Errors
// ============================================================================

pub use revnet_core::{ConfigError, InitError, ServiceError, ServiceResult};

// ============================================================================
// Collaborators
// ============================================================================

pub use revnet_core::{
    ChangeKind, ChangeStream, CollectionQuery, DocumentChange, DocumentId, DocumentStore,
    RealtimeStore, RemoteConfig, ServiceConnector, ValueChange,
};

pub use revnet_memory::{
    InMemoryConnector, InMemoryDocumentStore, InMemoryRealtimeStore, InMemoryRemoteConfig,
};

#[cfg(feature = "firebase")]
pub use revnet_firebase::{FirebaseConnector, FirebaseEndpoints};

// ============================================================================
// Commands, payload, telemetry
// ============================================================================

pub use revnet_core::{
    AgentCommand, NoopTelemetry, Telemetry, TelemetryEvent, TestPayload, remote_config_defaults,
};

pub use revnet_observability::{
    FanoutTelemetry, LogConfig, LogFormat, RecordingTelemetry, TracingTelemetry, init_tracing,
};

#[cfg(feature = "metrics")]
pub use revnet_observability::MetricsTelemetry;

// ============================================================================
// Agent components
// ============================================================================

pub use revnet_agent::{
    Agent, AgentContext, AgentStartup, AgentState, Initializer, LimitedReason, ListenerHandle,
    ListenerTarget, StartupMode, SyncOutcome, SyncReport, TestWriteOutcome, run_test_write,
    start_document_listener, start_realtime_listener, sync_remote_config,
};
