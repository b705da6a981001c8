//! # Revnet Core
//!
//! Shared types for the Revnet agent bootstrap: the configuration record and
//! its placeholder detector, runtime settings, the all-or-nothing session
//! state, collaborator traits for the document store, realtime store and
//! remote-config service, the decoded command type, and the telemetry sink
//! interface.
//!
//! Backends implement the traits in [`services`]; the agent components in
//! `revnet-agent` only ever see them through [`session::ServiceHandles`].

pub mod command;
pub mod config;
pub mod error;
pub mod payload;
pub mod services;
pub mod session;
pub mod settings;
pub mod telemetry;

pub use command::AgentCommand;
pub use config::{ConfigField, FirebaseConfig, is_placeholder};
pub use error::{ConfigError, InitError, ServiceError, ServiceResult};
pub use payload::{TestPayload, remote_config_defaults};
pub use services::{
    ChangeKind, ChangeStream, CollectionQuery, DocumentChange, DocumentId, DocumentStore,
    RealtimeStore, RemoteConfig, ServiceConnector, SortDirection, ValueChange,
};
pub use session::{AppHandle, ServiceHandles, Session};
pub use settings::AgentSettings;
pub use telemetry::{EventProperties, NoopTelemetry, Telemetry, TelemetryEvent};
