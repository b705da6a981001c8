//! # Revnet Memory Backends
//!
//! In-process implementations of the collaborator traits from
//! `revnet-core`. They behave like the managed services closely enough for
//! local runs and tests: live subscriptions, minimum fetch intervals,
//! null-deletes in the realtime tree.
//!
//! ## Backends
//!
//! - **[InMemoryDocumentStore]**: collections with ordered, limited watches
//! - **[InMemoryRealtimeStore]**: path-addressed JSON tree with value watches
//! - **[InMemoryRemoteConfig]**: defaults, publishable template, activation
//! - **[InMemoryConnector]**: hands out all three as a service-handle bundle
//!
//! Every backend can be told to fail its next operation, and counts the
//! calls it receives.

mod connector;
mod document_store;
mod fault;
mod realtime_store;
mod remote_config;

pub use connector::InMemoryConnector;
pub use document_store::InMemoryDocumentStore;
pub use realtime_store::InMemoryRealtimeStore;
pub use remote_config::InMemoryRemoteConfig;
