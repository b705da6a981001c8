//! # Revnet Firebase
//!
//! REST implementations of the Revnet collaborator traits:
//!
//! - [`FirestoreClient`]: document writes and polled collection queries
//! - [`RealtimeDatabaseClient`]: path writes and polled value subscriptions
//! - [`RemoteConfigClient`]: installation registration and template fetch
//! - [`FirebaseConnector`]: builds all three from a [`revnet_core::FirebaseConfig`]
//!
//! Subscriptions are implemented by polling, so a change becomes visible
//! within one poll interval. The clients do not retry; a failed poll is
//! reported on the stream and the next poll proceeds as usual.

pub mod connector;
pub mod endpoints;
pub mod firestore;
mod http;
pub mod realtime;
pub mod remote_config;
pub mod value;

pub use connector::FirebaseConnector;
pub use endpoints::FirebaseEndpoints;
pub use firestore::{FirestoreClient, QueryDocument};
pub use http::{DEFAULT_TIMEOUT, MIN_POLL_INTERVAL};
pub use realtime::RealtimeDatabaseClient;
pub use remote_config::{Installation, RemoteConfigClient};
pub use value::{decode_value, encode_document, encode_value};
