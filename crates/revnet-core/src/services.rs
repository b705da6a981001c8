//! Collaborator interfaces for the three managed services.
//!
//! The agent never talks to a concrete backend. It holds these traits
//! behind `Arc<dyn _>` inside [`ServiceHandles`](crate::session::ServiceHandles)
//! so in-process and REST backends are interchangeable.

use crate::config::FirebaseConfig;
use crate::error::ServiceResult;
use crate::session::ServiceHandles;
use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::pin::Pin;
use std::time::Duration;

/// Stream of change notifications from a long-lived subscription.
pub type ChangeStream<T> = Pin<Box<dyn Stream<Item = ServiceResult<T>> + Send + 'static>>;

/// Identifier assigned by the document store to a new record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sort direction for collection queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Ordered, limited view over a named collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionQuery {
    pub collection: String,
    pub order_by: String,
    pub direction: SortDirection,
    pub limit: usize,
}

impl CollectionQuery {
    /// The most recent `limit` records of `collection`, newest first.
    pub fn latest(collection: impl Into<String>, order_by: impl Into<String>, limit: usize) -> Self {
        Self {
            collection: collection.into(),
            order_by: order_by.into(),
            direction: SortDirection::Descending,
            limit,
        }
    }
}

/// Kind of change reported for a document in a watched query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

/// One document change delivered by a collection subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentChange {
    pub kind: ChangeKind,
    pub id: DocumentId,
    pub data: Value,
}

/// One value change delivered by a realtime subscription. `value` is
/// `Null` when nothing is stored at the path.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueChange {
    pub path: String,
    pub value: Value,
}

/// Collection-oriented database with ordered queries and change
/// notifications.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Append `data` as a new record of `collection`.
    async fn add_document(&self, collection: &str, data: Value) -> ServiceResult<DocumentId>;

    /// Open a subscription over `query`.
    ///
    /// The stream first reports the records currently matching the query as
    /// [`ChangeKind::Added`], then every later change.
    async fn watch_collection(&self, query: CollectionQuery)
    -> ServiceResult<ChangeStream<DocumentChange>>;
}

/// Path-addressed key-value store with live value subscriptions.
#[async_trait]
pub trait RealtimeStore: Send + Sync {
    /// Overwrite the value stored at `path`.
    async fn set(&self, path: &str, value: Value) -> ServiceResult<()>;

    /// Subscribe to the value at `path`. The first item is the current value.
    async fn watch_value(&self, path: &str) -> ServiceResult<ChangeStream<ValueChange>>;
}

/// Hosted feature-flag service with defaults and fetch-and-activate.
#[async_trait]
pub trait RemoteConfig: Send + Sync {
    /// Install fallback values used before (or instead of) a fetch.
    fn set_defaults(&self, defaults: BTreeMap<String, String>);

    /// Fetches closer together than `interval` are served from the cache.
    fn set_minimum_fetch_interval(&self, interval: Duration);

    /// Fetch the remote template and activate it. Returns `true` when newly
    /// fetched values were activated.
    async fn fetch_and_activate(&self) -> ServiceResult<bool>;

    /// Active value for `key`, falling back to its default, else empty.
    fn get_string(&self, key: &str) -> String;
}

/// Builds the service-handle bundle for a validated configuration.
#[async_trait]
pub trait ServiceConnector: Send + Sync {
    /// Construct all handles, or fail without producing any of them.
    async fn connect(&self, config: &FirebaseConfig) -> ServiceResult<ServiceHandles>;
}
