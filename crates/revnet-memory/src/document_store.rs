//! In-process document store.

use crate::fault::FaultSlot;
use async_trait::async_trait;
use revnet_core::{
    ChangeKind, ChangeStream, CollectionQuery, DocumentChange, DocumentId, DocumentStore,
    ServiceError, ServiceResult, SortDirection,
};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
struct StoredDocument {
    id: DocumentId,
    data: Value,
}

#[derive(Debug, Clone)]
struct CollectionEvent {
    collection: String,
    change: DocumentChange,
}

/// Collections of JSON records held in memory, with live query
/// subscriptions.
///
/// Clones share the same data, so a test can keep one clone for
/// inspection while the agent works on another.
///
/// # Example
///
/// ```rust
/// use revnet_core::DocumentStore;
/// use revnet_memory::InMemoryDocumentStore;
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let store = InMemoryDocumentStore::new();
/// store.add_document("agent_logs", json!({"status": "online"})).await.unwrap();
/// assert_eq!(store.documents("agent_logs").len(), 1);
/// # });
/// ```
#[derive(Clone)]
pub struct InMemoryDocumentStore {
    collections: Arc<RwLock<HashMap<String, Vec<StoredDocument>>>>,
    events: broadcast::Sender<CollectionEvent>,
    write_fault: FaultSlot,
    watch_fault: FaultSlot,
    add_calls: Arc<AtomicUsize>,
    watch_calls: Arc<AtomicUsize>,
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
            events,
            write_fault: FaultSlot::default(),
            watch_fault: FaultSlot::default(),
            add_calls: Arc::new(AtomicUsize::new(0)),
            watch_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make the next `add_document` fail with `message`.
    pub fn fail_next_write(&self, message: impl Into<String>) {
        self.write_fault.arm(message);
    }

    /// Make the next `watch_collection` fail with `message`.
    pub fn fail_next_watch(&self, message: impl Into<String>) {
        self.watch_fault.arm(message);
    }

    /// Number of `add_document` calls, failed ones included.
    pub fn add_calls(&self) -> usize {
        self.add_calls.load(AtomicOrdering::SeqCst)
    }

    /// Number of `watch_collection` calls, failed ones included.
    pub fn watch_calls(&self) -> usize {
        self.watch_calls.load(AtomicOrdering::SeqCst)
    }

    /// Number of open subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }

    /// Snapshot of a collection in insertion order.
    pub fn documents(&self, collection: &str) -> Vec<(DocumentId, Value)> {
        let collections = self.collections.read().unwrap_or_else(|e| e.into_inner());
        collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|doc| (doc.id.clone(), doc.data.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn snapshot(&self, query: &CollectionQuery) -> ServiceResult<Vec<DocumentChange>> {
        let collections = self
            .collections
            .read()
            .map_err(|_| ServiceError::lock_poisoned("document store"))?;

        let mut matching: Vec<&StoredDocument> = collections
            .get(&query.collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| doc.data.get(&query.order_by).is_some())
                    .collect()
            })
            .unwrap_or_default();

        matching.sort_by(|a, b| {
            let ordering = compare_values(&a.data[&query.order_by], &b.data[&query.order_by]);
            match query.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });

        Ok(matching
            .into_iter()
            .take(query.limit)
            .map(|doc| DocumentChange {
                kind: ChangeKind::Added,
                id: doc.id.clone(),
                data: doc.data.clone(),
            })
            .collect())
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn add_document(&self, collection: &str, data: Value) -> ServiceResult<DocumentId> {
        self.add_calls.fetch_add(1, AtomicOrdering::SeqCst);
        if let Some(reason) = self.write_fault.take() {
            return Err(ServiceError::write_failed(collection, reason));
        }

        let id = DocumentId::new(uuid::Uuid::new_v4().simple().to_string());
        {
            let mut collections = self
                .collections
                .write()
                .map_err(|_| ServiceError::lock_poisoned("document store"))?;
            collections
                .entry(collection.to_string())
                .or_default()
                .push(StoredDocument {
                    id: id.clone(),
                    data: data.clone(),
                });
        }

        // No receivers is fine
        let _ = self.events.send(CollectionEvent {
            collection: collection.to_string(),
            change: DocumentChange {
                kind: ChangeKind::Added,
                id: id.clone(),
                data,
            },
        });

        tracing::debug!(collection, document = %id, "Stored document");
        Ok(id)
    }

    async fn watch_collection(
        &self,
        query: CollectionQuery,
    ) -> ServiceResult<ChangeStream<DocumentChange>> {
        self.watch_calls.fetch_add(1, AtomicOrdering::SeqCst);
        if let Some(reason) = self.watch_fault.take() {
            return Err(ServiceError::subscribe_failed(&query.collection, reason));
        }

        // Subscribe before the snapshot so nothing written in between is lost
        let receiver = self.events.subscribe();
        let snapshot = self.snapshot(&query)?;
        let state = WatchState::new(snapshot, receiver, query);

        Ok(Box::pin(futures::stream::unfold(state, |mut state| async move {
            let item = state.next().await?;
            Some((item, state))
        })))
    }
}

struct WatchState {
    pending: VecDeque<DocumentChange>,
    /// Snapshot records whose add event may still be queued on `receiver`.
    /// Each id is dropped once its event is skipped, so this never grows
    /// past the snapshot size.
    snapshot_ids: HashSet<DocumentId>,
    receiver: broadcast::Receiver<CollectionEvent>,
    query: CollectionQuery,
}

impl WatchState {
    fn new(
        snapshot: Vec<DocumentChange>,
        receiver: broadcast::Receiver<CollectionEvent>,
        query: CollectionQuery,
    ) -> Self {
        Self {
            snapshot_ids: snapshot.iter().map(|change| change.id.clone()).collect(),
            pending: snapshot.into(),
            receiver,
            query,
        }
    }

    async fn next(&mut self) -> Option<ServiceResult<DocumentChange>> {
        if let Some(change) = self.pending.pop_front() {
            return Some(Ok(change));
        }

        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if event.collection != self.query.collection
                        || event.change.data.get(&self.query.order_by).is_none()
                        || self.snapshot_ids.remove(&event.change.id)
                    {
                        continue;
                    }
                    return Some(Ok(event.change));
                }
                Err(RecvError::Lagged(skipped)) => {
                    return Some(Err(ServiceError::subscribe_failed(
                        &self.query.collection,
                        format!("subscriber lagged by {} changes", skipped),
                    )));
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

/// Total order over JSON values: null < bool < number < string < other,
/// then by value within a type.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use serde_json::json;

    #[tokio::test]
    async fn add_document_assigns_unique_ids() {
        let store = InMemoryDocumentStore::new();
        let a = store.add_document("logs", json!({"n": 1})).await.unwrap();
        let b = store.add_document("logs", json!({"n": 2})).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(store.documents("logs").len(), 2);
        assert_eq!(store.add_calls(), 2);
    }

    #[tokio::test]
    async fn injected_write_failure_fires_once() {
        let store = InMemoryDocumentStore::new();
        store.fail_next_write("quota exceeded");

        let err = store.add_document("logs", json!({})).await.unwrap_err();
        assert_eq!(err, ServiceError::write_failed("logs", "quota exceeded"));
        assert!(store.documents("logs").is_empty());

        assert!(store.add_document("logs", json!({})).await.is_ok());
    }

    #[tokio::test]
    async fn watch_replays_latest_window_newest_first() {
        let store = InMemoryDocumentStore::new();
        for ts in ["2026-01-01", "2026-01-03", "2026-01-02"] {
            store
                .add_document("logs", json!({"timestamp": ts}))
                .await
                .unwrap();
        }
        store
            .add_document("logs", json!({"untimed": true}))
            .await
            .unwrap();

        let mut stream = store
            .watch_collection(CollectionQuery::latest("logs", "timestamp", 2))
            .await
            .unwrap();

        let first = stream.next().await.unwrap().unwrap();
        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(first.data["timestamp"], "2026-01-03");
        assert_eq!(second.data["timestamp"], "2026-01-02");
        assert_eq!(first.kind, ChangeKind::Added);
    }

    #[tokio::test]
    async fn watch_delivers_new_additions_for_its_collection_only() {
        let store = InMemoryDocumentStore::new();
        let mut stream = store
            .watch_collection(CollectionQuery::latest("logs", "timestamp", 10))
            .await
            .unwrap();
        assert_eq!(store.subscriber_count(), 1);

        store
            .add_document("other", json!({"timestamp": "x"}))
            .await
            .unwrap();
        let id = store
            .add_document("logs", json!({"timestamp": "2026-02-01"}))
            .await
            .unwrap();

        let change = stream.next().await.unwrap().unwrap();
        assert_eq!(change.id, id);
        assert_eq!(change.data["timestamp"], "2026-02-01");
    }

    #[tokio::test]
    async fn snapshot_overlap_is_skipped_once_then_forgotten() {
        let store = InMemoryDocumentStore::new();
        let query = CollectionQuery::latest("logs", "timestamp", 10);

        // The add event lands on the receiver and the record in the snapshot.
        let receiver = store.events.subscribe();
        let early = store
            .add_document("logs", json!({"timestamp": "2026-03-01"}))
            .await
            .unwrap();
        let mut state = WatchState::new(store.snapshot(&query).unwrap(), receiver, query);
        assert_eq!(state.snapshot_ids.len(), 1);

        let replayed = state.next().await.unwrap().unwrap();
        assert_eq!(replayed.id, early);

        let mut added = Vec::new();
        for day in ["2026-03-02", "2026-03-03", "2026-03-04"] {
            added.push(
                store
                    .add_document("logs", json!({"timestamp": day}))
                    .await
                    .unwrap(),
            );
        }
        for id in &added {
            assert_eq!(&state.next().await.unwrap().unwrap().id, id);
        }
        assert!(state.snapshot_ids.is_empty());
    }

    #[tokio::test]
    async fn injected_watch_failure() {
        let store = InMemoryDocumentStore::new();
        store.fail_next_watch("permission denied");
        let result = store
            .watch_collection(CollectionQuery::latest("logs", "timestamp", 10))
            .await;
        assert!(matches!(result, Err(ServiceError::SubscribeFailed { .. })));
        assert_eq!(store.watch_calls(), 1);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn value_ordering() {
        assert_eq!(compare_values(&json!(1), &json!(2.5)), Ordering::Less);
        assert_eq!(compare_values(&json!("b"), &json!("a")), Ordering::Greater);
        assert_eq!(compare_values(&json!(null), &json!("a")), Ordering::Less);
        assert_eq!(compare_values(&json!(true), &json!(0)), Ordering::Less);
    }
}
