//! In-process realtime store.
//!
//! Values live in a single JSON tree addressed by `/`-separated paths.
//! Writing `null` removes the value at the path.

use crate::fault::FaultSlot;
use async_trait::async_trait;
use revnet_core::{ChangeStream, RealtimeStore, ServiceError, ServiceResult, ValueChange};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

const EVENT_CAPACITY: usize = 256;

/// Path-addressed JSON tree with value subscriptions.
///
/// A watcher is notified whenever the value at its path changes, whether
/// the write targeted the path itself, one of its ancestors, or one of its
/// descendants.
#[derive(Clone)]
pub struct InMemoryRealtimeStore {
    root: Arc<RwLock<Value>>,
    writes: broadcast::Sender<Vec<String>>,
    write_fault: FaultSlot,
    watch_fault: FaultSlot,
    set_calls: Arc<AtomicUsize>,
    watch_calls: Arc<AtomicUsize>,
}

impl Default for InMemoryRealtimeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRealtimeStore {
    pub fn new() -> Self {
        let (writes, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            root: Arc::new(RwLock::new(Value::Object(Map::new()))),
            writes,
            write_fault: FaultSlot::default(),
            watch_fault: FaultSlot::default(),
            set_calls: Arc::new(AtomicUsize::new(0)),
            watch_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make the next `set` fail with `message`.
    pub fn fail_next_write(&self, message: impl Into<String>) {
        self.write_fault.arm(message);
    }

    /// Make the next `watch_value` fail with `message`.
    pub fn fail_next_watch(&self, message: impl Into<String>) {
        self.watch_fault.arm(message);
    }

    pub fn set_calls(&self) -> usize {
        self.set_calls.load(Ordering::SeqCst)
    }

    pub fn watch_calls(&self) -> usize {
        self.watch_calls.load(Ordering::SeqCst)
    }

    /// Number of open subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.writes.receiver_count()
    }

    /// Current value at `path`, `Null` when absent.
    pub fn get(&self, path: &str) -> Value {
        let root = self.root.read().unwrap_or_else(|e| e.into_inner());
        lookup(&root, &segments(path)).cloned().unwrap_or(Value::Null)
    }

    fn read(&self, path: &[String]) -> ServiceResult<Value> {
        let root = self
            .root
            .read()
            .map_err(|_| ServiceError::lock_poisoned("realtime store"))?;
        Ok(lookup(&root, path).cloned().unwrap_or(Value::Null))
    }
}

#[async_trait]
impl RealtimeStore for InMemoryRealtimeStore {
    async fn set(&self, path: &str, value: Value) -> ServiceResult<()> {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = self.write_fault.take() {
            return Err(ServiceError::write_failed(path, reason));
        }

        let target = segments(path);
        {
            let mut root = self
                .root
                .write()
                .map_err(|_| ServiceError::lock_poisoned("realtime store"))?;
            write_at(&mut root, &target, value);
        }

        let _ = self.writes.send(target);
        tracing::debug!(path, "Realtime value written");
        Ok(())
    }

    async fn watch_value(&self, path: &str) -> ServiceResult<ChangeStream<ValueChange>> {
        self.watch_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = self.watch_fault.take() {
            return Err(ServiceError::subscribe_failed(path, reason));
        }

        let receiver = self.writes.subscribe();
        let target = segments(path);
        let current = self.read(&target)?;

        let state = WatchState {
            store: self.clone(),
            receiver,
            path: path.to_string(),
            target,
            initial: Some(current.clone()),
            last: current,
        };

        Ok(Box::pin(futures::stream::unfold(state, |mut state| async move {
            let item = state.next().await?;
            Some((item, state))
        })))
    }
}

struct WatchState {
    store: InMemoryRealtimeStore,
    receiver: broadcast::Receiver<Vec<String>>,
    path: String,
    target: Vec<String>,
    initial: Option<Value>,
    last: Value,
}

impl WatchState {
    async fn next(&mut self) -> Option<ServiceResult<ValueChange>> {
        if let Some(value) = self.initial.take() {
            return Some(Ok(self.change(value)));
        }

        loop {
            match self.receiver.recv().await {
                Ok(written) => {
                    if !overlaps(&written, &self.target) {
                        continue;
                    }
                    let value = match self.store.read(&self.target) {
                        Ok(value) => value,
                        Err(e) => return Some(Err(e)),
                    };
                    if value == self.last {
                        continue;
                    }
                    self.last = value.clone();
                    return Some(Ok(self.change(value)));
                }
                Err(RecvError::Lagged(skipped)) => {
                    return Some(Err(ServiceError::subscribe_failed(
                        &self.path,
                        format!("subscriber lagged by {} writes", skipped),
                    )));
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    fn change(&self, value: Value) -> ValueChange {
        ValueChange {
            path: self.path.clone(),
            value,
        }
    }
}

fn segments(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// True when one path is a prefix of the other.
fn overlaps(a: &[String], b: &[String]) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| x == y)
}

fn lookup<'a>(root: &'a Value, path: &[String]) -> Option<&'a Value> {
    path.iter()
        .try_fold(root, |node, segment| node.as_object()?.get(segment))
}

fn write_at(root: &mut Value, path: &[String], value: Value) {
    let Some((leaf, parents)) = path.split_last() else {
        *root = if value.is_null() {
            Value::Object(Map::new())
        } else {
            value
        };
        return;
    };

    let mut node = root;
    for segment in parents {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        let Some(map) = node.as_object_mut() else {
            return;
        };
        node = map
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    if let Some(map) = node.as_object_mut() {
        if value.is_null() {
            map.remove(leaf);
        } else {
            map.insert(leaf.clone(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use serde_json::json;

    #[tokio::test]
    async fn set_and_get_nested_paths() {
        let store = InMemoryRealtimeStore::new();
        store.set("status/web", json!({"status": "online"})).await.unwrap();

        assert_eq!(store.get("status/web/status"), json!("online"));
        assert_eq!(store.get("/status/"), json!({"web": {"status": "online"}}));
        assert_eq!(store.get("status/mobile"), Value::Null);
        assert_eq!(store.set_calls(), 1);
    }

    #[tokio::test]
    async fn null_removes_value() {
        let store = InMemoryRealtimeStore::new();
        store.set("status/web", json!(1)).await.unwrap();
        store.set("status/web", Value::Null).await.unwrap();
        assert_eq!(store.get("status/web"), Value::Null);
    }

    #[tokio::test]
    async fn watcher_sees_current_value_then_descendant_writes() {
        let store = InMemoryRealtimeStore::new();
        let mut stream = store.watch_value("status").await.unwrap();

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.value, Value::Null);

        store.set("unrelated", json!(true)).await.unwrap();
        store.set("status/web", json!({"device": "web"})).await.unwrap();

        let change = stream.next().await.unwrap().unwrap();
        assert_eq!(change.path, "status");
        assert_eq!(change.value, json!({"web": {"device": "web"}}));
    }

    #[tokio::test]
    async fn identical_rewrites_are_not_reported() {
        let store = InMemoryRealtimeStore::new();
        store.set("status", json!("a")).await.unwrap();
        let mut stream = store.watch_value("status").await.unwrap();
        assert_eq!(stream.next().await.unwrap().unwrap().value, json!("a"));

        store.set("status", json!("a")).await.unwrap();
        store.set("status", json!("b")).await.unwrap();
        assert_eq!(stream.next().await.unwrap().unwrap().value, json!("b"));
    }

    #[tokio::test]
    async fn ancestor_write_replaces_watched_value() {
        let store = InMemoryRealtimeStore::new();
        store.set("status/web", json!("on")).await.unwrap();
        let mut stream = store.watch_value("status/web").await.unwrap();
        stream.next().await.unwrap().unwrap();

        store.set("status", json!({"web": "off"})).await.unwrap();
        assert_eq!(stream.next().await.unwrap().unwrap().value, json!("off"));
    }

    #[tokio::test]
    async fn injected_failures() {
        let store = InMemoryRealtimeStore::new();
        store.fail_next_write("offline");
        assert!(matches!(
            store.set("status", json!(1)).await,
            Err(ServiceError::WriteFailed { .. })
        ));

        store.fail_next_watch("denied");
        assert!(store.watch_value("status").await.is_err());
        assert_eq!(store.subscriber_count(), 0);
    }
}
