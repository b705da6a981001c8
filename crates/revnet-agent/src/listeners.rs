//! Subscription activators for the document and realtime stores.
//!
//! Each activator opens one long-lived subscription and spawns a task that
//! logs every notification. Reconnection is left to the backend; a stream
//! error is logged and the task keeps reading.

use crate::context::AgentContext;
use futures::StreamExt;
use revnet_core::{ChangeKind, CollectionQuery};
use std::fmt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// What a listener is subscribed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerTarget {
    Collection(String),
    Path(String),
}

impl fmt::Display for ListenerTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerTarget::Collection(name) => write!(f, "collection {}", name),
            ListenerTarget::Path(path) => write!(f, "path {}", path),
        }
    }
}

/// Running subscription task. Dropping the handle leaves the task running.
#[derive(Debug)]
pub struct ListenerHandle {
    target: ListenerTarget,
    task: JoinHandle<()>,
}

impl ListenerHandle {
    pub fn target(&self) -> &ListenerTarget {
        &self.target
    }

    /// True once the subscription stream has ended or the task was aborted.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the subscription task.
    pub fn abort(&self) {
        self.task.abort();
    }
}

/// Follow the latest records of the agent-log collection and log each one
/// as it is added.
///
/// Returns `None` without touching any store when the session is not
/// ready, or when the subscription cannot be opened.
pub async fn start_document_listener(ctx: &AgentContext) -> Option<ListenerHandle> {
    let Some(handles) = ctx.session().handles() else {
        warn!("Document store not initialized; start the agent or configure the FIREBASE_* variables");
        return None;
    };

    let settings = ctx.settings();
    let query = CollectionQuery::latest(
        &settings.document_collection,
        &settings.order_field,
        settings.listener_limit,
    );
    let collection = query.collection.clone();

    let mut stream = match handles.documents.watch_collection(query).await {
        Ok(stream) => stream,
        Err(e) => {
            error!(collection = %collection, error = %e, "Failed to open document listener");
            return None;
        }
    };

    let task_collection = collection.clone();
    let task = tokio::spawn(async move {
        while let Some(item) = stream.next().await {
            match item {
                Ok(change) if change.kind == ChangeKind::Added => {
                    info!(
                        collection = %task_collection,
                        document = %change.id,
                        "Document added: {}",
                        change.data
                    );
                }
                Ok(_) => {}
                Err(e) => warn!(collection = %task_collection, error = %e, "Document listener error"),
            }
        }
        debug!(collection = %task_collection, "Document listener closed");
    });

    info!(collection = %collection, "Document listener active");
    Some(ListenerHandle {
        target: ListenerTarget::Collection(collection),
        task,
    })
}

/// Follow the realtime status path and log every value change.
///
/// Returns `None` without touching any store when the session is not
/// ready, or when the subscription cannot be opened.
pub async fn start_realtime_listener(ctx: &AgentContext) -> Option<ListenerHandle> {
    let Some(handles) = ctx.session().handles() else {
        warn!("Realtime store not initialized; start the agent or configure the FIREBASE_* variables");
        return None;
    };

    let path = ctx.settings().watch_path.clone();
    let mut stream = match handles.realtime.watch_value(&path).await {
        Ok(stream) => stream,
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open realtime listener");
            return None;
        }
    };

    let task_path = path.clone();
    let task = tokio::spawn(async move {
        while let Some(item) = stream.next().await {
            match item {
                Ok(change) => info!(path = %change.path, "Realtime value: {}", change.value),
                Err(e) => warn!(path = %task_path, error = %e, "Realtime listener error"),
            }
        }
        debug!(path = %task_path, "Realtime listener closed");
    });

    info!(path = %path, "Realtime listener active");
    Some(ListenerHandle {
        target: ListenerTarget::Path(path),
        task,
    })
}
