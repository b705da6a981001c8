use crate::fault::FaultSlot;
use crate::{InMemoryDocumentStore, InMemoryRealtimeStore, InMemoryRemoteConfig};
use async_trait::async_trait;
use revnet_core::{
    AppHandle, FirebaseConfig, ServiceConnector, ServiceError, ServiceHandles, ServiceResult,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Connector that hands out in-process backends.
///
/// Every successful `connect` returns handles backed by the same shared
/// stores, so the connector doubles as an inspection point for tests.
#[derive(Clone, Default)]
pub struct InMemoryConnector {
    documents: InMemoryDocumentStore,
    realtime: InMemoryRealtimeStore,
    remote_config: InMemoryRemoteConfig,
    connect_fault: FaultSlot,
    connect_calls: Arc<AtomicUsize>,
}

impl InMemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn documents(&self) -> &InMemoryDocumentStore {
        &self.documents
    }

    pub fn realtime(&self) -> &InMemoryRealtimeStore {
        &self.realtime
    }

    pub fn remote_config(&self) -> &InMemoryRemoteConfig {
        &self.remote_config
    }

    /// Make the next `connect` fail with `message`.
    pub fn fail_next_connect(&self, message: impl Into<String>) {
        self.connect_fault.arm(message);
    }

    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    /// Store calls of any kind made so far.
    pub fn store_calls(&self) -> usize {
        self.documents.add_calls()
            + self.documents.watch_calls()
            + self.realtime.set_calls()
            + self.realtime.watch_calls()
    }
}

#[async_trait]
impl ServiceConnector for InMemoryConnector {
    async fn connect(&self, config: &FirebaseConfig) -> ServiceResult<ServiceHandles> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = self.connect_fault.take() {
            return Err(ServiceError::ConnectionFailed(reason));
        }

        Ok(ServiceHandles {
            app: AppHandle::new(&config.project_id, &config.app_id),
            documents: Arc::new(self.documents.clone()),
            realtime: Arc::new(self.realtime.clone()),
            remote_config: Arc::new(self.remote_config.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use revnet_core::DocumentStore;
    use serde_json::json;

    #[tokio::test]
    async fn handles_share_state_with_connector() {
        let connector = InMemoryConnector::new();
        let handles = connector.connect(&FirebaseConfig::default()).await.unwrap();

        handles
            .documents
            .add_document("agent_logs", json!({"ok": true}))
            .await
            .unwrap();
        assert_eq!(connector.documents().documents("agent_logs").len(), 1);
        assert_eq!(connector.store_calls(), 1);
        assert_eq!(handles.app.project_id, "TU_PROYECTO");
    }

    #[tokio::test]
    async fn injected_connect_failure() {
        let connector = InMemoryConnector::new();
        connector.fail_next_connect("sdk unavailable");
        let err = connector
            .connect(&FirebaseConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::ConnectionFailed("sdk unavailable".into()));
        assert_eq!(connector.connect_calls(), 1);
    }
}
