use crate::endpoints::FirebaseEndpoints;
use crate::firestore::FirestoreClient;
use crate::http::{DEFAULT_TIMEOUT, build_client, clamp_poll_interval};
use crate::realtime::RealtimeDatabaseClient;
use crate::remote_config::RemoteConfigClient;
use async_trait::async_trait;
use reqwest::Client;
use revnet_core::settings::DEFAULT_POLL_INTERVAL;
use revnet_core::{AppHandle, FirebaseConfig, ServiceConnector, ServiceHandles, ServiceResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Builds REST-backed handles for the three services.
///
/// Connecting makes no network calls: it only checks that every endpoint
/// URL is usable and wires the clients to one shared HTTP connection pool.
#[derive(Debug, Clone)]
pub struct FirebaseConnector {
    http: Client,
    endpoints: FirebaseEndpoints,
    poll_interval: Duration,
}

impl FirebaseConnector {
    pub fn new() -> ServiceResult<Self> {
        Ok(Self::with_http_client(build_client(DEFAULT_TIMEOUT)?))
    }

    pub fn with_http_client(http: Client) -> Self {
        Self {
            http,
            endpoints: FirebaseEndpoints::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_endpoints(mut self, endpoints: FirebaseEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// How often collection and value subscriptions poll. Raised to
    /// [`MIN_POLL_INTERVAL`](crate::MIN_POLL_INTERVAL) if shorter.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = clamp_poll_interval(interval);
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn endpoints(&self) -> &FirebaseEndpoints {
        &self.endpoints
    }
}

#[async_trait]
impl ServiceConnector for FirebaseConnector {
    async fn connect(&self, config: &FirebaseConfig) -> ServiceResult<ServiceHandles> {
        let documents = FirestoreClient::new(
            self.http.clone(),
            &self.endpoints,
            &config.project_id,
            &config.api_key,
            self.poll_interval,
        )?;
        let realtime = RealtimeDatabaseClient::new(
            self.http.clone(),
            self.endpoints.realtime_url(config)?,
            self.poll_interval,
        );
        let remote_config = RemoteConfigClient::new(
            self.http.clone(),
            &self.endpoints,
            &config.project_id,
            &config.app_id,
            &config.api_key,
        )?;

        debug!(
            project_id = %config.project_id,
            firestore = %documents.documents_url(),
            "REST clients ready"
        );

        Ok(ServiceHandles {
            app: AppHandle::new(&config.project_id, &config.app_id),
            documents: Arc::new(documents),
            realtime: Arc::new(realtime),
            remote_config: Arc::new(remote_config),
        })
    }
}
