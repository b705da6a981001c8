//! Realtime Database over its REST API (`{path}.json`).
//!
//! Value subscriptions poll the path and report a change only when the
//! returned JSON differs from the last one delivered.

use crate::endpoints::join;
use crate::http::{check, clamp_poll_interval, decode};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use revnet_core::{ChangeStream, RealtimeStore, ServiceError, ServiceResult, ValueChange};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};
use url::Url;

const CHANGE_BUFFER: usize = 32;

#[derive(Clone)]
pub struct RealtimeDatabaseClient {
    http: Client,
    database_url: Url,
    auth_token: Option<String>,
    poll_interval: Duration,
}

impl std::fmt::Debug for RealtimeDatabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeDatabaseClient")
            .field("database_url", &self.database_url.as_str())
            .field("has_auth", &self.auth_token.is_some())
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl RealtimeDatabaseClient {
    pub fn new(http: Client, database_url: Url, poll_interval: Duration) -> Self {
        Self {
            http,
            database_url,
            auth_token: None,
            poll_interval: clamp_poll_interval(poll_interval),
        }
    }

    /// Send `auth=<token>` with every request.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn value_url(&self, path: &str) -> ServiceResult<Url> {
        join(
            &self.database_url,
            &format!("{}.json", path.trim_matches('/')),
        )
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => builder.query(&[("auth", token.as_str())]),
            None => builder,
        }
    }

    /// Read the value at `path`; `Null` when nothing is stored there.
    pub async fn get(&self, path: &str) -> ServiceResult<Value> {
        let url = self.value_url(path)?;
        let response = self
            .authorize(self.http.get(url))
            .send()
            .await
            .map_err(|e| ServiceError::ConnectionFailed(format!("GET {}: {}", path, e)))?;
        let response = check(response)
            .await
            .map_err(|failure| ServiceError::Backend(format!("GET {}: {}", path, failure)))?;
        decode(response).await
    }
}

#[async_trait]
impl RealtimeStore for RealtimeDatabaseClient {
    async fn set(&self, path: &str, value: Value) -> ServiceResult<()> {
        let url = self.value_url(path)?;
        let response = self
            .authorize(self.http.put(url))
            .json(&value)
            .send()
            .await
            .map_err(|e| ServiceError::write_failed(path, e.to_string()))?;
        check(response)
            .await
            .map_err(|failure| ServiceError::write_failed(path, failure.to_string()))?;

        debug!(path, "Realtime value written");
        Ok(())
    }

    async fn watch_value(&self, path: &str) -> ServiceResult<ChangeStream<ValueChange>> {
        let initial = self
            .get(path)
            .await
            .map_err(|e| ServiceError::subscribe_failed(path, e.to_string()))?;

        let (tx, rx) = mpsc::channel(CHANGE_BUFFER);
        let client = self.clone();
        let path = path.to_string();

        tokio::spawn(async move {
            let change = ValueChange {
                path: path.clone(),
                value: initial.clone(),
            };
            if tx.send(Ok(change)).await.is_err() {
                return;
            }

            let mut last = initial;
            let mut ticker = tokio::time::interval(client.poll_interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = tx.closed() => return,
                }

                let item = match client.get(&path).await {
                    Ok(value) if value == last => continue,
                    Ok(value) => {
                        last = value.clone();
                        Ok(ValueChange {
                            path: path.clone(),
                            value,
                        })
                    }
                    Err(e) => {
                        warn!(path = %path, error = %e, "Realtime poll failed");
                        Err(ServiceError::subscribe_failed(&path, e.to_string()))
                    }
                };
                if tx.send(item).await.is_err() {
                    return;
                }
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}
