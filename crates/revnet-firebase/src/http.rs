use reqwest::{Client, Response, StatusCode};
use revnet_core::{ServiceError, ServiceResult};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Default timeout for one REST request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Shortest interval a subscription polls at; smaller requests are raised
/// to this.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

pub(crate) fn clamp_poll_interval(requested: Duration) -> Duration {
    requested.max(MIN_POLL_INTERVAL)
}

pub(crate) fn build_client(timeout: Duration) -> ServiceResult<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(format!("revnet-firebase/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ServiceError::ConnectionFailed(format!("Failed to create HTTP client: {}", e)))
}

/// Non-success status with the response body, as sent by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HttpFailure {
    pub status: StatusCode,
    pub body: String,
}

impl std::fmt::Display for HttpFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.body.is_empty() {
            write!(f, "HTTP {}", self.status)
        } else {
            write!(f, "HTTP {}: {}", self.status, self.body.trim())
        }
    }
}

/// Pass through a success response, otherwise describe the failure.
pub(crate) async fn check(response: Response) -> Result<Response, HttpFailure> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(HttpFailure { status, body })
}

pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> ServiceResult<T> {
    response
        .json()
        .await
        .map_err(|e| ServiceError::InvalidResponse(e.to_string()))
}
