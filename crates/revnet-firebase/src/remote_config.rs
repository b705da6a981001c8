//! Remote Config over the client REST API.
//!
//! The first fetch registers an installation with Firebase Installations,
//! then every fetch posts to `namespaces/firebase:fetch` using that
//! installation's id and auth token. The minimum fetch interval is enforced
//! locally; a fetch inside the interval is answered from the active values.

use crate::endpoints::{FirebaseEndpoints, join};
use crate::http::{check, decode};
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use reqwest::Client;
use revnet_core::settings::DEFAULT_MIN_FETCH_INTERVAL;
use revnet_core::{RemoteConfig, ServiceError, ServiceResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{debug, info};
use url::Url;

const SDK_VERSION: &str = concat!("revnet/", env!("CARGO_PKG_VERSION"));
const LANGUAGE_CODE: &str = "en-US";

/// Registered installation, reused for every later fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installation {
    pub fid: String,
    pub auth_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InstallationRequest<'a> {
    fid: &'a str,
    app_id: &'a str,
    auth_version: &'a str,
    sdk_version: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstallationResponse {
    #[serde(default)]
    fid: Option<String>,
    auth_token: AuthToken,
}

#[derive(Debug, Deserialize)]
struct AuthToken {
    token: String,
}

#[derive(Debug, Serialize)]
struct FetchRequest<'a> {
    sdk_version: &'a str,
    app_instance_id: &'a str,
    app_instance_id_token: &'a str,
    app_id: &'a str,
    language_code: &'a str,
}

/// Template state reported by the fetch endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum TemplateState {
    Update,
    NoChange,
    NoTemplate,
    EmptyConfig,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FetchResponse {
    #[serde(default)]
    entries: BTreeMap<String, String>,
    state: Option<TemplateState>,
    #[serde(default)]
    template_version: Option<String>,
}

#[derive(Debug)]
struct ClientState {
    defaults: BTreeMap<String, String>,
    active: BTreeMap<String, String>,
    template_version: Option<String>,
    min_fetch_interval: Duration,
    last_fetch: Option<Instant>,
    installation: Option<Installation>,
}

#[derive(Clone)]
pub struct RemoteConfigClient {
    http: Client,
    installations_url: Url,
    fetch_url: Url,
    api_key: String,
    app_id: String,
    state: Arc<Mutex<ClientState>>,
}

impl std::fmt::Debug for RemoteConfigClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfigClient")
            .field("fetch_url", &self.fetch_url.as_str())
            .field("app_id", &self.app_id)
            .finish_non_exhaustive()
    }
}

impl RemoteConfigClient {
    pub fn new(
        http: Client,
        endpoints: &FirebaseEndpoints,
        project_id: &str,
        app_id: impl Into<String>,
        api_key: impl Into<String>,
    ) -> ServiceResult<Self> {
        let installations_url = join(
            &endpoints.installations_url()?,
            &format!("projects/{}/installations", project_id),
        )?;
        let fetch_url = join(
            &endpoints.remote_config_url()?,
            &format!("projects/{}/namespaces/firebase:fetch", project_id),
        )?;

        Ok(Self {
            http,
            installations_url,
            fetch_url,
            api_key: api_key.into(),
            app_id: app_id.into(),
            state: Arc::new(Mutex::new(ClientState {
                defaults: BTreeMap::new(),
                active: BTreeMap::new(),
                template_version: None,
                min_fetch_interval: DEFAULT_MIN_FETCH_INTERVAL,
                last_fetch: None,
                installation: None,
            })),
        })
    }

    /// Installation registered by the first successful fetch.
    pub fn installation(&self) -> Option<Installation> {
        self.lock().installation.clone()
    }

    pub fn template_version(&self) -> Option<String> {
        self.lock().template_version.clone()
    }

    fn lock(&self) -> MutexGuard<'_, ClientState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn ensure_installation(&self) -> ServiceResult<Installation> {
        if let Some(installation) = self.installation() {
            return Ok(installation);
        }

        let fid = generate_fid();
        let body = InstallationRequest {
            fid: &fid,
            app_id: &self.app_id,
            auth_version: "FIS_v2",
            sdk_version: SDK_VERSION,
        };
        let response = self
            .http
            .post(self.installations_url.clone())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::FetchFailed(format!("installation: {}", e)))?;
        let response = check(response)
            .await
            .map_err(|failure| ServiceError::FetchFailed(format!("installation: {}", failure)))?;
        let registered: InstallationResponse = decode(response).await?;

        let installation = Installation {
            fid: registered.fid.unwrap_or(fid),
            auth_token: registered.auth_token.token,
        };
        debug!(fid = %installation.fid, "Installation registered");
        self.lock().installation = Some(installation.clone());
        Ok(installation)
    }

    async fn fetch(&self, installation: &Installation) -> ServiceResult<FetchResponse> {
        let body = FetchRequest {
            sdk_version: SDK_VERSION,
            app_instance_id: &installation.fid,
            app_instance_id_token: &installation.auth_token,
            app_id: &self.app_id,
            language_code: LANGUAGE_CODE,
        };
        let response = self
            .http
            .post(self.fetch_url.clone())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::FetchFailed(e.to_string()))?;
        let response = check(response)
            .await
            .map_err(|failure| ServiceError::FetchFailed(failure.to_string()))?;
        decode(response).await
    }
}

#[async_trait]
impl RemoteConfig for RemoteConfigClient {
    fn set_defaults(&self, defaults: BTreeMap<String, String>) {
        self.lock().defaults = defaults;
    }

    fn set_minimum_fetch_interval(&self, interval: Duration) {
        self.lock().min_fetch_interval = interval;
    }

    async fn fetch_and_activate(&self) -> ServiceResult<bool> {
        {
            let state = self.lock();
            if let Some(last) = state.last_fetch {
                if last.elapsed() < state.min_fetch_interval {
                    debug!("Remote config served from cache (minimum fetch interval)");
                    return Ok(false);
                }
            }
        }

        let installation = self.ensure_installation().await?;
        let fetched = self.fetch(&installation).await?;

        let mut state = self.lock();
        state.last_fetch = Some(Instant::now());
        let template_state = fetched.state.unwrap_or(TemplateState::Unknown);
        if template_state == TemplateState::NoChange {
            return Ok(false);
        }

        let activated = fetched.entries != state.active
            || fetched.template_version != state.template_version;
        state.active = fetched.entries;
        state.template_version = fetched.template_version;
        info!(
            state = ?template_state,
            version = state.template_version.as_deref().unwrap_or("-"),
            values = state.active.len(),
            "Remote config fetched"
        );
        Ok(activated)
    }

    fn get_string(&self, key: &str) -> String {
        let state = self.lock();
        state
            .active
            .get(key)
            .or_else(|| state.defaults.get(key))
            .cloned()
            .unwrap_or_default()
    }
}

/// A Firebase installation id: 17 random bytes, URL-safe base64, with the
/// leading four bits fixed to `0111`, truncated to 22 characters.
fn generate_fid() -> String {
    let mut bytes = [0u8; 17];
    bytes[..16].copy_from_slice(uuid::Uuid::new_v4().as_bytes());
    bytes[16] = uuid::Uuid::new_v4().as_bytes()[0];
    bytes[0] = 0b0111_0000 | (bytes[0] & 0b0000_1111);

    let mut fid = URL_SAFE_NO_PAD.encode(bytes);
    fid.truncate(22);
    fid
}
