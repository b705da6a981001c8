//! Service base URLs.

use revnet_core::{FirebaseConfig, ServiceError, ServiceResult};
use url::Url;

pub const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1/";
pub const INSTALLATIONS_BASE_URL: &str = "https://firebaseinstallations.googleapis.com/v1/";
pub const REMOTE_CONFIG_BASE_URL: &str = "https://firebaseremoteconfig.googleapis.com/v1/";

/// Base URLs for the three REST services.
///
/// The realtime database URL comes from the configuration record unless it
/// is overridden here. URLs are checked when the connector builds its
/// clients, not when they are set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirebaseEndpoints {
    pub firestore: String,
    pub installations: String,
    pub remote_config: String,
    pub realtime: Option<String>,
}

impl FirebaseEndpoints {
    /// Route every service to one server, e.g. a local mock. Realtime
    /// requests go to `{base}/rtdb/`.
    pub fn single_host(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            firestore: format!("{}/firestore/v1/", base),
            installations: format!("{}/installations/v1/", base),
            remote_config: format!("{}/remoteconfig/v1/", base),
            realtime: Some(format!("{}/rtdb/", base)),
        }
    }

    pub fn with_realtime(mut self, url: impl Into<String>) -> Self {
        self.realtime = Some(url.into());
        self
    }

    pub(crate) fn firestore_url(&self) -> ServiceResult<Url> {
        parse_base(&self.firestore)
    }

    pub(crate) fn installations_url(&self) -> ServiceResult<Url> {
        parse_base(&self.installations)
    }

    pub(crate) fn remote_config_url(&self) -> ServiceResult<Url> {
        parse_base(&self.remote_config)
    }

    /// Realtime database root for `config`.
    pub fn realtime_url(&self, config: &FirebaseConfig) -> ServiceResult<Url> {
        match &self.realtime {
            Some(url) => parse_base(url),
            None => parse_base(&config.realtime_database_url()),
        }
    }
}

impl Default for FirebaseEndpoints {
    fn default() -> Self {
        Self {
            firestore: FIRESTORE_BASE_URL.to_string(),
            installations: INSTALLATIONS_BASE_URL.to_string(),
            remote_config: REMOTE_CONFIG_BASE_URL.to_string(),
            realtime: None,
        }
    }
}

/// Parse `raw` as a base URL, adding the trailing slash if it is missing so
/// relative joins keep the versioned prefix.
pub(crate) fn parse_base(raw: &str) -> ServiceResult<Url> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    };
    let url = Url::parse(&normalized)
        .map_err(|e| ServiceError::ConnectionFailed(format!("invalid URL {:?}: {}", raw, e)))?;
    if url.cannot_be_a_base() {
        return Err(ServiceError::ConnectionFailed(format!(
            "URL {:?} cannot be used as a base",
            raw
        )));
    }
    Ok(url)
}

/// Join a relative path onto a base URL.
pub(crate) fn join(base: &Url, path: &str) -> ServiceResult<Url> {
    base.join(path)
        .map_err(|e| ServiceError::Backend(format!("invalid request path {:?}: {}", path, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_host_prefixes_every_service() {
        let endpoints = FirebaseEndpoints::single_host("http://127.0.0.1:9000/");
        assert_eq!(
            endpoints.firestore_url().unwrap().as_str(),
            "http://127.0.0.1:9000/firestore/v1/"
        );
        assert_eq!(
            endpoints.remote_config_url().unwrap().as_str(),
            "http://127.0.0.1:9000/remoteconfig/v1/"
        );
        assert_eq!(
            endpoints
                .realtime_url(&FirebaseConfig::default())
                .unwrap()
                .as_str(),
            "http://127.0.0.1:9000/rtdb/"
        );
    }

    #[test]
    fn realtime_defaults_to_project_database() {
        let mut config = FirebaseConfig::default();
        config.project_id = "demo".to_string();
        let url = FirebaseEndpoints::default().realtime_url(&config).unwrap();
        assert_eq!(url.as_str(), "https://demo-default-rtdb.firebaseio.com/");
    }

    #[test]
    fn rejects_unusable_urls() {
        assert!(parse_base("not a url").is_err());
        assert!(parse_base("mailto:ops@example.com").is_err());
        assert!(
            FirebaseEndpoints::default()
                .with_realtime("::")
                .realtime_url(&FirebaseConfig::default())
                .is_err()
        );
    }

    #[test]
    fn join_keeps_versioned_prefix() {
        let base = parse_base("https://firestore.googleapis.com/v1").unwrap();
        let url = join(&base, "projects/demo/databases/(default)/documents/agent_logs").unwrap();
        assert_eq!(
            url.path(),
            "/v1/projects/demo/databases/(default)/documents/agent_logs"
        );
    }
}
