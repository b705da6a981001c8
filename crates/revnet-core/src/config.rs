//! Service credentials loaded from the environment.
//!
//! The record is read once at startup. Any setting that is not provided
//! falls back to a documented placeholder value, and [`is_placeholder`]
//! classifies values so the initializer can decide between full and limited
//! mode without ever failing the host.

use crate::error::ConfigError;
use std::fmt;

/// Literal values that mark a setting as "not configured".
pub const PLACEHOLDER_SENTINELS: &[&str] = &["TU_API_KEY", "TU_PROYECTO", "XXXX", "G-XXXX"];

/// Environment variable for the optional realtime database URL.
pub const DATABASE_URL_ENV: &str = "FIREBASE_DATABASE_URL";

/// Returns `true` when `value` is empty, blank, or one of the
/// [`PLACEHOLDER_SENTINELS`].
///
/// ```rust
/// use revnet_core::config::is_placeholder;
///
/// assert!(is_placeholder(""));
/// assert!(is_placeholder("TU_API_KEY"));
/// assert!(!is_placeholder("AIzaSyA-real-key"));
/// ```
pub fn is_placeholder(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || PLACEHOLDER_SENTINELS.contains(&value)
}

/// The seven named settings of the configuration record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigField {
    ApiKey,
    AuthDomain,
    ProjectId,
    StorageBucket,
    MessagingSenderId,
    AppId,
    MeasurementId,
}

impl ConfigField {
    /// All fields in declaration order.
    pub const ALL: [ConfigField; 7] = [
        ConfigField::ApiKey,
        ConfigField::AuthDomain,
        ConfigField::ProjectId,
        ConfigField::StorageBucket,
        ConfigField::MessagingSenderId,
        ConfigField::AppId,
        ConfigField::MeasurementId,
    ];

    /// Environment variable the field is read from.
    pub fn env_var(self) -> &'static str {
        match self {
            ConfigField::ApiKey => "FIREBASE_API_KEY",
            ConfigField::AuthDomain => "FIREBASE_AUTH_DOMAIN",
            ConfigField::ProjectId => "FIREBASE_PROJECT_ID",
            ConfigField::StorageBucket => "FIREBASE_STORAGE_BUCKET",
            ConfigField::MessagingSenderId => "FIREBASE_MESSAGING_SENDER_ID",
            ConfigField::AppId => "FIREBASE_APP_ID",
            ConfigField::MeasurementId => "FIREBASE_MEASUREMENT_ID",
        }
    }

    /// Value substituted when the variable is unset.
    pub fn placeholder(self) -> &'static str {
        match self {
            ConfigField::ApiKey => "TU_API_KEY",
            ConfigField::AuthDomain => "TU_PROYECTO.firebaseapp.com",
            ConfigField::ProjectId => "TU_PROYECTO",
            ConfigField::StorageBucket => "TU_PROYECTO.appspot.com",
            ConfigField::MessagingSenderId => "XXXX",
            ConfigField::AppId => "XXXX",
            ConfigField::MeasurementId => "G-XXXX",
        }
    }

    /// Only the API key and project id gate initialization.
    pub fn is_required(self) -> bool {
        matches!(self, ConfigField::ApiKey | ConfigField::ProjectId)
    }
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.env_var())
    }
}

/// Immutable configuration record for the managed services.
#[derive(Clone, PartialEq, Eq)]
pub struct FirebaseConfig {
    pub api_key: String,
    pub auth_domain: String,
    pub project_id: String,
    pub storage_bucket: String,
    pub messaging_sender_id: String,
    pub app_id: String,
    pub measurement_id: String,
    /// Realtime database endpoint; derived from the project id when unset.
    pub database_url: Option<String>,
}

impl Default for FirebaseConfig {
    /// A record holding only placeholder values.
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl FirebaseConfig {
    /// Load the record from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load the record through an arbitrary lookup function.
    ///
    /// Unset names receive their placeholder. A name that is set to an empty
    /// string keeps the empty string, which [`is_placeholder`] also rejects.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |field: ConfigField| {
            lookup(field.env_var()).unwrap_or_else(|| field.placeholder().to_string())
        };

        Self {
            api_key: read(ConfigField::ApiKey),
            auth_domain: read(ConfigField::AuthDomain),
            project_id: read(ConfigField::ProjectId),
            storage_bucket: read(ConfigField::StorageBucket),
            messaging_sender_id: read(ConfigField::MessagingSenderId),
            app_id: read(ConfigField::AppId),
            measurement_id: read(ConfigField::MeasurementId),
            database_url: lookup(DATABASE_URL_ENV).filter(|url| !url.trim().is_empty()),
        }
    }

    /// Value of a single field.
    pub fn get(&self, field: ConfigField) -> &str {
        match field {
            ConfigField::ApiKey => &self.api_key,
            ConfigField::AuthDomain => &self.auth_domain,
            ConfigField::ProjectId => &self.project_id,
            ConfigField::StorageBucket => &self.storage_bucket,
            ConfigField::MessagingSenderId => &self.messaging_sender_id,
            ConfigField::AppId => &self.app_id,
            ConfigField::MeasurementId => &self.measurement_id,
        }
    }

    /// Check that every required field holds a real value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let missing: Vec<&'static str> = ConfigField::ALL
            .into_iter()
            .filter(|field| field.is_required() && is_placeholder(self.get(*field)))
            .map(ConfigField::env_var)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Incomplete { missing })
        }
    }

    /// Placeholder status of every field, in declaration order.
    pub fn placeholder_fields(&self) -> Vec<(ConfigField, bool)> {
        ConfigField::ALL
            .into_iter()
            .map(|field| (field, is_placeholder(self.get(field))))
            .collect()
    }

    /// Realtime database base URL, without a trailing slash.
    pub fn realtime_database_url(&self) -> String {
        match &self.database_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}-default-rtdb.firebaseio.com", self.project_id),
        }
    }
}

impl fmt::Debug for FirebaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let api_key = if is_placeholder(&self.api_key) {
            self.api_key.as_str()
        } else {
            "<redacted>"
        };

        f.debug_struct("FirebaseConfig")
            .field("api_key", &api_key)
            .field("auth_domain", &self.auth_domain)
            .field("project_id", &self.project_id)
            .field("storage_bucket", &self.storage_bucket)
            .field("messaging_sender_id", &self.messaging_sender_id)
            .field("app_id", &self.app_id)
            .field("measurement_id", &self.measurement_id)
            .field("database_url", &self.database_url)
            .finish()
    }
}
