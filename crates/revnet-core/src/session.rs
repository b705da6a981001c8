//! Session state: either nothing, or every service handle at once.

use crate::services::{DocumentStore, RealtimeStore, RemoteConfig};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

/// Identity of an initialized application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppHandle {
    pub project_id: String,
    pub app_id: String,
    pub created_at: DateTime<Utc>,
}

impl AppHandle {
    pub fn new(project_id: impl Into<String>, app_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            app_id: app_id.into(),
            created_at: Utc::now(),
        }
    }
}

/// The full bundle of handles produced by a successful initialization.
#[derive(Clone)]
pub struct ServiceHandles {
    pub app: AppHandle,
    pub documents: Arc<dyn DocumentStore>,
    pub realtime: Arc<dyn RealtimeStore>,
    pub remote_config: Arc<dyn RemoteConfig>,
}

impl fmt::Debug for ServiceHandles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceHandles")
            .field("app", &self.app)
            .finish_non_exhaustive()
    }
}

/// Process session. Components match on this instead of null-checking
/// individual handles, so a partially initialized session cannot exist.
#[derive(Debug, Clone, Default)]
pub enum Session {
    #[default]
    Uninitialized,
    Ready(ServiceHandles),
}

impl Session {
    pub fn is_ready(&self) -> bool {
        matches!(self, Session::Ready(_))
    }

    pub fn handles(&self) -> Option<&ServiceHandles> {
        match self {
            Session::Ready(handles) => Some(handles),
            Session::Uninitialized => None,
        }
    }
}

impl From<ServiceHandles> for Session {
    fn from(handles: ServiceHandles) -> Self {
        Session::Ready(handles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_session_is_uninitialized() {
        let session = Session::default();
        assert!(!session.is_ready());
        assert!(session.handles().is_none());
    }

    #[test]
    fn app_handle_records_identity() {
        let app = AppHandle::new("demo", "1:123:web:abc");
        assert_eq!(app.project_id, "demo");
        assert_eq!(app.app_id, "1:123:web:abc");
        assert!(app.created_at <= Utc::now());
    }
}
