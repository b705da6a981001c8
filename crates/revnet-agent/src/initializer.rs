//! Configuration validation and service-handle construction.

use revnet_core::{
    AgentSettings, FirebaseConfig, InitError, ServiceConnector, ServiceHandles, Session,
    remote_config_defaults,
};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Validates the configuration record and, when it is complete, builds the
/// full service-handle bundle.
///
/// Initialization is all-or-nothing: either every handle is returned, or
/// none is. Calling it again builds a fresh bundle.
#[derive(Clone)]
pub struct Initializer {
    connector: Arc<dyn ServiceConnector>,
    settings: AgentSettings,
}

impl Initializer {
    pub fn new(connector: Arc<dyn ServiceConnector>, settings: AgentSettings) -> Self {
        Self {
            connector,
            settings,
        }
    }

    /// Build the handles, logging exactly one line describing the outcome.
    ///
    /// Nothing is constructed when the API key or project id is a
    /// placeholder. Remote-config defaults and the minimum fetch interval
    /// are installed before the handles are returned.
    pub async fn try_initialize(
        &self,
        config: &FirebaseConfig,
    ) -> Result<ServiceHandles, InitError> {
        match self.build(config).await {
            Ok(handles) => {
                info!(
                    project_id = %handles.app.project_id,
                    "Services initialized"
                );
                Ok(handles)
            }
            Err(InitError::Config(e)) => {
                warn!(
                    error = %e,
                    "Service configuration incomplete; set the FIREBASE_* variables or route sensitive operations through a backend"
                );
                Err(InitError::Config(e))
            }
            Err(InitError::Connect(e)) => {
                error!(error = %e, "Service initialization failed");
                Err(InitError::Connect(e))
            }
        }
    }

    /// Same as [`try_initialize`](Self::try_initialize), folded into a [`Session`].
    pub async fn initialize(&self, config: &FirebaseConfig) -> Session {
        match self.try_initialize(config).await {
            Ok(handles) => Session::Ready(handles),
            Err(_) => Session::Uninitialized,
        }
    }

    async fn build(&self, config: &FirebaseConfig) -> Result<ServiceHandles, InitError> {
        config.validate()?;

        let handles = self.connector.connect(config).await?;
        handles
            .remote_config
            .set_minimum_fetch_interval(self.settings.min_fetch_interval);
        handles.remote_config.set_defaults(remote_config_defaults());

        Ok(handles)
    }
}
