use revnet_core::{AgentSettings, Session, Telemetry};
use std::sync::Arc;

/// Everything a component needs after initialization: the session, the
/// runtime settings and the telemetry sink.
///
/// Built once by the orchestrator and handed to every downstream component
/// by reference. Cloning is cheap; handles are shared.
#[derive(Clone)]
pub struct AgentContext {
    session: Session,
    settings: AgentSettings,
    telemetry: Arc<dyn Telemetry>,
}

impl AgentContext {
    pub fn new(session: Session, settings: AgentSettings, telemetry: Arc<dyn Telemetry>) -> Self {
        Self {
            session,
            settings,
            telemetry,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    pub fn telemetry(&self) -> &dyn Telemetry {
        self.telemetry.as_ref()
    }
}

impl std::fmt::Debug for AgentContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentContext")
            .field("session", &self.session)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
