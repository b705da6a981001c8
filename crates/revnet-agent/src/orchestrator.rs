//! Top-level startup sequence.

use crate::context::AgentContext;
use crate::initializer::Initializer;
use crate::listeners::{ListenerHandle, start_document_listener, start_realtime_listener};
use crate::sync::{SyncOutcome, sync_remote_config};
use revnet_core::telemetry::AGENT_START_EVENT;
use revnet_core::{
    AgentSettings, ConfigError, FirebaseConfig, InitError, ServiceConnector, Session, Telemetry,
    TelemetryEvent,
};
use revnet_observability::TracingTelemetry;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Lifecycle of one [`Agent`]. `Limited` and `Full` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AgentState {
    #[default]
    NotStarted,
    Limited,
    Full,
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentState::NotStarted => write!(f, "not-started"),
            AgentState::Limited => write!(f, "limited"),
            AgentState::Full => write!(f, "full"),
        }
    }
}

/// Why the agent came up without services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LimitedReason {
    ConfigIncomplete { missing: Vec<&'static str> },
    InitFailed { message: String },
}

impl From<InitError> for LimitedReason {
    fn from(error: InitError) -> Self {
        match error {
            InitError::Config(ConfigError::Incomplete { missing }) => {
                LimitedReason::ConfigIncomplete { missing }
            }
            other => LimitedReason::InitFailed {
                message: other.to_string(),
            },
        }
    }
}

impl fmt::Display for LimitedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitedReason::ConfigIncomplete { missing } => {
                write!(f, "configuration incomplete ({})", missing.join(", "))
            }
            LimitedReason::InitFailed { message } => write!(f, "initialization failed: {}", message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupMode {
    Limited(LimitedReason),
    Full,
}

impl StartupMode {
    pub fn is_full(&self) -> bool {
        matches!(self, StartupMode::Full)
    }
}

/// Everything `start` produced. Listener tasks keep running for as long as
/// the runtime does; use [`stop_listeners`](Self::stop_listeners) to end them.
#[derive(Debug)]
pub struct AgentStartup {
    pub mode: StartupMode,
    pub context: AgentContext,
    pub listeners: Vec<ListenerHandle>,
    /// `None` in limited mode
    pub sync: Option<SyncOutcome>,
}

impl AgentStartup {
    pub fn session(&self) -> &Session {
        self.context.session()
    }

    pub fn stop_listeners(&self) {
        for listener in &self.listeners {
            listener.abort();
        }
    }
}

/// Runs the startup sequence: initialize, then either come up limited or
/// open both listeners and sync remote configuration.
///
/// ```
/// use revnet_agent::{Agent, AgentState, StartupMode};
/// use revnet_core::FirebaseConfig;
/// use revnet_memory::InMemoryConnector;
/// use std::sync::Arc;
///
/// # tokio_test::block_on(async {
/// let agent = Agent::new(Arc::new(InMemoryConnector::new()), FirebaseConfig::default());
/// let startup = agent.start().await;
///
/// assert!(matches!(startup.mode, StartupMode::Limited(_)));
/// assert_eq!(agent.state(), AgentState::Limited);
/// # });
/// ```
pub struct Agent {
    connector: Arc<dyn ServiceConnector>,
    config: FirebaseConfig,
    settings: AgentSettings,
    telemetry: Arc<dyn Telemetry>,
    state: Mutex<AgentState>,
}

impl Agent {
    /// Agent with default settings that reports telemetry through `tracing`.
    pub fn new(connector: Arc<dyn ServiceConnector>, config: FirebaseConfig) -> Self {
        Self {
            connector,
            config,
            settings: AgentSettings::default(),
            telemetry: Arc::new(TracingTelemetry),
            state: Mutex::new(AgentState::NotStarted),
        }
    }

    pub fn with_settings(mut self, settings: AgentSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn Telemetry>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    /// State reached by the most recent `start`.
    pub fn state(&self) -> AgentState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run the startup sequence once.
    ///
    /// Never fails: an unusable configuration or a connector error yields a
    /// limited startup. Emits exactly one `agent_start` event.
    pub async fn start(&self) -> AgentStartup {
        let initializer = Initializer::new(self.connector.clone(), self.settings.clone());
        let platform = self.settings.platform.as_str();

        let handles = match initializer.try_initialize(&self.config).await {
            Ok(handles) => handles,
            Err(e) => {
                let reason = LimitedReason::from(e);
                let context = self.context(Session::Uninitialized);
                self.telemetry.emit(
                    TelemetryEvent::new(AGENT_START_EVENT)
                        .with("platform", platform)
                        .with("limited", true),
                );
                warn!(reason = %reason, "Agent started in limited mode");
                self.set_state(AgentState::Limited);
                return AgentStartup {
                    mode: StartupMode::Limited(reason),
                    context,
                    listeners: Vec::new(),
                    sync: None,
                };
            }
        };

        let context = self.context(Session::Ready(handles));
        let listeners: Vec<ListenerHandle> = [
            start_document_listener(&context).await,
            start_realtime_listener(&context).await,
        ]
        .into_iter()
        .flatten()
        .collect();

        let sync = sync_remote_config(&context).await;

        self.telemetry
            .emit(TelemetryEvent::new(AGENT_START_EVENT).with("platform", platform));
        info!(listeners = listeners.len(), "Agent online");
        self.set_state(AgentState::Full);

        AgentStartup {
            mode: StartupMode::Full,
            context,
            listeners,
            sync: Some(sync),
        }
    }

    fn context(&self, session: Session) -> AgentContext {
        AgentContext::new(session, self.settings.clone(), self.telemetry.clone())
    }

    fn set_state(&self, state: AgentState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state;
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("config", &self.config)
            .field("settings", &self.settings)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
