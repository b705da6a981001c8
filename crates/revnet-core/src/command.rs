//! Commands delivered through the `gemini_command` remote-config value.

use std::fmt;

/// Wire value meaning "nothing to do".
pub const IDLE_COMMAND: &str = "idle";

/// Wire value that triggers the test write.
pub const TEST_DATA_COMMAND: &str = "test_data";

/// Decoded remote command.
///
/// Decoding never fails: anything that is not a known command lands in
/// [`AgentCommand::Unrecognized`] so it can be reported instead of silently
/// dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentCommand {
    /// Empty value or `idle`
    Idle,
    /// `test_data`: write one payload to each store
    TestData,
    /// Any other value, kept verbatim
    Unrecognized(String),
}

impl AgentCommand {
    /// Decode the raw remote-config string. Matching is exact and
    /// case-sensitive.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "" | IDLE_COMMAND => AgentCommand::Idle,
            TEST_DATA_COMMAND => AgentCommand::TestData,
            other => AgentCommand::Unrecognized(other.to_string()),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, AgentCommand::Idle)
    }
}

impl From<&str> for AgentCommand {
    fn from(raw: &str) -> Self {
        AgentCommand::parse(raw)
    }
}

impl fmt::Display for AgentCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentCommand::Idle => f.write_str(IDLE_COMMAND),
            AgentCommand::TestData => f.write_str(TEST_DATA_COMMAND),
            AgentCommand::Unrecognized(raw) => write!(f, "unrecognized({})", raw),
        }
    }
}
