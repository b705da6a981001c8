//! # Revnet Agent
//!
//! The startup components of the agent. [`Agent::start`] runs them in order:
//!
//! 1. [`Initializer`] validates the configuration and builds the service
//!    handles, all or nothing.
//! 2. Without handles the agent comes up in limited mode and stops there.
//! 3. With handles it opens the document and realtime listeners, runs
//!    [`sync_remote_config`] (which may trigger [`run_test_write`]) and comes
//!    up in full mode.
//!
//! Every component takes an [`AgentContext`] and returns a typed outcome;
//! none of them fails toward its caller.

pub mod context;
pub mod initializer;
pub mod listeners;
pub mod orchestrator;
pub mod sync;
pub mod test_write;

#[cfg(test)]
mod log_capture;

pub use context::AgentContext;
pub use initializer::Initializer;
pub use listeners::{
    ListenerHandle, ListenerTarget, start_document_listener, start_realtime_listener,
};
pub use orchestrator::{Agent, AgentStartup, AgentState, LimitedReason, StartupMode};
pub use sync::{RemoteValues, SyncOutcome, SyncReport, sync_remote_config};
pub use test_write::{TestWriteOutcome, run_test_write};
