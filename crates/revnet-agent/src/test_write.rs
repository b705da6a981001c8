//! Round-trip write check against both stores.

use crate::context::AgentContext;
use revnet_core::telemetry::{DB_WRITE_FIRESTORE_EVENT, DB_WRITE_RTDB_EVENT};
use revnet_core::{DocumentId, ServiceError, TelemetryEvent, TestPayload};
use tracing::{error, info, warn};

/// Result of one test-write invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum TestWriteOutcome {
    /// The session is not ready; neither store was touched
    Skipped,
    /// Both writes landed
    Completed { document_id: DocumentId },
    /// The document write failed; the realtime write was not attempted
    DocumentWriteFailed(ServiceError),
    /// The document write landed and stays; the realtime write failed
    RealtimeWriteFailed {
        document_id: DocumentId,
        error: ServiceError,
    },
}

impl TestWriteOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, TestWriteOutcome::Completed { .. })
    }
}

/// Write one fresh [`TestPayload`] to the document store, then the same
/// payload to the realtime store.
///
/// The writes are sequential, not transactional. A failure stops the
/// sequence and nothing is rolled back. Each successful write emits its own
/// telemetry event.
pub async fn run_test_write(ctx: &AgentContext) -> TestWriteOutcome {
    let Some(handles) = ctx.session().handles() else {
        warn!("Services not initialized; test write skipped");
        return TestWriteOutcome::Skipped;
    };

    let settings = ctx.settings();
    let payload = TestPayload::now(
        &settings.payload_source,
        &settings.payload_device,
        &settings.payload_status,
    );

    info!(collection = %settings.document_collection, "Writing test payload to document store");
    let document_id = match handles
        .documents
        .add_document(&settings.document_collection, payload.to_value())
        .await
    {
        Ok(id) => id,
        Err(e) => {
            error!(error = %e, "Test write failed");
            return TestWriteOutcome::DocumentWriteFailed(e);
        }
    };
    ctx.telemetry()
        .emit(TelemetryEvent::new(DB_WRITE_FIRESTORE_EVENT).with("node", settings.node.as_str()));

    info!(path = %settings.write_path, "Writing test payload to realtime store");
    if let Err(e) = handles
        .realtime
        .set(&settings.write_path, payload.to_value())
        .await
    {
        error!(error = %e, document = %document_id, "Test write failed");
        return TestWriteOutcome::RealtimeWriteFailed {
            document_id,
            error: e,
        };
    }
    ctx.telemetry()
        .emit(TelemetryEvent::new(DB_WRITE_RTDB_EVENT).with("node", settings.node.as_str()));

    info!(document = %document_id, "Test write completed");
    TestWriteOutcome::Completed { document_id }
}
