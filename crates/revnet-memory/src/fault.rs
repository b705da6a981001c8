use std::sync::{Arc, Mutex};

/// One-shot failure switch shared between clones of a backend.
///
/// Arming it makes the next guarded operation fail with the given message;
/// the switch disarms itself once it fires.
#[derive(Debug, Clone, Default)]
pub(crate) struct FaultSlot(Arc<Mutex<Option<String>>>);

impl FaultSlot {
    pub(crate) fn arm(&self, message: impl Into<String>) {
        *self.0.lock().unwrap_or_else(|e| e.into_inner()) = Some(message.into());
    }

    pub(crate) fn take(&self) -> Option<String> {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).take()
    }
}
