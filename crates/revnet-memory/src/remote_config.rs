//! In-process remote-config service.

use crate::fault::FaultSlot;
use async_trait::async_trait;
use revnet_core::settings::DEFAULT_MIN_FETCH_INTERVAL;
use revnet_core::{RemoteConfig, ServiceError, ServiceResult};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[derive(Debug)]
struct ConfigState {
    defaults: BTreeMap<String, String>,
    remote: BTreeMap<String, String>,
    remote_version: u64,
    active: BTreeMap<String, String>,
    active_version: u64,
    min_fetch_interval: Duration,
    last_fetch: Option<Instant>,
}

/// Remote-config service with a publishable template.
///
/// [`publish`](Self::publish) changes the server-side template;
/// `fetch_and_activate` copies it into the active set, at most once per
/// minimum fetch interval.
#[derive(Clone)]
pub struct InMemoryRemoteConfig {
    state: Arc<Mutex<ConfigState>>,
    fetch_fault: FaultSlot,
    fetch_calls: Arc<AtomicUsize>,
}

impl Default for InMemoryRemoteConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRemoteConfig {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ConfigState {
                defaults: BTreeMap::new(),
                remote: BTreeMap::new(),
                remote_version: 0,
                active: BTreeMap::new(),
                active_version: 0,
                min_fetch_interval: DEFAULT_MIN_FETCH_INTERVAL,
                last_fetch: None,
            })),
            fetch_fault: FaultSlot::default(),
            fetch_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Set one value in the server-side template.
    pub fn publish(&self, key: impl Into<String>, value: impl Into<String>) {
        let mut state = self.lock();
        state.remote.insert(key.into(), value.into());
        state.remote_version += 1;
    }

    /// Make the next `fetch_and_activate` fail with `message`.
    pub fn fail_next_fetch(&self, message: impl Into<String>) {
        self.fetch_fault.arm(message);
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn defaults(&self) -> BTreeMap<String, String> {
        self.lock().defaults.clone()
    }

    pub fn minimum_fetch_interval(&self) -> Duration {
        self.lock().min_fetch_interval
    }

    fn lock(&self) -> MutexGuard<'_, ConfigState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl RemoteConfig for InMemoryRemoteConfig {
    fn set_defaults(&self, defaults: BTreeMap<String, String>) {
        self.lock().defaults = defaults;
    }

    fn set_minimum_fetch_interval(&self, interval: Duration) {
        self.lock().min_fetch_interval = interval;
    }

    async fn fetch_and_activate(&self) -> ServiceResult<bool> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = self.fetch_fault.take() {
            return Err(ServiceError::FetchFailed(reason));
        }

        let mut state = self.lock();
        let now = Instant::now();
        if let Some(last) = state.last_fetch {
            if now.duration_since(last) < state.min_fetch_interval {
                tracing::debug!("Remote config served from cache (minimum fetch interval)");
                return Ok(false);
            }
        }
        state.last_fetch = Some(now);

        if state.remote_version == state.active_version {
            return Ok(false);
        }
        state.active = state.remote.clone();
        state.active_version = state.remote_version;
        Ok(true)
    }

    fn get_string(&self, key: &str) -> String {
        let state = self.lock();
        state
            .active
            .get(key)
            .or_else(|| state.defaults.get(key))
            .cloned()
            .unwrap_or_default()
    }
}
