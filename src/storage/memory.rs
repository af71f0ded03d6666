//! In-memory store for tests and dry runs

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::{StateStore, StorageError, StorageResult};
use crate::models::PersistedState;

/// In-memory implementation of [`StateStore`]
///
/// Clones share the same state, so a test can keep a handle and inspect what
/// the scheduler saved.
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    state: Arc<Mutex<PersistedState>>,
    fail_saves: Arc<AtomicBool>,
    saves: Arc<AtomicUsize>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-loaded with `state`
    pub fn with_state(state: PersistedState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            ..Default::default()
        }
    }

    /// Make every following save fail
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Current stored state
    pub fn snapshot(&self) -> PersistedState {
        self.state
            .lock()
            .map(|state| state.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn load(&self) -> StorageResult<PersistedState> {
        self.state
            .lock()
            .map(|state| state.clone())
            .map_err(|_| StorageError::Unavailable("state lock poisoned".to_string()))
    }

    async fn save(&self, state: &PersistedState) -> StorageResult<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("injected save failure".to_string()));
        }

        let mut guard = self
            .state
            .lock()
            .map_err(|_| StorageError::Unavailable("state lock poisoned".to_string()))?;
        *guard = state.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
