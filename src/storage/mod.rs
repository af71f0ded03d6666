//! Persistence of the "last known" state
//!
//! The scheduler loads the [`PersistedState`] once at startup and saves the
//! whole pair after every confirmed new-content event. Backends sit behind
//! the [`StateStore`] trait:
//!
//! ```text
//! ┌─────────────────┐ ┌─────────────────┐ ┌─────────────────┐
//! │      JSON       │ │     SQLite      │ │     Memory      │
//! │  single document│ │  history tables │ │ tests, dry runs │
//! └─────────────────┘ └─────────────────┘ └─────────────────┘
//! ```

pub mod json;
pub mod memory;
pub mod sqlite;

use async_trait::async_trait;

use crate::config::{StorageBackend, StorageConfig};
use crate::models::PersistedState;

pub use json::JsonStateStore;
pub use memory::MemoryStateStore;
pub use sqlite::SqliteStateStore;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur while loading or saving state
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// State document could not be encoded or decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// SQLite error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Stored data is unreadable
    #[error("Corrupt state: {0}")]
    Corrupt(String),

    /// Backend is unavailable (poisoned lock, failed worker task, injected failure)
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Durable storage for the persisted state pair
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Load the stored state; a store with nothing saved yields the empty state
    async fn load(&self) -> StorageResult<PersistedState>;

    /// Replace the stored state
    async fn save(&self, state: &PersistedState) -> StorageResult<()>;
}

/// Open the backend selected in the configuration
pub fn open_store(config: &StorageConfig) -> StorageResult<Box<dyn StateStore>> {
    match config.backend {
        StorageBackend::Json => Ok(Box::new(JsonStateStore::new(&config.path))),
        StorageBackend::Sqlite => Ok(Box::new(SqliteStateStore::new(
            &config.path,
            config.retention_days,
        )?)),
    }
}
