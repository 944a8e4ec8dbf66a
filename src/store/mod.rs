//! Durable "last notified post id" storage.
//!
//! The scheduler's de-duplication depends on this value surviving process
//! restarts. Two interchangeable backends implement the same contract: a
//! JSON file and a SQLite database.

mod file;
mod sqlite;

pub use file::FileStore;
pub use sqlite::SqliteStore;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{Config, StoreBackend};

/// A failure reading or writing the durable store. Surfaced loudly by the
/// scheduler because it undermines de-duplication, but never fatal to the
/// process.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state file I/O failed")]
    Io(#[from] std::io::Error),
    #[error("state file is not valid JSON")]
    Corrupt(#[from] serde_json::Error),
    #[error("database operation failed")]
    Database(#[from] sqlx::Error),
}

/// Durable record of the last notified post id.
#[async_trait]
pub trait LastSeenStore: Send + Sync {
    /// The last recorded post id, or `None` when nothing has been notified
    /// yet. An empty store is a valid, common state, not an error.
    async fn get(&self) -> Result<Option<String>, StoreError>;

    /// Durably record `id`. Recording the same id again is a no-op, never a
    /// duplicate-key failure.
    async fn set(&self, id: &str) -> Result<(), StoreError>;
}

/// Open the store backend selected by the configuration.
///
/// # Errors
///
/// Returns an error if the SQLite database cannot be opened or migrated.
pub async fn open(config: &Config) -> Result<Arc<dyn LastSeenStore>, StoreError> {
    match config.store_backend {
        StoreBackend::File => Ok(Arc::new(FileStore::new(config.state_file_path.clone()))),
        StoreBackend::Sqlite => Ok(Arc::new(SqliteStore::new(&config.database_path).await?)),
    }
}
