use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::debug;

use super::{LastSeenStore, StoreError};

/// The single logical key this service persists.
const LAST_SEEN_KEY: &str = "last_post";

/// SQLite-backed store, for deployments where only a mounted data path
/// survives restarts.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database at `path` and run migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails or migrations fail.
    pub async fn new(path: &Path) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(10));

        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS last_seen (
                key TEXT PRIMARY KEY,
                post_id TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            ",
        )
        .execute(&self.pool)
        .await?;
        debug!("Store migrations complete");
        Ok(())
    }
}

#[async_trait]
impl LastSeenStore for SqliteStore {
    async fn get(&self) -> Result<Option<String>, StoreError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT post_id FROM last_seen WHERE key = ?")
            .bind(LAST_SEEN_KEY)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(id,)| id))
    }

    async fn set(&self, id: &str) -> Result<(), StoreError> {
        // Upsert: re-recording an id must not trip the primary key.
        sqlx::query(
            r"
            INSERT INTO last_seen (key, post_id, updated_at)
            VALUES (?, ?, datetime('now'))
            ON CONFLICT(key) DO UPDATE
            SET post_id = excluded.post_id, updated_at = excluded.updated_at
            ",
        )
        .bind(LAST_SEEN_KEY)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
