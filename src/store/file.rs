use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{LastSeenStore, StoreError};

/// On-disk layout, e.g. `{"id": "17900000000000000"}`.
#[derive(Debug, Serialize, Deserialize)]
struct StateFile {
    id: String,
}

/// File-backed store holding the last notified post id as a small JSON
/// document.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl LastSeenStore for FileStore {
    async fn get(&self) -> Result<Option<String>, StoreError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let state: StateFile = serde_json::from_str(&raw)?;
        Ok(Some(state.id))
    }

    async fn set(&self, id: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let body = serde_json::to_string_pretty(&StateFile { id: id.to_string() })?;

        // Write-then-rename so a crash mid-write cannot leave a torn file.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}
