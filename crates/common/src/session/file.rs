use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::kv::{KvBackend, KvError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileEntry {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Key-value store kept in a single JSON file.
///
/// Lets sessions outlive the process without a Redis server, e.g. between
/// CLI invocations. Expiry is checked against the wall clock; expired
/// entries are dropped whenever the file is rewritten.
#[derive(Debug, Clone)]
pub struct FileKv {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl FileKv {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<HashMap<String, FileEntry>, KvError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(HashMap::new()),
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| KvError::Internal(format!("{}: {}", self.path.display(), e))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn store(&self, mut entries: HashMap<String, FileEntry>) -> Result<(), KvError> {
        let now = Utc::now();
        entries.retain(|_, entry| entry.expires_at > now);

        let body = serde_json::to_vec_pretty(&entries)
            .map_err(|e| KvError::Internal(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        // write-then-rename so a crash never leaves a torn file
        let tmp = self.path.with_extension("tmp");
        write_private(&tmp, &body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

/// Session tokens are credentials: keep the file owner-only on unix.
#[cfg(unix)]
async fn write_private(path: &Path, body: &[u8]) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    use tokio::io::AsyncWriteExt;

    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
        .await?;
    // mode only applies on create; a leftover tmp file keeps its own bits
    file.set_permissions(std::fs::Permissions::from_mode(0o600))
        .await?;
    file.write_all(body).await?;
    file.sync_all().await
}

#[cfg(not(unix))]
async fn write_private(path: &Path, body: &[u8]) -> std::io::Result<()> {
    tokio::fs::write(path, body).await
}

#[async_trait]
impl KvBackend for FileKv {
    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<(), KvError> {
        let _guard = self.lock.lock().await;
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let mut entries = self.load().await?;
        entries.insert(key.to_string(), FileEntry { value, expires_at });
        self.store(entries).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let _guard = self.lock.lock().await;
        let entries = self.load().await?;
        Ok(entries
            .get(key)
            .filter(|entry| entry.expires_at > Utc::now())
            .map(|entry| entry.value.clone()))
    }

    async fn delete(&self, key: &str) -> Result<(), KvError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        if entries.remove(key).is_some() {
            self.store(entries).await?;
        }
        Ok(())
    }
}
