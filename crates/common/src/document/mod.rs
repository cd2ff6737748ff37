//! JSON documents over an append-only, eventually consistent blob store.
//!
//! A document key (e.g. `content/blog.json`) owns every object stored under
//! the `"{key}/"` prefix. The newest object is the document; older ones are
//! versions waiting to be reaped by the next write.

mod error;
mod write;

use std::sync::Arc;

use blob_store::{BlobBackend, BlobError, BlobObject};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

pub use error::StoreError;
pub use write::{PendingWrite, UploadedWrite, WriteOutcome, JSON_CONTENT_TYPE};

/// Listings tried by a read whose latest version keeps vanishing under it.
const MAX_FETCH_ATTEMPTS: usize = 4;

/// Prefix under which all versions of `key` live.
pub(crate) fn document_prefix(key: &str) -> String {
    format!("{}/", key.trim_end_matches('/'))
}

/// The authoritative version: newest upload, url as tie-break.
fn latest(versions: &[BlobObject]) -> Option<&BlobObject> {
    versions.iter().max_by(|a, b| a.recency().cmp(&b.recency()))
}

fn decode<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> Result<T, StoreError> {
    serde_json::from_slice(bytes).map_err(|source| StoreError::Corrupt {
        key: key.to_string(),
        source,
    })
}

#[derive(Debug, Clone)]
pub struct DocumentStore {
    backend: Arc<dyn BlobBackend>,
}

impl DocumentStore {
    pub fn new(backend: Arc<dyn BlobBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn BlobBackend> {
        &self.backend
    }

    /// Read the latest version of `key`, or `default` if it was never written.
    ///
    /// Backend failures while listing or fetching are logged and answered
    /// with `default`. Bytes that do not parse are reported as
    /// [`StoreError::Corrupt`], and a missing token as
    /// [`StoreError::StorageNotConfigured`].
    pub async fn read<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T, StoreError> {
        let bytes = match self.fetch_latest(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                tracing::debug!(key = %key, "document never written, serving default");
                return Ok(default);
            }
            Err(StoreError::StorageNotConfigured) => return Err(StoreError::StorageNotConfigured),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "document read failed, serving default");
                return Ok(default);
            }
        };

        decode(key, &bytes)
    }

    /// Like [`DocumentStore::read`], but backend failures are returned
    /// instead of answered with `default`.
    ///
    /// For read-modify-write paths, where treating an outage as "never
    /// written" would overwrite real data.
    pub async fn read_strict<T: DeserializeOwned>(
        &self,
        key: &str,
        default: T,
    ) -> Result<T, StoreError> {
        match self.fetch_latest(key).await? {
            Some(bytes) => decode(key, &bytes),
            None => Ok(default),
        }
    }

    /// Serialize `document` into a write that has not touched the backend yet.
    pub fn prepare<T: Serialize + ?Sized>(
        &self,
        key: &str,
        document: &T,
    ) -> Result<PendingWrite, StoreError> {
        let body = serde_json::to_vec_pretty(document).map_err(|source| StoreError::Encode {
            key: key.to_string(),
            source,
        })?;
        Ok(PendingWrite::new(
            self.backend.clone(),
            key,
            Bytes::from(body),
        ))
    }

    /// Store `document` as the new version of `key`, then reap older versions.
    ///
    /// Fails only if the new version could not be created; cleanup
    /// problems are reported in the returned [`WriteOutcome`].
    pub async fn write<T: Serialize + ?Sized>(
        &self,
        key: &str,
        document: &T,
    ) -> Result<WriteOutcome, StoreError> {
        let uploaded = self.prepare(key, document)?.upload().await?;
        Ok(uploaded.reap().await)
    }

    /// Every stored version of `key`, newest first.
    pub async fn versions(&self, key: &str) -> Result<Vec<BlobObject>, StoreError> {
        let mut versions = self.backend.list(&document_prefix(key)).await?;
        versions.sort_by(|a, b| b.recency().cmp(&a.recency()));
        Ok(versions)
    }

    /// Delete every version of `key`. Returns how many objects were removed.
    pub async fn remove(&self, key: &str) -> Result<usize, StoreError> {
        let versions = self.backend.list(&document_prefix(key)).await?;
        for version in &versions {
            self.backend.delete(&version.url).await?;
        }
        tracing::info!(key = %key, removed = versions.len(), "document removed");
        Ok(versions.len())
    }

    /// Append `entry` to the JSON array stored at `key`, keeping at most
    /// `max_entries` of the newest entries.
    ///
    /// Best effort: every failure is logged and swallowed. Unlike
    /// [`DocumentStore::read`], a failed read skips the append instead of
    /// starting over from an empty array.
    pub async fn append_best_effort(&self, key: &str, entry: Value, max_entries: usize) {
        let mut entries: Vec<Value> = match self.fetch_latest(key).await {
            Ok(None) => Vec::new(),
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "log document is not an array, skipping append");
                    return;
                }
            },
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "failed to read log document, skipping append");
                return;
            }
        };

        entries.push(entry);
        if entries.len() > max_entries {
            let excess = entries.len() - max_entries;
            entries.drain(..excess);
        }

        if let Err(e) = self.write(key, &entries).await {
            tracing::warn!(key = %key, error = %e, "failed to append to log document");
        }
    }

    /// Bytes of the latest version, `None` when no version exists.
    ///
    /// A listed version that is gone by the time it is fetched was reaped
    /// by a newer write, so the listing is retried.
    async fn fetch_latest(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        let mut attempt = 1;
        loop {
            let versions = self.backend.list(&document_prefix(key)).await?;
            let Some(latest) = latest(&versions) else {
                return Ok(None);
            };

            tracing::debug!(key = %key, url = %latest.url, versions = versions.len(), "reading document");
            match self.backend.get(&latest.url).await {
                Ok(bytes) => return Ok(Some(bytes)),
                Err(BlobError::NotFound(url)) if attempt < MAX_FETCH_ATTEMPTS => {
                    tracing::debug!(key = %key, url = %url, attempt = attempt, "latest version reaped mid-read, listing again");
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
