use std::sync::Arc;

use blob_store::{BlobBackend, BlobObject};
use bytes::Bytes;

use super::{document_prefix, StoreError};

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Result of a completed write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    /// The object now holding the document
    pub object: BlobObject,
    /// Older versions deleted by the cleanup pass
    pub reaped: usize,
    /// Deletes (or the listing) that failed during cleanup; those versions
    /// are left for the next write to reap
    pub reap_failures: usize,
    /// A concurrent write produced a newer version, so ours was reaped too
    pub superseded: bool,
}

/// A serialized document that has not been uploaded yet.
///
/// Writing is create-then-reap: [`PendingWrite::upload`] adds a new object
/// next to the existing versions and only [`UploadedWrite::reap`] removes
/// the old ones, so the key is never left without an object.
#[derive(Debug)]
pub struct PendingWrite {
    backend: Arc<dyn BlobBackend>,
    key: String,
    body: Bytes,
}

impl PendingWrite {
    pub(crate) fn new(backend: Arc<dyn BlobBackend>, key: &str, body: Bytes) -> Self {
        Self {
            backend,
            key: key.to_string(),
            body,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Phase one: create the new version. Any failure fails the write.
    pub async fn upload(self) -> Result<UploadedWrite, StoreError> {
        let size = self.body.len();
        let object = self
            .backend
            .put(&document_prefix(&self.key), self.body, JSON_CONTENT_TYPE)
            .await?;

        tracing::info!(key = %self.key, url = %object.url, size = size, "document version uploaded");

        Ok(UploadedWrite {
            backend: self.backend,
            key: self.key,
            object,
        })
    }
}

/// A write whose new version exists; older versions may still be around.
#[derive(Debug)]
pub struct UploadedWrite {
    backend: Arc<dyn BlobBackend>,
    key: String,
    object: BlobObject,
}

impl UploadedWrite {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn object(&self) -> &BlobObject {
        &self.object
    }

    /// Phase two: delete every version older than the newest one seen.
    ///
    /// Never fails. When a concurrent writer's version is newer than ours,
    /// ours is deleted as well and the outcome is marked `superseded`; the
    /// newest version under a key is never deleted.
    pub async fn reap(self) -> WriteOutcome {
        let mut outcome = WriteOutcome {
            object: self.object,
            reaped: 0,
            reap_failures: 0,
            superseded: false,
        };

        let versions = match self.backend.list(&document_prefix(&self.key)).await {
            Ok(versions) => versions,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "failed to list versions for cleanup");
                outcome.reap_failures += 1;
                return outcome;
            }
        };

        // Our object as the listing reports it; backends may stamp the
        // upload time differently from the put response.
        let listed_ours = versions.iter().find(|v| v.url == outcome.object.url);
        let ours = listed_ours.unwrap_or(&outcome.object).clone();
        let newest_url = versions
            .iter()
            .chain(std::iter::once(&ours))
            .max_by(|a, b| a.recency().cmp(&b.recency()))
            .map(|newest| newest.url.clone())
            .unwrap_or_else(|| ours.url.clone());

        let mut stale: Vec<&BlobObject> = versions.iter().filter(|v| v.url != newest_url).collect();
        if ours.url != newest_url {
            tracing::debug!(key = %self.key, newest = %newest_url, "superseded by a concurrent write");
            outcome.superseded = true;
            if listed_ours.is_none() {
                stale.push(&ours);
            }
        }

        for stale in stale {
            match self.backend.delete(&stale.url).await {
                Ok(()) => outcome.reaped += 1,
                Err(e) => {
                    tracing::warn!(
                        key = %self.key,
                        url = %stale.url,
                        error = %e,
                        "failed to delete stale document version"
                    );
                    outcome.reap_failures += 1;
                }
            }
        }

        tracing::debug!(
            key = %self.key,
            reaped = outcome.reaped,
            failures = outcome.reap_failures,
            "document cleanup finished"
        );

        outcome
    }
}
