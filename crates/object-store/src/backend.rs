//! The contract every blob backend implements.

use std::fmt::Debug;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// An immutable object created by [`BlobBackend::put`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobObject {
    /// Backend-assigned address, unique per upload
    pub url: String,
    /// Logical path of the object (prefix + random suffix)
    pub pathname: String,
    /// When the backend accepted the upload
    pub uploaded_at: DateTime<Utc>,
}

impl BlobObject {
    /// Ordering key used to pick the authoritative version under a prefix.
    ///
    /// Ties on `uploaded_at` fall back to the url, which embeds a
    /// time-ordered suffix.
    pub fn recency(&self) -> (DateTime<Utc>, &str) {
        (self.uploaded_at, self.url.as_str())
    }
}

/// Remote append-only object store.
///
/// Implementations are eventually consistent: a `list` straight after a
/// `put` may not show the new object yet. `put` never overwrites, every
/// call yields a fresh url.
#[async_trait]
pub trait BlobBackend: Send + Sync + Debug + 'static {
    /// Upload `data` as a new object whose pathname starts with `prefix`.
    async fn put(&self, prefix: &str, data: Bytes, content_type: &str) -> Result<BlobObject>;

    /// List every object whose pathname starts with `prefix`.
    async fn list(&self, prefix: &str) -> Result<Vec<BlobObject>>;

    /// Fetch the bytes behind `url`, bypassing any caching layer.
    async fn get(&self, url: &str) -> Result<Bytes>;

    /// Delete the object behind `url`. Missing objects are not an error.
    async fn delete(&self, url: &str) -> Result<()>;
}

/// Build a unique pathname under `prefix`.
///
/// UUID v7 is time-ordered, so lexical url order follows creation order.
pub(crate) fn suffixed_pathname(prefix: &str) -> String {
    format!("{}{}", prefix, uuid::Uuid::now_v7().simple())
}
