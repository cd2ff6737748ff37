//! Append-only blob backends for folio
//!
//! Documents are persisted as immutable, url-addressed objects. This crate
//! defines the [`BlobBackend`] contract and the adapters behind it:
//!
//! - `object_store` implementations: S3/MinIO, local filesystem, in-memory
//! - a hosted blob REST API client (Vercel Blob compatible)
//!
//! Every `put` yields a fresh object under the given prefix; nothing is
//! ever overwritten in place. Backends may be eventually consistent.
//!
//! # Example
//!
//! ```rust,no_run
//! use bytes::Bytes;
//! use folio_object_store::{connect, BlobStoreConfig};
//!
//! # async fn example() -> Result<(), folio_object_store::BlobError> {
//! let backend = connect(&BlobStoreConfig::Memory).await?;
//! let object = backend
//!     .put("content/blog.json/", Bytes::from("[]"), "application/json")
//!     .await?;
//! let bytes = backend.get(&object.url).await?;
//! # Ok(())
//! # }
//! ```

mod backend;
mod error;
mod http;
mod storage;

pub use backend::{BlobBackend, BlobObject};
pub use error::{BlobError, Result};
pub use http::{HttpBlobBackend, DEFAULT_API_URL};
pub use storage::{connect, BlobStoreConfig, Storage};
