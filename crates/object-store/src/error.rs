//! Error types for the blob backends.

use std::path::PathBuf;

use reqwest::StatusCode;

/// Errors that can occur when talking to a blob backend.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// No write token was configured for the hosted blob API
    #[error("blob storage is not configured: missing read/write token")]
    NotConfigured,

    /// The backend could not be reached (connect, timeout, reset)
    #[error("blob backend unavailable: {0}")]
    Unavailable(#[source] reqwest::Error),

    /// The backend answered with a non-success status
    #[error("blob backend rejected request with HTTP {status}: {body}")]
    Rejected { status: StatusCode, body: String },

    /// Object does not exist (or no longer exists)
    #[error("blob not found: {0}")]
    NotFound(String),

    /// Object storage error
    #[error("object storage error: {0}")]
    ObjectStore(#[from] object_store::Error),

    /// A listing or upload response could not be decoded
    #[error("malformed blob backend response: {0}")]
    Decode(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Local storage directory could not be used
    #[error("path error: {0}")]
    Path(PathBuf),

    /// A url that does not name an object in this store
    #[error("invalid object url: {0}")]
    InvalidUrl(String),

    /// S3 bucket not found - must be created before use
    #[error("S3 bucket '{0}' does not exist. Create it before starting folio.")]
    BucketNotFound(String),
}

impl BlobError {
    /// True when the failure is a transport-level outage rather than the
    /// backend refusing the request.
    pub fn is_unavailable(&self) -> bool {
        match self {
            BlobError::Unavailable(_) | BlobError::Io(_) => true,
            BlobError::Rejected { status, .. } => status.is_server_error(),
            BlobError::ObjectStore(e) => !matches!(
                e,
                object_store::Error::NotFound { .. }
                    | object_store::Error::InvalidPath { .. }
                    | object_store::Error::NotSupported { .. }
                    | object_store::Error::NotImplemented
            ),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for BlobError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            BlobError::Decode(e.to_string())
        } else {
            BlobError::Unavailable(e)
        }
    }
}

/// Result type alias for blob backend operations.
pub type Result<T> = std::result::Result<T, BlobError>;
