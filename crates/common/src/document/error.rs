use blob_store::BlobError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The blob backend has no credentials; fatal and never retried
    #[error("storage not configured")]
    StorageNotConfigured,
    /// Network or backend outage during put/list/get/delete
    #[error("blob backend unavailable: {0}")]
    BackendUnavailable(#[source] BlobError),
    /// The backend answered but refused or failed the request
    #[error("blob backend error: {0}")]
    Backend(#[source] BlobError),
    /// Stored bytes under `key` are not valid JSON for the requested type
    #[error("document {key} is corrupt: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode document {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl From<BlobError> for StoreError {
    fn from(e: BlobError) -> Self {
        match e {
            BlobError::NotConfigured => StoreError::StorageNotConfigured,
            e if e.is_unavailable() => StoreError::BackendUnavailable(e),
            e => StoreError::Backend(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_errors_are_classified() {
        assert!(matches!(
            StoreError::from(BlobError::NotConfigured),
            StoreError::StorageNotConfigured
        ));
        assert!(matches!(
            StoreError::from(BlobError::Io(std::io::Error::other("reset"))),
            StoreError::BackendUnavailable(_)
        ));
        assert!(matches!(
            StoreError::from(BlobError::Decode("truncated".to_string())),
            StoreError::Backend(_)
        ));
    }
}
