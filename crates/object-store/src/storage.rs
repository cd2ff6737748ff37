//! Object storage backend (S3/MinIO/local filesystem/memory) and backend selection.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::backend::{suffixed_pathname, BlobBackend, BlobObject};
use crate::error::{BlobError, Result};
use crate::http::{HttpBlobBackend, DEFAULT_API_URL};

/// Configuration for the blob backend.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlobStoreConfig {
    /// In-memory storage (for testing)
    #[default]
    Memory,

    /// Local filesystem storage
    Local {
        /// Path to the storage directory
        path: PathBuf,
    },

    /// S3-compatible storage (AWS S3, MinIO, etc.)
    S3 {
        /// S3 endpoint URL (e.g., "http://localhost:9000" for MinIO)
        endpoint: String,
        /// Access key ID
        access_key: String,
        /// Secret access key
        secret_key: String,
        /// Bucket name
        bucket: String,
        /// Optional region (defaults to "us-east-1")
        region: Option<String>,
    },

    /// Hosted blob REST API
    Http {
        /// API base url
        #[serde(default = "default_api_url")]
        api_url: Url,
        /// Read/write token. Without it every operation fails with
        /// [`BlobError::NotConfigured`].
        #[serde(default)]
        token: Option<String>,
    },
}

fn default_api_url() -> Url {
    Url::parse(DEFAULT_API_URL).expect("default blob api url must parse")
}

/// Connect to the backend described by `config`.
pub async fn connect(config: &BlobStoreConfig) -> Result<Arc<dyn BlobBackend>> {
    let backend: Arc<dyn BlobBackend> = match config {
        BlobStoreConfig::Http { api_url, token } => {
            Arc::new(HttpBlobBackend::new(api_url.clone(), token.clone())?)
        }
        other => Arc::new(Storage::new(other).await?),
    };
    Ok(backend)
}

/// [`BlobBackend`] over any `object_store` implementation.
#[derive(Debug, Clone)]
pub struct Storage {
    inner: Arc<dyn ObjectStore>,
}

impl Storage {
    /// Create a new storage backend from configuration.
    pub async fn new(config: &BlobStoreConfig) -> Result<Self> {
        let inner: Arc<dyn ObjectStore> = match config {
            BlobStoreConfig::Memory => Arc::new(InMemory::new()),

            BlobStoreConfig::Local { path } => {
                // Ensure directory exists
                tokio::fs::create_dir_all(path)
                    .await
                    .map_err(|_| BlobError::Path(path.clone()))?;
                Arc::new(
                    LocalFileSystem::new_with_prefix(path)
                        .map_err(|e| BlobError::InvalidConfig(e.to_string()))?,
                )
            }

            BlobStoreConfig::S3 {
                endpoint,
                access_key,
                secret_key,
                bucket,
                region,
            } => {
                let builder = AmazonS3Builder::new()
                    .with_endpoint(endpoint)
                    .with_access_key_id(access_key)
                    .with_secret_access_key(secret_key)
                    .with_bucket_name(bucket)
                    .with_region(region.as_deref().unwrap_or("us-east-1"))
                    .with_allow_http(endpoint.starts_with("http://"));

                let store: Arc<dyn ObjectStore> = Arc::new(
                    builder
                        .build()
                        .map_err(|e| BlobError::InvalidConfig(e.to_string()))?,
                );

                // Fail fast if the bucket doesn't exist
                let prefix = ObjectPath::from("");
                let mut stream = store.list(Some(&prefix));
                match stream.try_next().await {
                    Ok(_) => {}
                    Err(object_store::Error::NotFound { .. }) => {
                        return Err(BlobError::BucketNotFound(bucket.clone()));
                    }
                    Err(e) => {
                        let msg = e.to_string();
                        if msg.contains("NoSuchBucket")
                            || msg.contains("bucket") && msg.contains("not")
                        {
                            return Err(BlobError::BucketNotFound(bucket.clone()));
                        }
                        return Err(e.into());
                    }
                }
                drop(stream);

                store
            }

            BlobStoreConfig::Http { .. } => {
                return Err(BlobError::InvalidConfig(
                    "http backend is not an object store".to_string(),
                ))
            }
        };

        Ok(Self { inner })
    }

    /// Create an in-memory storage backend.
    pub fn memory() -> Self {
        Self {
            inner: Arc::new(InMemory::new()),
        }
    }

    /// Directory that contains every object a string `prefix` can match.
    ///
    /// `object_store` lists by path segment, so `content/blog` has to be
    /// listed from `content/` and filtered afterwards.
    fn listing_root(prefix: &str) -> ObjectPath {
        let encoded = encode_pathname(prefix, true);
        match encoded.rfind('/') {
            Some(idx) => ObjectPath::from(&encoded[..idx]),
            None => ObjectPath::from(""),
        }
    }

    fn location(url: &str) -> Result<ObjectPath> {
        ObjectPath::parse(url).map_err(|e| BlobError::InvalidUrl(format!("{}: {}", url, e)))
    }
}

/// Map a pathname onto an object location.
///
/// `object_store` percent-encodes some characters, drops empty segments and
/// rejects `.`/`..`, so pathnames are escaped first: bytes outside
/// `[A-Za-z0-9_-]` (and a leading `.`) become `=XX`, an empty segment
/// becomes `=`. Unescaped keys such as `content/blog.json` map to
/// themselves. With `partial`, the last segment may be a prefix of a longer
/// one and stays empty when empty; escaping is per byte, so the result is a
/// string prefix of every location whose pathname starts with the input.
fn encode_pathname(pathname: &str, partial: bool) -> String {
    let segments: Vec<&str> = pathname.split('/').collect();
    let last = segments.len() - 1;

    let mut encoded = String::with_capacity(pathname.len());
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            encoded.push('/');
        }
        if segment.is_empty() && !(partial && i == last) {
            encoded.push('=');
            continue;
        }
        for (j, byte) in segment.bytes().enumerate() {
            let plain = byte.is_ascii_alphanumeric()
                || byte == b'-'
                || byte == b'_'
                || (byte == b'.' && j > 0);
            if plain {
                encoded.push(byte as char);
            } else {
                encoded.push_str(&format!("={:02X}", byte));
            }
        }
    }
    encoded
}

/// Inverse of [`encode_pathname`]. Sequences it would not have produced are
/// kept as they are.
fn decode_location(location: &str) -> String {
    location
        .split('/')
        .map(decode_segment)
        .collect::<Vec<_>>()
        .join("/")
}

fn decode_segment(segment: &str) -> String {
    if segment == "=" {
        return String::new();
    }

    let bytes = segment.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'=' {
            let escaped = bytes
                .get(i + 1..i + 3)
                .filter(|hex| hex.iter().all(u8::is_ascii_hexdigit))
                .and_then(|hex| std::str::from_utf8(hex).ok())
                .and_then(|hex| u8::from_str_radix(hex, 16).ok());
            if let Some(byte) = escaped {
                decoded.push(byte);
                i += 3;
                continue;
            }
        }
        decoded.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&decoded).into_owned()
}

#[async_trait]
impl BlobBackend for Storage {
    async fn put(&self, prefix: &str, data: Bytes, _content_type: &str) -> Result<BlobObject> {
        let pathname = suffixed_pathname(prefix);
        let location = Self::location(&encode_pathname(&pathname, false))?;
        self.inner.put(&location, data.into()).await?;

        // The put result carries no timestamp; read it back from the store
        let meta = self.inner.head(&location).await?;
        Ok(BlobObject {
            url: meta.location.to_string(),
            pathname,
            uploaded_at: meta.last_modified,
        })
    }

    async fn list(&self, prefix: &str) -> Result<Vec<BlobObject>> {
        let root = Self::listing_root(prefix);
        let items: Vec<_> = self.inner.list(Some(&root)).try_collect().await?;

        Ok(items
            .into_iter()
            .filter_map(|meta| {
                let pathname = decode_location(meta.location.as_ref());
                pathname.starts_with(prefix).then(|| BlobObject {
                    url: meta.location.to_string(),
                    pathname,
                    uploaded_at: meta.last_modified,
                })
            })
            .collect())
    }

    async fn get(&self, url: &str) -> Result<Bytes> {
        let location = Self::location(url)?;
        match self.inner.get(&location).await {
            Ok(result) => Ok(result.bytes().await?),
            Err(object_store::Error::NotFound { .. }) => Err(BlobError::NotFound(url.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, url: &str) -> Result<()> {
        let location = Self::location(url)?;
        // Ignore NotFound errors - the object may already be deleted
        match self.inner.delete(&location).await {
            Ok(()) => Ok(()),
            Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
