use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;

#[derive(thiserror::Error, Debug)]
pub enum KvError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("kv file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("kv backend error: {0}")]
    Internal(String),
}

/// Key-value backend with native per-key expiry.
///
/// Expired keys must read as absent; no sweeping is expected from callers.
#[async_trait]
pub trait KvBackend: Send + Sync + Debug + 'static {
    /// Store `value` under `key`, replacing any previous value, expiring
    /// after `ttl`.
    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<(), KvError>;

    async fn get(&self, key: &str) -> Result<Option<String>, KvError>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), KvError>;
}
