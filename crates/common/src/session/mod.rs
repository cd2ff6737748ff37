//! Time-limited sessions keyed by opaque bearer tokens.
//!
//! A token is either absent or active. `create` makes it active until
//! `delete` or until the backend expires it, whichever comes first. There is
//! no renewal.

mod file;
mod kv;
mod memory;
mod redis_kv;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use file::FileKv;
pub use kv::{KvBackend, KvError};
pub use memory::MemoryKv;
pub use redis_kv::RedisKv;

/// Sessions live for 24 hours.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

const SESSION_KEY_PREFIX: &str = "session:";

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("session backend error: {0}")]
    Kv(#[from] KvError),
    #[error("malformed session record: {0}")]
    Codec(#[from] serde_json::Error),
}

/// What the backend stores for each token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionRecord {
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    kv: Arc<dyn KvBackend>,
    ttl: Duration,
}

fn session_key(token: &str) -> String {
    format!("{}{}", SESSION_KEY_PREFIX, token)
}

impl SessionStore {
    pub fn new(kv: Arc<dyn KvBackend>, ttl: Duration) -> Self {
        Self { kv, ttl }
    }

    /// In-memory sessions with the default TTL.
    pub fn memory() -> Self {
        Self::new(Arc::new(MemoryKv::new()), DEFAULT_SESSION_TTL)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Activate `token` for one TTL. The caller is responsible for the
    /// token being random; an existing session under the same token is
    /// replaced.
    pub async fn create(&self, token: &str) -> Result<Session, SessionError> {
        let created_at = Utc::now();
        let record = serde_json::to_string(&SessionRecord { created_at })?;
        self.kv.set_ex(&session_key(token), record, self.ttl).await?;

        tracing::info!(ttl_secs = self.ttl.as_secs(), "session created");
        Ok(self.session(token, created_at))
    }

    /// True iff `token` has an unexpired session.
    pub async fn validate(&self, token: &str) -> Result<bool, SessionError> {
        if token.is_empty() {
            return Ok(false);
        }
        Ok(self.kv.get(&session_key(token)).await?.is_some())
    }

    /// Session details for `token`, if active.
    pub async fn get(&self, token: &str) -> Result<Option<Session>, SessionError> {
        if token.is_empty() {
            return Ok(None);
        }
        let Some(raw) = self.kv.get(&session_key(token)).await? else {
            return Ok(None);
        };

        let record: SessionRecord = serde_json::from_str(&raw)?;
        Ok(Some(self.session(token, record.created_at)))
    }

    /// End the session for `token`. Idempotent.
    pub async fn delete(&self, token: &str) -> Result<(), SessionError> {
        self.kv.delete(&session_key(token)).await?;
        tracing::info!("session deleted");
        Ok(())
    }

    fn session(&self, token: &str, created_at: DateTime<Utc>) -> Session {
        let expires_at = chrono::Duration::from_std(self.ttl)
            .ok()
            .and_then(|ttl| created_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Session {
            token: token.to_string(),
            created_at,
            expires_at,
        }
    }
}
