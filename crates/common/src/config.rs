use std::path::PathBuf;
use std::time::Duration;

use blob_store::BlobStoreConfig;
use serde::{Deserialize, Serialize};

use crate::auth::DEFAULT_MIN_PASSWORD_LENGTH;
use crate::session::DEFAULT_SESSION_TTL;

/// Blob backend token, as issued by the hosted blob service.
pub const BLOB_TOKEN_ENV: &str = "BLOB_READ_WRITE_TOKEN";
/// Redis url for the session store.
pub const KV_URL_ENV: &str = "KV_URL";
pub const REDIS_URL_ENV: &str = "REDIS_URL";

/// Where sessions are kept.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KvConfig {
    /// In-process, lost on restart
    #[default]
    Memory,
    /// A JSON file on local disk
    File { path: PathBuf },
    /// Redis (or any Redis-protocol service)
    Redis { url: String },
}

/// Document keys for each content collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DocumentKeys {
    pub blog: String,
    pub portfolio: String,
    pub admin: String,
    pub visitors: String,
}

impl Default for DocumentKeys {
    fn default() -> Self {
        Self {
            blog: "content/blog.json".to_string(),
            portfolio: "content/portfolio.json".to_string(),
            admin: "content/admin.json".to_string(),
            visitors: "content/visitors.json".to_string(),
        }
    }
}

/// Everything needed to open the document and session stores.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    /// Session lifetime in seconds (defaults to 24 hours)
    pub session_ttl_secs: u64,
    /// Minimum length for a new admin password
    pub min_password_length: usize,
    /// Cap on entries kept in the visitor log
    pub max_visitor_entries: usize,
    // tables last, so the struct serializes to TOML
    pub blob: BlobStoreConfig,
    pub kv: KvConfig,
    pub documents: DocumentKeys,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            session_ttl_secs: DEFAULT_SESSION_TTL.as_secs(),
            min_password_length: DEFAULT_MIN_PASSWORD_LENGTH,
            max_visitor_entries: 1000,
            blob: BlobStoreConfig::default(),
            kv: KvConfig::default(),
            documents: DocumentKeys::default(),
        }
    }
}

impl StoreConfig {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    /// Apply credentials from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_vars(|name| std::env::var(name).ok());
    }

    /// Apply credentials from `lookup`:
    /// - the blob token fills a missing `http` backend token
    /// - a KV / Redis url switches sessions to Redis
    pub fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let BlobStoreConfig::Http { token, .. } = &mut self.blob {
            if token.is_none() {
                *token = non_empty(BLOB_TOKEN_ENV);
            }
        }

        if let Some(url) = non_empty(KV_URL_ENV).or_else(|| non_empty(REDIS_URL_ENV)) {
            self.kv = KvConfig::Redis { url };
        }
    }
}
