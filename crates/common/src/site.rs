use std::sync::Arc;

use blob_store::BlobError;
use chrono::Utc;
use serde_json::json;

use crate::auth::AuthGate;
use crate::config::{KvConfig, StoreConfig};
use crate::document::DocumentStore;
use crate::session::{FileKv, KvBackend, KvError, MemoryKv, RedisKv, SessionStore};

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("blob backend setup failed: {0}")]
    Blob(#[from] BlobError),
    #[error("session backend setup failed: {0}")]
    Kv(#[from] KvError),
}

/// The document store, session store and auth gate for one site, built
/// from a single [`StoreConfig`].
#[derive(Debug, Clone)]
pub struct Site {
    documents: DocumentStore,
    sessions: SessionStore,
    auth: AuthGate,
    config: StoreConfig,
}

impl Site {
    pub async fn from_config(config: &StoreConfig) -> Result<Self, SetupError> {
        let backend = blob_store::connect(&config.blob).await?;
        let documents = DocumentStore::new(backend);

        let kv: Arc<dyn KvBackend> = match &config.kv {
            KvConfig::Memory => Arc::new(MemoryKv::new()),
            KvConfig::File { path } => {
                tracing::debug!(path = %path.display(), "session store using file backend");
                Arc::new(FileKv::new(path))
            }
            KvConfig::Redis { url } => Arc::new(RedisKv::connect(url).await?),
        };
        let sessions = SessionStore::new(kv, config.session_ttl());

        let auth = AuthGate::new(documents.clone(), sessions.clone(), &config.documents.admin)
            .with_min_password_length(config.min_password_length);

        Ok(Self {
            documents,
            sessions,
            auth,
            config: config.clone(),
        })
    }

    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn auth(&self) -> &AuthGate {
        &self.auth
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Record a page visit in the visitor log. Never fails.
    pub async fn record_visit(&self, path: &str, user_agent: Option<&str>) {
        let entry = json!({
            "path": path,
            "userAgent": user_agent,
            "timestamp": Utc::now(),
        });
        self.documents
            .append_best_effort(
                &self.config.documents.visitors,
                entry,
                self.config.max_visitor_entries,
            )
            .await;
    }
}
