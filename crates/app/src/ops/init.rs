use std::path::PathBuf;

use blob_store::{BlobStoreConfig, DEFAULT_API_URL};
use clap::Args;
use common::config::KvConfig;

use crate::state::AppState;

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Directory for document objects (default: <config dir>/objects)
    #[arg(long, conflicts_with = "hosted")]
    pub objects: Option<PathBuf>,

    /// Store documents in the hosted blob service; the token is read from
    /// BLOB_READ_WRITE_TOKEN at run time
    #[arg(long)]
    pub hosted: bool,

    /// Keep sessions in Redis instead of a local file
    #[arg(long)]
    pub redis_url: Option<String>,

    /// Session lifetime in seconds
    #[arg(long)]
    pub session_ttl_secs: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] crate::state::StateError),
    #[error("invalid blob api url: {0}")]
    InvalidUrl(String),
}

#[async_trait::async_trait]
impl crate::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let folio_dir = AppState::folio_dir(ctx.config_path.clone())?;
        let mut config = AppState::default_config(&folio_dir);

        if self.hosted {
            let api_url = url::Url::parse(DEFAULT_API_URL)
                .map_err(|e| InitError::InvalidUrl(e.to_string()))?;
            config.blob = BlobStoreConfig::Http {
                api_url,
                token: None,
            };
        } else if let Some(path) = &self.objects {
            config.blob = BlobStoreConfig::Local { path: path.clone() };
        }
        if let Some(url) = &self.redis_url {
            config.kv = KvConfig::Redis { url: url.clone() };
        }
        if let Some(ttl) = self.session_ttl_secs {
            config.session_ttl_secs = ttl;
        }

        let state = AppState::init(Some(folio_dir), Some(config))?;

        let documents = match &state.config.blob {
            BlobStoreConfig::Local { path } => path.display().to_string(),
            BlobStoreConfig::Http { api_url, .. } => api_url.to_string(),
            other => format!("{:?}", other),
        };
        let sessions = match &state.config.kv {
            KvConfig::Memory => "in memory".to_string(),
            KvConfig::File { path } => path.display().to_string(),
            KvConfig::Redis { .. } => "redis".to_string(),
        };

        Ok(format!(
            "Initialized folio directory at: {}\n\
             - Config: {}\n\
             - Documents: {}\n\
             - Sessions: {}\n\
             - Session lifetime: {}s",
            state.folio_dir.display(),
            state.config_path.display(),
            documents,
            sessions,
            state.config.session_ttl_secs,
        ))
    }
}
