use clap::Args;
use common::document::StoreError;
use serde_json::Value;

use crate::op::ContextError;

/// Print the current version of a document
#[derive(Args, Debug, Clone)]
pub struct Get {
    /// Document key, e.g. content/blog.json
    pub key: String,

    /// JSON to print when the document was never written
    #[arg(long, default_value = "null")]
    pub default: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GetError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error("invalid --default: {0}")]
    InvalidDefault(serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to format document: {0}")]
    Format(serde_json::Error),
}

#[async_trait::async_trait]
impl crate::op::Op for Get {
    type Error = GetError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let default: Value = serde_json::from_str(&self.default).map_err(GetError::InvalidDefault)?;

        let site = ctx.site().await?;
        let document: Value = site.documents().read(&self.key, default).await?;

        serde_json::to_string_pretty(&document).map_err(GetError::Format)
    }
}
