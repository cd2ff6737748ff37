use clap::Args;
use common::document::StoreError;

use crate::op::ContextError;

/// List every stored version of a document, newest first
#[derive(Args, Debug, Clone)]
pub struct Ls {
    /// Document key, e.g. content/blog.json
    pub key: String,
}

#[derive(Debug, thiserror::Error)]
pub enum LsError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[async_trait::async_trait]
impl crate::op::Op for Ls {
    type Error = LsError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let site = ctx.site().await?;
        let versions = site.documents().versions(&self.key).await?;

        if versions.is_empty() {
            return Ok(format!("No versions stored for {}", self.key));
        }

        Ok(versions
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let marker = if i == 0 { "*" } else { " " };
                format!("{} {}  {}", marker, v.uploaded_at.to_rfc3339(), v.url)
            })
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
