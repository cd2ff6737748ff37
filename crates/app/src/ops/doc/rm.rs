use clap::Args;
use common::auth::AuthError;
use common::document::StoreError;

use crate::op::{bearer_headers, ContextError};

/// Delete a document and every stored version of it
#[derive(Args, Debug, Clone)]
pub struct Rm {
    /// Document key, e.g. content/blog.json
    pub key: String,

    /// Session token from `folio login`
    #[arg(long)]
    pub token: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RmError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[async_trait::async_trait]
impl crate::op::Op for Rm {
    type Error = RmError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let site = ctx.site().await?;
        site.auth().require_auth(&bearer_headers(&self.token)).await?;

        let removed = site.documents().remove(&self.key).await?;
        Ok(format!("Removed {} object(s) under {}", removed, self.key))
    }
}
