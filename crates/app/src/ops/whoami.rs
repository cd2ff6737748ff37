use clap::Args;
use common::auth::AuthError;

use crate::op::{bearer_headers, ContextError};

/// Show the session behind a token
#[derive(Args, Debug, Clone)]
pub struct Whoami {
    #[arg(long)]
    pub token: String,
}

#[derive(Debug, thiserror::Error)]
pub enum WhoamiError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

#[async_trait::async_trait]
impl crate::op::Op for Whoami {
    type Error = WhoamiError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let site = ctx.site().await?;
        let session = site.auth().require_auth(&bearer_headers(&self.token)).await?;

        Ok(format!(
            "admin\n- Logged in: {}\n- Expires: {}",
            session.created_at.to_rfc3339(),
            session.expires_at.to_rfc3339()
        ))
    }
}
