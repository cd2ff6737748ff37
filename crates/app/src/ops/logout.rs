use clap::Args;
use common::auth::AuthError;

use crate::op::{bearer_headers, ContextError};

/// End a session
#[derive(Args, Debug, Clone)]
pub struct Logout {
    #[arg(long)]
    pub token: String,
}

#[derive(Debug, thiserror::Error)]
pub enum LogoutError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

#[async_trait::async_trait]
impl crate::op::Op for Logout {
    type Error = LogoutError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let site = ctx.site().await?;
        site.auth().logout(&bearer_headers(&self.token)).await?;
        Ok("Logged out".to_string())
    }
}
