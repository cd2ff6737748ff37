use clap::Args;
use common::auth::AuthError;

use crate::op::ContextError;

/// Change the admin password
#[derive(Args, Debug, Clone)]
pub struct Passwd {
    #[arg(long)]
    pub current: String,

    #[arg(long)]
    pub new: String,
}

#[derive(Debug, thiserror::Error)]
pub enum PasswdError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

#[async_trait::async_trait]
impl crate::op::Op for Passwd {
    type Error = PasswdError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let site = ctx.site().await?;
        site.auth().change_password(&self.current, &self.new).await?;
        Ok("Password changed".to_string())
    }
}
