use clap::Args;
use common::auth::AuthError;

use crate::op::ContextError;

/// Exchange the admin password for a session token
#[derive(Args, Debug, Clone)]
pub struct Login {
    #[arg(long)]
    pub password: String,
}

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

#[async_trait::async_trait]
impl crate::op::Op for Login {
    type Error = LoginError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let site = ctx.site().await?;
        let session = site.auth().login(&self.password).await?;

        Ok(format!(
            "{}\n- Expires: {}",
            session.token,
            session.expires_at.to_rfc3339()
        ))
    }
}
