use std::io::Read;
use std::path::PathBuf;

use clap::Args;
use common::auth::AuthError;
use common::document::StoreError;
use serde_json::Value;

use crate::op::{bearer_headers, ContextError};

/// Replace a document with the JSON in a file (or `-` for stdin)
#[derive(Args, Debug, Clone)]
pub struct Put {
    /// Document key, e.g. content/blog.json
    pub key: String,

    /// File holding the new document, `-` for stdin
    pub file: PathBuf,

    /// Session token from `folio login`
    #[arg(long)]
    pub token: String,
}

#[derive(Debug, thiserror::Error)]
pub enum PutError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to read {0}: {1}")]
    Read(String, std::io::Error),
    #[error("input is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl Put {
    async fn read_input(&self) -> Result<String, PutError> {
        if self.file.as_os_str() == "-" {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .map_err(|e| PutError::Read("stdin".to_string(), e))?;
            return Ok(input);
        }
        tokio::fs::read_to_string(&self.file)
            .await
            .map_err(|e| PutError::Read(self.file.display().to_string(), e))
    }
}

#[async_trait::async_trait]
impl crate::op::Op for Put {
    type Error = PutError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let document: Value = serde_json::from_str(&self.read_input().await?)?;

        let site = ctx.site().await?;
        site.auth().require_auth(&bearer_headers(&self.token)).await?;

        let outcome = site.documents().write(&self.key, &document).await?;

        let mut output = format!(
            "Wrote {} ({})\n- Reaped {} older version(s)",
            self.key, outcome.object.url, outcome.reaped
        );
        if outcome.reap_failures > 0 {
            output.push_str(&format!(
                "\n- {} older version(s) could not be removed; the next write retries",
                outcome.reap_failures
            ));
        }
        Ok(output)
    }
}
