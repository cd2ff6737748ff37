use clap::{Args, Subcommand};

pub mod get;
pub mod ls;
pub mod put;
pub mod rm;

use crate::op::Op;

crate::command_enum! {
    (Get, get::Get),
    (Put, put::Put),
    (Ls, ls::Ls),
    (Rm, rm::Rm),
}

pub type DocCommand = Command;

/// Read and write documents
#[derive(Args, Debug, Clone)]
pub struct Doc {
    #[command(subcommand)]
    pub command: DocCommand,
}

#[async_trait::async_trait]
impl Op for Doc {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}
