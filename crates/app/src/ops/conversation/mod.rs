use clap::{Args, Subcommand};

pub mod add;
pub mod start;

use crate::op::Op;

crate::command_enum! {
    (Start, start::Start),
    (Add, add::Add),
}

pub type ConversationCommand = Command;

#[derive(Args, Debug, Clone)]
pub struct Conversation {
    #[command(subcommand)]
    pub command: ConversationCommand,
}

#[async_trait::async_trait]
impl Op for Conversation {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}
