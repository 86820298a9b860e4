use clap::{Args, Subcommand};

pub mod decrypt;
pub mod encrypt;

use crate::op::Op;

crate::command_enum! {
    (Encrypt, encrypt::Encrypt),
    (Decrypt, decrypt::Decrypt),
}

pub type MessageCommand = Command;

#[derive(Args, Debug, Clone)]
pub struct Message {
    #[command(subcommand)]
    pub command: MessageCommand,
}

#[async_trait::async_trait]
impl Op for Message {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}

/// Conversation id a key set file is cached under within a session
fn conversation_id(keys: &std::path::Path) -> String {
    keys.display().to_string()
}
