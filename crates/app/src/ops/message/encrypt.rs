use std::path::PathBuf;

use clap::Args;

use common::conversation::ConversationKeySet;
use common::session::SessionError;

use crate::op::ContextError;
use crate::state::{read_json, StateError};

#[derive(Args, Debug, Clone)]
pub struct Encrypt {
    /// Key set JSON file of the conversation
    #[arg(long)]
    pub keys: PathBuf,

    /// Message text to encrypt
    #[arg(long)]
    pub text: String,
}

#[derive(Debug, thiserror::Error)]
pub enum EncryptError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[async_trait::async_trait]
impl crate::op::Op for Encrypt {
    type Error = EncryptError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let key_set: ConversationKeySet = read_json(&self.keys)?;
        let (_keypair, mut session) = ctx.unlock().await?;

        let encrypted = session.encrypt(&super::conversation_id(&self.keys), &key_set, &self.text)?;
        session.lock();

        Ok(serde_json::to_string_pretty(&encrypted)?)
    }
}
