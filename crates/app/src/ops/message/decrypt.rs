use std::path::PathBuf;

use clap::Args;

use common::conversation::ConversationKeySet;
use common::crypto::EncryptedData;
use common::session::SessionError;

use crate::op::ContextError;
use crate::state::{read_json, StateError};

#[derive(Args, Debug, Clone)]
pub struct Decrypt {
    /// Key set JSON file of the conversation
    #[arg(long)]
    pub keys: PathBuf,

    /// JSON file holding the encrypted message (ciphertext and nonce)
    #[arg(long)]
    pub input: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum DecryptError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

#[async_trait::async_trait]
impl crate::op::Op for Decrypt {
    type Error = DecryptError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let key_set: ConversationKeySet = read_json(&self.keys)?;
        let message: EncryptedData = read_json(&self.input)?;
        let (_keypair, mut session) = ctx.unlock().await?;

        let plaintext = session.decrypt(&super::conversation_id(&self.keys), &key_set, &message)?;
        session.lock();

        Ok(plaintext)
    }
}
