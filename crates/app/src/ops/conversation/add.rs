use std::path::PathBuf;

use clap::Args;

use common::blocking::{self, BlockingError};
use common::conversation::{ConversationError, ConversationKeySet};
use common::crypto::{UnwrapError, WrapError};

use crate::op::ContextError;
use crate::state::{read_json, write_json, StateError};

#[derive(Args, Debug, Clone)]
pub struct Add {
    /// Key set JSON file of the conversation
    #[arg(long)]
    pub keys: PathBuf,

    /// Id of the participant to add
    #[arg(long)]
    pub participant: String,

    /// Base64 public key of the participant to add
    #[arg(long)]
    pub public_key: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AddError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Conversation(#[from] ConversationError),
    #[error(transparent)]
    Unwrap(#[from] BlockingError<UnwrapError>),
    #[error("could not wrap for {0}: {1}")]
    Wrap(String, WrapError),
}

#[async_trait::async_trait]
impl crate::op::Op for Add {
    type Error = AddError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut key_set: ConversationKeySet = read_json(&self.keys)?;
        let (_keypair, session) = ctx.unlock().await?;

        let own_entry = key_set
            .get(session.participant())
            .ok_or_else(|| ConversationError::NotAParticipant(session.participant().to_string()))?
            .to_string();
        let key =
            blocking::unwrap_conversation_key(own_entry, session.secret_key().clone()).await?;
        session.lock();

        key_set
            .add_participant(&key, self.participant.clone(), &self.public_key)
            .map_err(|e| AddError::Wrap(self.participant.clone(), e))?;
        write_json(&self.keys, &key_set)?;

        Ok(format!(
            "Added {} to {} ({} participants)",
            self.participant,
            self.keys.display(),
            key_set.len()
        ))
    }
}
