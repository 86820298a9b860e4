use clap::Args;

use common::crypto::{KeyError, PublicKey};

use crate::op::ContextError;
use crate::state::StateError;

#[derive(Args, Debug, Clone)]
pub struct Show {
    /// Print the public key as PEM instead of base64 DER
    #[arg(long)]
    pub pem: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ShowError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error("stored public key is invalid: {0}")]
    PublicKey(#[from] KeyError),
}

#[async_trait::async_trait]
impl crate::op::Op for Show {
    type Error = ShowError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.load_state()?;
        let keypair = state.load_keypair()?;
        let public_key = PublicKey::from_base64(&keypair.public_key)?;

        let encoded = if self.pem {
            public_key.to_pem()?
        } else {
            keypair.public_key
        };

        Ok(format!(
            "Participant: {}\nKey bits: {}\nPublic key:\n{}",
            state.config.participant_id,
            public_key.bits(),
            encoded.trim_end()
        ))
    }
}
