use clap::Args;

use common::blocking::{self, BlockingError};
use common::crypto::IdentityError;

use crate::op::ContextError;
use crate::state::{AppConfig, AppState, StateError};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Id this identity is known by in conversations
    #[arg(long)]
    pub participant_id: String,

    /// RSA modulus size for the identity key (default: 4096)
    #[arg(long)]
    pub key_bits: Option<usize>,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error("init failed: {0}")]
    StateFailed(#[from] StateError),
    #[error("keypair generation failed: {0}")]
    Keypair(#[from] BlockingError<IdentityError>),
}

#[async_trait::async_trait]
impl crate::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let passphrase = ctx.passphrase()?.to_string();

        // generation is slow; refuse before doing it
        if AppState::load(ctx.config_path.clone()).is_ok() {
            return Err(StateError::AlreadyInitialized.into());
        }

        let mut config = AppConfig::new(self.participant_id.clone());
        if let Some(bits) = self.key_bits {
            config.key_bits = bits;
        }

        tracing::info!(bits = config.key_bits, "generating identity keypair");
        let keypair = blocking::generate_user_keypair(passphrase, config.key_bits).await?;

        let state = AppState::init(ctx.config_path.clone(), config, &keypair)?;

        let output = format!(
            "Initialized hearth directory at: {}\n\
             - Participant: {}\n\
             - Key bits: {}\n\
             - Keypair: {}\n\
             - Config: {}",
            state.hearth_dir.display(),
            state.config.participant_id,
            state.config.key_bits,
            state.keypair_path.display(),
            state.config_path.display(),
        );

        Ok(output)
    }
}
