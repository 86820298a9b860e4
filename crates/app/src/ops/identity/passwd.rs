use clap::Args;

use common::blocking::{self, BlockingError};
use common::crypto::IdentityError;

use crate::op::ContextError;
use crate::state::StateError;

#[derive(Args, Debug, Clone)]
pub struct Passwd {
    /// Passphrase to seal the private key under from now on
    #[arg(long, env = "HEARTH_NEW_PASSPHRASE", hide_env_values = true)]
    pub new_passphrase: String,
}

#[derive(Debug, thiserror::Error)]
pub enum PasswdError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error("new passphrase must not be empty")]
    EmptyPassphrase,
    #[error("passphrase change failed: {0}")]
    Reseal(#[from] BlockingError<IdentityError>),
}

#[async_trait::async_trait]
impl crate::op::Op for Passwd {
    type Error = PasswdError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        if self.new_passphrase.is_empty() {
            return Err(PasswdError::EmptyPassphrase);
        }

        let old_passphrase = ctx.passphrase()?.to_string();
        let state = ctx.load_state()?;
        let keypair = state.load_keypair()?;

        let updated =
            blocking::change_passphrase(keypair, old_passphrase, self.new_passphrase.clone())
                .await?;
        state.save_keypair(&updated)?;

        Ok(format!(
            "Private key re-encrypted under the new passphrase: {}",
            state.keypair_path.display()
        ))
    }
}
