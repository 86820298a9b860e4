use clap::Args;

use common::crypto::KeyError;

use crate::op::ContextError;

#[derive(Args, Debug, Clone)]
pub struct Verify;

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error("could not encode derived public key: {0}")]
    PublicKey(#[from] KeyError),
    #[error("private key does not match the stored public key")]
    Mismatch,
}

#[async_trait::async_trait]
impl crate::op::Op for Verify {
    type Error = VerifyError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let (keypair, session) = ctx.unlock().await?;

        let derived = session.public_key().to_base64()?;
        let participant = session.participant().to_string();
        session.lock();

        if derived != keypair.public_key {
            return Err(VerifyError::Mismatch);
        }

        Ok(format!("Passphrase OK: unlocked identity for {}", participant))
    }
}
