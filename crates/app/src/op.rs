use std::error::Error;
use std::path::PathBuf;

use common::blocking::{self, BlockingError};
use common::crypto::{UnlockError, UserKeypair};
use common::session::Session;

use crate::state::{AppState, StateError};

#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("no passphrase given: pass --passphrase or set HEARTH_PASSPHRASE")]
    MissingPassphrase,
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Unlock(#[from] BlockingError<UnlockError>),
}

#[derive(Clone)]
pub struct OpContext {
    /// Optional custom config path (defaults to ~/.hearth)
    pub config_path: Option<PathBuf>,
    /// Passphrase from the command line or environment
    passphrase: Option<String>,
}

impl std::fmt::Debug for OpContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpContext")
            .field("config_path", &self.config_path)
            .field("passphrase", &self.passphrase.as_ref().map(|_| ".."))
            .finish()
    }
}

impl OpContext {
    pub fn new(config_path: Option<PathBuf>, passphrase: Option<String>) -> Self {
        Self {
            config_path,
            passphrase,
        }
    }

    pub fn passphrase(&self) -> Result<&str, ContextError> {
        match self.passphrase.as_deref() {
            Some(p) if !p.is_empty() => Ok(p),
            _ => Err(ContextError::MissingPassphrase),
        }
    }

    pub fn load_state(&self) -> Result<AppState, ContextError> {
        Ok(AppState::load(self.config_path.clone())?)
    }

    /// Load the stored identity and unlock it into a session
    pub async fn unlock(&self) -> Result<(UserKeypair, Session), ContextError> {
        let passphrase = self.passphrase()?.to_string();
        let state = self.load_state()?;
        let keypair = state.load_keypair()?;

        let secret_key =
            blocking::unlock_private_key(keypair.encrypted_private_key.clone(), passphrase).await?;
        let session = Session::from_secret_key(state.config.participant_id.clone(), secret_key);

        Ok((keypair, session))
    }
}

#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: Error + Send + Sync + 'static;
    type Output;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

#[macro_export]
macro_rules! command_enum {
    ($(($variant:ident, $type:ty)),* $(,)?) => {
        #[derive(Subcommand, Debug, Clone)]
        pub enum Command {
            $($variant($type),)*
        }

        #[derive(Debug)]
        pub enum OpOutput {
            $($variant(<$type as $crate::op::Op>::Output),)*
        }

        #[derive(Debug, thiserror::Error)]
        pub enum OpError {
            $(
                #[error(transparent)]
                $variant(<$type as $crate::op::Op>::Error),
            )*
        }

        #[async_trait::async_trait]
        impl $crate::op::Op for Command {
            type Output = OpOutput;
            type Error = OpError;

            async fn execute(&self, ctx: &$crate::op::OpContext) -> Result<Self::Output, Self::Error> {
                match self {
                    $(
                        Command::$variant(op) => {
                            op.execute(ctx).await
                                .map(OpOutput::$variant)
                                .map_err(OpError::$variant)
                        },
                    )*
                }
            }
        }

        impl std::fmt::Display for OpOutput {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        OpOutput::$variant(output) => write!(f, "{}", output),
                    )*
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passphrase_required() {
        let ctx = OpContext::new(None, None);
        assert!(matches!(ctx.passphrase(), Err(ContextError::MissingPassphrase)));

        let ctx = OpContext::new(None, Some(String::new()));
        assert!(matches!(ctx.passphrase(), Err(ContextError::MissingPassphrase)));

        let ctx = OpContext::new(None, Some("pw".to_string()));
        assert_eq!(ctx.passphrase().unwrap(), "pw");
    }

    #[test]
    fn test_debug_hides_passphrase() {
        let ctx = OpContext::new(None, Some("hunter2".to_string()));
        assert!(!format!("{:?}", ctx).contains("hunter2"));
    }

    #[tokio::test]
    async fn test_unlock_uninitialized() {
        let temp = tempfile::TempDir::new().unwrap();
        let ctx = OpContext::new(
            Some(temp.path().join("missing")),
            Some("pw".to_string()),
        );
        assert!(matches!(
            ctx.unlock().await,
            Err(ContextError::State(StateError::NotInitialized))
        ));
    }
}
