use std::convert::Infallible;
use std::path::PathBuf;

use clap::Args;

use common::blocking::{self, BlockingError};
use common::conversation::{ConversationKeySet, Recipients};
use common::crypto::generate_conversation_key;

use crate::op::ContextError;
use crate::state::{read_json, write_json, StateError};

#[derive(Args, Debug, Clone)]
pub struct Start {
    /// JSON file mapping participant ids to base64 public keys
    #[arg(long)]
    pub recipients: PathBuf,

    /// Write the key set here instead of printing it
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Fail without writing anything if any recipient cannot be wrapped for
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum StartError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error("key wrapping failed: {0}")]
    Wrap(#[from] BlockingError<Infallible>),
    #[error("could not wrap for: {}", .0.join(", "))]
    Incomplete(Vec<String>),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[async_trait::async_trait]
impl crate::op::Op for Start {
    type Error = StartError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.load_state()?;
        let keypair = state.load_keypair()?;

        let mut recipients: Recipients = read_json(&self.recipients)?;
        // the creator always gets an entry
        recipients.insert(state.config.participant_id.clone(), keypair.public_key);

        let key = generate_conversation_key();
        let outcome = blocking::wrap_for_recipients(key, recipients).await?;

        if self.strict && !outcome.is_complete() {
            return Err(StartError::Incomplete(
                outcome.failed.into_keys().collect(),
            ));
        }

        let key_set = ConversationKeySet::from(outcome.wrapped);
        let mut report: Vec<String> = outcome
            .failed
            .iter()
            .map(|(id, e)| format!("- skipped {}: {}", id, e))
            .collect();

        match &self.out {
            Some(path) => {
                write_json(path, &key_set)?;
                report.insert(
                    0,
                    format!(
                        "Wrote key set for {} participants to {}",
                        key_set.len(),
                        path.display()
                    ),
                );
                Ok(report.join("\n"))
            }
            None => {
                for line in &report {
                    tracing::warn!("{}", line);
                }
                Ok(serde_json::to_string_pretty(&key_set)?)
            }
        }
    }
}
