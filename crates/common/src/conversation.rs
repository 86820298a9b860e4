//! Per-conversation key sets
//!
//! A [`ConversationKeySet`] is the record the server stores for a
//! conversation: one wrapped copy of the conversation key per participant,
//! keyed by participant id. It is safe to hand to an untrusted store.
//!
//! ```text
//! {
//!   "alice": "<base64 RSA-OAEP(conversation_key) for alice>",
//!   "bob":   "<base64 RSA-OAEP(conversation_key) for bob>"
//! }
//! ```
//!
//! Entries are only ever added. Dropping a participant's entry does not
//! revoke what they already unwrapped; that would need a fresh conversation
//! key rewrapped for the remaining members.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::crypto::{
    decrypt_conversation_key, encrypt_conversation_key,
    encrypt_conversation_key_for_multiple_recipients, generate_conversation_key, Secret,
    SecretKey, UnwrapError, WrapError,
};

/// Errors from conversation key set operations
#[derive(Debug, thiserror::Error)]
pub enum ConversationError {
    #[error("participant {0} is not part of this conversation")]
    NotAParticipant(String),
    #[error("wrap error: {0}")]
    Wrap(#[from] WrapError),
    #[error("unwrap error: {0}")]
    Unwrap(#[from] UnwrapError),
}

/// Map of participant id to base64 public key
pub type Recipients = BTreeMap<String, String>;

/// Map of participant id to that participant's wrapped conversation key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationKeySet(BTreeMap<String, String>);

impl From<BTreeMap<String, String>> for ConversationKeySet {
    fn from(entries: BTreeMap<String, String>) -> Self {
        Self(entries)
    }
}

impl ConversationKeySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a participant's wrapped key
    pub fn get(&self, participant: &str) -> Option<&str> {
        self.0.get(participant).map(String::as_str)
    }

    pub fn contains(&self, participant: &str) -> bool {
        self.0.contains_key(participant)
    }

    /// Participant ids in sorted order
    pub fn participants(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Wrap the conversation key for a new participant and record it
    ///
    /// An existing entry for the same id is replaced (e.g. the participant
    /// enrolled a new keypair).
    pub fn add_participant(
        &mut self,
        conversation_key: &Secret,
        participant: impl Into<String>,
        public_key: &str,
    ) -> Result<(), WrapError> {
        let participant = participant.into();
        let wrapped = encrypt_conversation_key(conversation_key, public_key)?;
        tracing::debug!(participant = %participant, "added participant to conversation");
        self.0.insert(participant, wrapped);
        Ok(())
    }

    /// Unwrap `participant`'s entry with their unlocked private key
    pub fn unwrap_for(
        &self,
        participant: &str,
        secret_key: &SecretKey,
    ) -> Result<Secret, ConversationError> {
        let wrapped = self
            .get(participant)
            .ok_or_else(|| ConversationError::NotAParticipant(participant.to_string()))?;
        Ok(decrypt_conversation_key(wrapped, secret_key)?)
    }
}

/// A freshly started conversation
#[derive(Debug)]
pub struct ConversationStart {
    /// The unwrapped conversation key; keep in memory only
    pub key: Secret,
    /// Wrapped entries for every recipient that succeeded
    pub key_set: ConversationKeySet,
    /// Recipients that could not be wrapped for
    pub failed: BTreeMap<String, WrapError>,
}

/// Generate a conversation key and wrap it for every recipient
///
/// Failures for individual recipients are reported in
/// [`ConversationStart::failed`] without affecting the others.
pub fn start_conversation(recipients: &Recipients) -> ConversationStart {
    let key = generate_conversation_key();
    let outcome = encrypt_conversation_key_for_multiple_recipients(&key, recipients);
    ConversationStart {
        key,
        key_set: outcome.wrapped.into(),
        failed: outcome.failed,
    }
}
