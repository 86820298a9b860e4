//! Session-scoped key material
//!
//! A [`Session`] is acquired by unlocking a [`UserKeypair`] and holds the
//! unlocked private key plus any conversation keys unwrapped so far. Nothing
//! here is global: the caller owns the session and ends it with
//! [`Session::lock`] (or by dropping it), which wipes every key it holds.

use std::collections::HashMap;

use crate::conversation::{ConversationError, ConversationKeySet};
use crate::crypto::{
    decrypt_message, encrypt_message, unlock_private_key, EncryptedData, MessageError, PublicKey,
    Secret, SecretKey, UnlockError, UserKeypair,
};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("unlock error: {0}")]
    Unlock(#[from] UnlockError),
    #[error("conversation error: {0}")]
    Conversation(#[from] ConversationError),
    #[error("message error: {0}")]
    Message(#[from] MessageError),
}

/// An unlocked identity and its cache of unwrapped conversation keys
#[derive(Debug)]
pub struct Session {
    participant: String,
    secret_key: SecretKey,
    conversation_keys: HashMap<String, Secret>,
}

impl Session {
    /// Unlock `keypair` with `passphrase` and start a session as `participant`
    pub fn unlock(
        participant: impl Into<String>,
        keypair: &UserKeypair,
        passphrase: &str,
    ) -> Result<Self, SessionError> {
        let secret_key = unlock_private_key(&keypair.encrypted_private_key, passphrase)?;
        Ok(Self::from_secret_key(participant, secret_key))
    }

    /// Start a session from an already unlocked key
    pub fn from_secret_key(participant: impl Into<String>, secret_key: SecretKey) -> Self {
        let participant = participant.into();
        tracing::debug!(participant = %participant, "session unlocked");
        Self {
            participant,
            secret_key,
            conversation_keys: HashMap::new(),
        }
    }

    pub fn participant(&self) -> &str {
        &self.participant
    }

    pub fn public_key(&self) -> PublicKey {
        self.secret_key.public()
    }

    pub fn secret_key(&self) -> &SecretKey {
        &self.secret_key
    }

    /// The conversation key for `conversation_id`, unwrapping our entry on first use
    pub fn conversation_key(
        &mut self,
        conversation_id: &str,
        key_set: &ConversationKeySet,
    ) -> Result<&Secret, SessionError> {
        if !self.conversation_keys.contains_key(conversation_id) {
            let key = key_set.unwrap_for(&self.participant, &self.secret_key)?;
            self.conversation_keys.insert(conversation_id.to_string(), key);
        }
        // just inserted above if it was missing
        self.conversation_keys
            .get(conversation_id)
            .ok_or_else(|| ConversationError::NotAParticipant(self.participant.clone()).into())
    }

    pub fn encrypt(
        &mut self,
        conversation_id: &str,
        key_set: &ConversationKeySet,
        plaintext: &str,
    ) -> Result<EncryptedData, SessionError> {
        let key = self.conversation_key(conversation_id, key_set)?;
        Ok(encrypt_message(plaintext, key)?)
    }

    pub fn decrypt(
        &mut self,
        conversation_id: &str,
        key_set: &ConversationKeySet,
        message: &EncryptedData,
    ) -> Result<String, SessionError> {
        let key = self.conversation_key(conversation_id, key_set)?;
        Ok(decrypt_message(&message.ciphertext, &message.nonce, key)?)
    }

    /// Drop a cached conversation key. Returns whether one was cached.
    pub fn forget(&mut self, conversation_id: &str) -> bool {
        self.conversation_keys.remove(conversation_id).is_some()
    }

    /// Ids of conversations whose keys are currently held
    pub fn cached_conversations(&self) -> impl Iterator<Item = &str> {
        self.conversation_keys.keys().map(String::as_str)
    }

    /// End the session, wiping the private key and every cached conversation key
    pub fn lock(self) {
        tracing::debug!(
            participant = %self.participant,
            cached = self.conversation_keys.len(),
            "session locked"
        );
    }
}
