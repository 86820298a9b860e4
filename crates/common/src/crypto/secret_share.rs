//! Conversation key distribution by RSA-OAEP key wrapping
//!
//! A conversation key is a [`Secret`]. To give a participant access, the raw
//! key bytes are encrypted under that participant's RSA public key (OAEP with
//! SHA-256). The result, a [`SecretShare`], is opaque to everyone except the
//! holder of the matching private key.
//!
//! # Protocol Overview
//!
//! To share a conversation key with a participant:
//! 1. **Import**: parse the recipient's public key from text
//! 2. **Wrap**: RSA-OAEP encrypt the 32 raw key bytes (OAEP is randomized, no nonce needed)
//! 3. **Encode**: base64 the wrapped bytes for storage
//!
//! The recipient recovers the key by decoding, RSA-OAEP decrypting with their
//! unlocked private key and importing the 32 bytes as a [`Secret`].
//!
//! # Security Properties
//!
//! - **Isolation**: each share is decryptable by exactly one private key
//! - **Integrity**: OAEP decoding rejects shares made for another key or altered in transit
//! - **No rotation**: removing a participant does not invalidate their share

use std::collections::BTreeMap;

use super::encoding;
use super::keys::{KeyError, PublicKey, SecretKey};
use super::secret::{Secret, SECRET_SIZE};

/// Wrapping a conversation key for a recipient failed
#[derive(Debug, thiserror::Error)]
pub enum WrapError {
    #[error("invalid recipient public key: {0}")]
    InvalidPublicKey(KeyError),
    #[error("failed to wrap conversation key: {0}")]
    Encrypt(KeyError),
}

/// A wrapped conversation key could not be recovered
///
/// Produced for a different key, corrupted, or not a share at all; these are
/// indistinguishable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unable to unwrap conversation key")]
pub struct UnwrapError;

/// A conversation key wrapped for one specific recipient
///
/// # Examples
///
/// ```ignore
/// // Alice wants to share a conversation key with Bob
/// let conversation_key = Secret::generate();
///
/// // Alice creates a share for Bob
/// let share = SecretShare::new(&conversation_key, &bob_public_key)?;
///
/// // Bob can recover the key using his unlocked private key
/// let recovered = share.recover(&bob_secret_key)?;
/// assert_eq!(conversation_key, recovered);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SecretShare(Vec<u8>);

impl SecretShare {
    /// Wrap `secret` so only the holder of `recipient`'s private key can read it
    pub fn new(secret: &Secret, recipient: &PublicKey) -> Result<Self, WrapError> {
        let wrapped = recipient.encrypt(secret.bytes()).map_err(WrapError::Encrypt)?;
        Ok(Self(wrapped))
    }

    /// Recover the wrapped secret using the recipient's private key
    ///
    /// # Security Note
    ///
    /// If this fails the share was created for a different recipient, the
    /// data was corrupted, or someone tampered with it.
    pub fn recover(&self, recipient_secret: &SecretKey) -> Result<Secret, UnwrapError> {
        let unwrapped = recipient_secret.decrypt(&self.0).map_err(|_| UnwrapError)?;
        if unwrapped.len() != SECRET_SIZE {
            return Err(UnwrapError);
        }
        Secret::from_slice(&unwrapped).map_err(|_| UnwrapError)
    }

    /// Parse a share from base64 text
    pub fn from_base64(text: &str) -> Result<Self, encoding::EncodingError> {
        Ok(Self(encoding::decode(text)?))
    }

    /// Convert share to base64 text
    pub fn to_base64(&self) -> String {
        encoding::encode(&self.0)
    }

    /// Get a reference to the raw share bytes
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Result of wrapping one conversation key for many recipients
///
/// Successful wraps are kept even when other recipients fail; the caller
/// decides whether a partial set is acceptable.
#[derive(Debug, Default)]
pub struct WrapOutcome {
    /// Recipient id to base64 wrapped key
    pub wrapped: BTreeMap<String, String>,
    /// Recipient id to the reason wrapping failed
    pub failed: BTreeMap<String, WrapError>,
}

impl WrapOutcome {
    /// True when every recipient received a wrapped key
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Generate a fresh random 256-bit conversation key
///
/// Keys are never derived from or related to earlier conversations.
pub fn generate_conversation_key() -> Secret {
    Secret::generate()
}

/// Wrap a conversation key for a recipient given their base64 public key
pub fn encrypt_conversation_key(
    conversation_key: &Secret,
    recipient_public_key: &str,
) -> Result<String, WrapError> {
    let recipient =
        PublicKey::from_base64(recipient_public_key).map_err(WrapError::InvalidPublicKey)?;
    Ok(SecretShare::new(conversation_key, &recipient)?.to_base64())
}

/// Unwrap a base64 wrapped conversation key with the caller's own private key
pub fn decrypt_conversation_key(
    wrapped: &str,
    own_secret_key: &SecretKey,
) -> Result<Secret, UnwrapError> {
    let share = SecretShare::from_base64(wrapped).map_err(|_| UnwrapError)?;
    share.recover(own_secret_key)
}

/// Wrap one conversation key independently for each recipient
///
/// `recipients` maps participant id to base64 public key. One RSA operation
/// per recipient; a bad key for one recipient only affects that entry.
pub fn encrypt_conversation_key_for_multiple_recipients(
    conversation_key: &Secret,
    recipients: &BTreeMap<String, String>,
) -> WrapOutcome {
    let mut outcome = WrapOutcome::default();
    for (participant, public_key) in recipients {
        match encrypt_conversation_key(conversation_key, public_key) {
            Ok(wrapped) => {
                outcome.wrapped.insert(participant.clone(), wrapped);
            }
            Err(e) => {
                tracing::warn!(
                    participant = %participant,
                    error = %e,
                    "failed to wrap conversation key for recipient"
                );
                outcome.failed.insert(participant.clone(), e);
            }
        }
    }
    tracing::debug!(
        wrapped = outcome.wrapped.len(),
        failed = outcome.failed.len(),
        "wrapped conversation key for recipients"
    );
    outcome
}

/// Export an unwrapped conversation key as base64 of its raw bytes
///
/// For moving a key between in-memory representations inside one trusted
/// session. Never send the output across a trust boundary; use
/// [`encrypt_conversation_key`] for that.
pub fn export_conversation_key(conversation_key: &Secret) -> String {
    conversation_key.export()
}

/// Inverse of [`export_conversation_key`]
pub fn import_conversation_key(text: &str) -> Result<Secret, super::SecretError> {
    Secret::import(text)
}
