//! Message bodies encrypted under a conversation key

use serde::{Deserialize, Serialize};

use super::encoding;
use super::secret::{Secret, SecretError, NONCE_SIZE};

/// Errors from the message cipher
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("failed to encrypt message: {0}")]
    Encrypt(#[from] SecretError),
    /// Tampered ciphertext, mismatched nonce or wrong conversation key
    #[error("message failed integrity check")]
    Integrity,
}

/// One authenticated encryption output
///
/// `ciphertext` (with its tag) and `nonce` are separate base64 strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedData {
    pub ciphertext: String,
    pub nonce: String,
}

/// Encrypt a text message under a conversation key
///
/// The nonce is always drawn fresh inside this call.
pub fn encrypt_message(
    plaintext: &str,
    conversation_key: &Secret,
) -> Result<EncryptedData, MessageError> {
    let (nonce, ciphertext) = conversation_key.encrypt(plaintext.as_bytes())?;
    Ok(EncryptedData {
        ciphertext: encoding::encode(ciphertext),
        nonce: encoding::encode(nonce),
    })
}

/// Decrypt and authenticate a message, returning its text
pub fn decrypt_message(
    ciphertext: &str,
    nonce: &str,
    conversation_key: &Secret,
) -> Result<String, MessageError> {
    let nonce: [u8; NONCE_SIZE] =
        encoding::decode_array(nonce).map_err(|_| MessageError::Integrity)?;
    let ciphertext = encoding::decode(ciphertext).map_err(|_| MessageError::Integrity)?;

    let plaintext = conversation_key
        .decrypt(&nonce, &ciphertext)
        .map_err(|_| MessageError::Integrity)?;

    String::from_utf8(plaintext.to_vec()).map_err(|_| MessageError::Integrity)
}

impl EncryptedData {
    /// Shorthand for [`decrypt_message`] on this record's fields
    pub fn decrypt(&self, conversation_key: &Secret) -> Result<String, MessageError> {
        decrypt_message(&self.ciphertext, &self.nonce, conversation_key)
    }
}
