//! Symmetric authenticated encryption using AES-256-GCM
//!
//! A [`Secret`] is a 256-bit symmetric key. It plays two roles in the system:
//! - **Conversation key**: shared by every participant of one conversation and
//!   used to encrypt its messages
//! - **Wrapping key**: derived from a passphrase to protect a private key at rest
//!
//! The cipher owns nonce generation. Callers never supply a nonce to
//! [`Secret::encrypt`]; a fresh random 96-bit nonce is drawn on every call and
//! handed back alongside the ciphertext.

use std::fmt;

use aes_gcm::aead::consts::U12;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::encoding::{self, EncodingError};

/// Size of AES-GCM nonce in bytes
pub const NONCE_SIZE: usize = 12;
/// Size of AES-256-GCM key in bytes (256 bits)
pub const SECRET_SIZE: usize = 32;
/// Size of the AES-GCM authentication tag appended to every ciphertext
pub const TAG_SIZE: usize = 16;

/// Errors that can occur during encryption/decryption
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("secret error: {0}")]
    Default(#[from] anyhow::Error),
    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),
    /// Tag verification failed. Tampered data, a mismatched nonce and the
    /// wrong key all land here and cannot be told apart.
    #[error("decryption failed")]
    Decrypt,
}

/// A 256-bit symmetric key for AES-256-GCM
///
/// Key bytes are wiped when the value is dropped. `Debug` never prints them.
///
/// # Examples
///
/// ```ignore
/// let secret = Secret::generate();
///
/// let (nonce, ciphertext) = secret.encrypt(b"sensitive data")?;
/// let recovered = secret.decrypt(&nonce, &ciphertext)?;
/// assert_eq!(b"sensitive data", &recovered[..]);
/// ```
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Secret([u8; SECRET_SIZE]);

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(..)")
    }
}

impl From<[u8; SECRET_SIZE]> for Secret {
    fn from(bytes: [u8; SECRET_SIZE]) -> Self {
        Secret(bytes)
    }
}

impl Secret {
    /// Generate a new random secret using the operating system RNG
    pub fn generate() -> Self {
        let mut buff = [0u8; SECRET_SIZE];
        OsRng.fill_bytes(&mut buff);
        Self(buff)
    }

    /// Create a secret from a byte slice
    ///
    /// # Errors
    ///
    /// Returns an error if the slice length is not exactly `SECRET_SIZE` bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self, SecretError> {
        if data.len() != SECRET_SIZE {
            return Err(EncodingError::Length {
                expected: SECRET_SIZE,
                got: data.len(),
            }
            .into());
        }
        let mut buff = [0u8; SECRET_SIZE];
        buff.copy_from_slice(data);
        Ok(buff.into())
    }

    /// Get a reference to the raw key bytes
    pub fn bytes(&self) -> &[u8] {
        self.0.as_ref()
    }

    /// Export the raw key bytes as base64 text
    ///
    /// This is not wrapping. The output is the key itself and must only move
    /// between representations inside the same trusted session (e.g. a cache).
    pub fn export(&self) -> String {
        encoding::encode(self.0)
    }

    /// Import a key previously produced by [`Secret::export`]
    pub fn import(text: &str) -> Result<Self, SecretError> {
        let bytes = Zeroizing::new(encoding::decode(text)?);
        Self::from_slice(&bytes)
    }

    /// Encrypt data with AES-256-GCM under a freshly generated random nonce
    ///
    /// Returns `(nonce, ciphertext || tag)`.
    ///
    /// # Errors
    ///
    /// Returns an error if encryption fails (only on absurdly large inputs).
    pub fn encrypt(&self, data: &[u8]) -> Result<([u8; NONCE_SIZE], Vec<u8>), SecretError> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);

        let ciphertext = self
            .cipher()
            .encrypt(Nonce::<U12>::from_slice(&nonce_bytes), data)
            .map_err(|_| anyhow::anyhow!("encrypt error"))?;

        Ok((nonce_bytes, ciphertext))
    }

    /// Decrypt and authenticate `ciphertext || tag` under the given nonce
    ///
    /// The plaintext buffer is wiped when the returned value is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::Decrypt`] if tag verification fails.
    pub fn decrypt(
        &self,
        nonce: &[u8; NONCE_SIZE],
        ciphertext: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, SecretError> {
        if ciphertext.len() < TAG_SIZE {
            return Err(SecretError::Decrypt);
        }
        self.cipher()
            .decrypt(Nonce::<U12>::from_slice(nonce), ciphertext)
            .map(Zeroizing::new)
            .map_err(|_| SecretError::Decrypt)
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.0))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_secret_encrypt_decrypt() {
        let secret = Secret::generate();
        let data = b"hello world, this is a test message for encryption";

        let (nonce, encrypted) = secret.encrypt(data).unwrap();
        assert_eq!(encrypted.len(), data.len() + TAG_SIZE);

        let decrypted = secret.decrypt(&nonce, &encrypted).unwrap();
        assert_eq!(data.as_slice(), decrypted.as_slice());
    }

    #[test]
    fn test_secret_size_validation() {
        let too_short = [1u8; 16];
        let too_long = [1u8; 64];

        assert!(Secret::from_slice(&too_short).is_err());
        assert!(Secret::from_slice(&too_long).is_err());

        let just_right = [1u8; SECRET_SIZE];
        assert!(Secret::from_slice(&just_right).is_ok());
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let secret = Secret::generate();
        let (nonce, mut encrypted) = secret.encrypt(b"test data for integrity check").unwrap();

        encrypted[3] ^= 0xFF;
        assert!(matches!(
            secret.decrypt(&nonce, &encrypted),
            Err(SecretError::Decrypt)
        ));
    }

    #[test]
    fn test_wrong_nonce_fails() {
        let secret = Secret::generate();
        let (mut nonce, encrypted) = secret.encrypt(b"nonce bound").unwrap();

        nonce[0] ^= 0x01;
        assert!(matches!(
            secret.decrypt(&nonce, &encrypted),
            Err(SecretError::Decrypt)
        ));
    }

    #[test]
    fn test_wrong_key_fails() {
        let secret = Secret::generate();
        let other = Secret::generate();
        let (nonce, encrypted) = secret.encrypt(b"for one key only").unwrap();

        assert!(other.decrypt(&nonce, &encrypted).is_err());
    }

    #[test]
    fn test_truncated_ciphertext_fails() {
        let secret = Secret::generate();
        let (nonce, encrypted) = secret.encrypt(b"").unwrap();
        assert_eq!(encrypted.len(), TAG_SIZE);

        assert!(secret.decrypt(&nonce, &encrypted[..TAG_SIZE - 1]).is_err());
    }

    #[test]
    fn test_export_import_roundtrip() {
        let secret = Secret::generate();
        let text = secret.export();
        let imported = Secret::import(&text).unwrap();
        assert_eq!(secret, imported);

        assert!(Secret::import(&encoding::encode([0u8; 31])).is_err());
    }

    #[test]
    fn test_debug_redacts_key() {
        let secret = Secret::from([0xAB; SECRET_SIZE]);
        let printed = format!("{:?}", secret);
        assert_eq!(printed, "Secret(..)");
    }
}
