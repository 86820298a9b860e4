//! Identity keypairs and private-key-at-rest protection
//!
//! A [`UserKeypair`] is what gets stored per user/device: the public key in
//! the clear and the private key sealed under a passphrase-derived key.
//!
//! # Protected private key layout
//!
//! ```text
//! [ salt: 16 bytes ][ nonce: 12 bytes ][ AES-256-GCM(pkcs8_der) || tag ]
//! ```
//!
//! The whole blob is base64 encoded. Offsets are fixed so existing stored
//! blobs stay readable.

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::encoding::{self, EncodingError};
use super::kdf::{derive_key, SALT_SIZE};
use super::keys::{KeyError, PublicKey, SecretKey, RSA_KEY_BITS};
use super::secret::{SecretError, NONCE_SIZE, TAG_SIZE};

/// Errors that can occur while creating or re-sealing an identity keypair
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("key error: {0}")]
    Key(#[from] KeyError),
    #[error("secret error: {0}")]
    Secret(#[from] SecretError),
    #[error("unlock error: {0}")]
    Unlock(#[from] UnlockError),
}

/// The private key could not be unlocked
///
/// A wrong passphrase and a corrupted blob are deliberately reported the same
/// way: authenticated encryption cannot tell them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unable to unlock private key: wrong passphrase or corrupted key")]
pub struct UnlockError;

/// A user's stored identity: shareable public key plus sealed private key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserKeypair {
    /// Base64 SubjectPublicKeyInfo DER
    pub public_key: String,
    /// Base64 `salt || nonce || ciphertext`
    pub encrypted_private_key: String,
}

impl UserKeypair {
    /// Parse the public half
    pub fn public(&self) -> Result<PublicKey, KeyError> {
        PublicKey::from_base64(&self.public_key)
    }
}

/// Fixed-offset record holding a passphrase-sealed private key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateKeyEnvelope {
    pub salt: [u8; SALT_SIZE],
    pub nonce: [u8; NONCE_SIZE],
    pub ciphertext: Vec<u8>,
}

impl PrivateKeyEnvelope {
    /// Offset of the first ciphertext byte
    pub const HEADER_SIZE: usize = SALT_SIZE + NONCE_SIZE;

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::HEADER_SIZE + self.ciphertext.len());
        out.extend_from_slice(&self.salt);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Split a raw blob at the fixed salt/nonce offsets
    ///
    /// Anything shorter than header plus an AEAD tag cannot be a valid blob.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EncodingError> {
        let min = Self::HEADER_SIZE + TAG_SIZE;
        if bytes.len() < min {
            return Err(EncodingError::TooShort {
                min,
                got: bytes.len(),
            });
        }

        let mut salt = [0u8; SALT_SIZE];
        salt.copy_from_slice(&bytes[..SALT_SIZE]);
        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(&bytes[SALT_SIZE..Self::HEADER_SIZE]);

        Ok(Self {
            salt,
            nonce,
            ciphertext: bytes[Self::HEADER_SIZE..].to_vec(),
        })
    }

    pub fn to_base64(&self) -> String {
        encoding::encode(self.to_bytes())
    }

    pub fn from_base64(text: &str) -> Result<Self, EncodingError> {
        Self::from_bytes(&encoding::decode(text)?)
    }

    /// Seal a private key under a key derived from `passphrase` and a fresh salt
    pub fn seal(secret_key: &SecretKey, passphrase: &str) -> Result<Self, IdentityError> {
        let mut salt = [0u8; SALT_SIZE];
        OsRng.fill_bytes(&mut salt);

        let wrapping_key = derive_key(passphrase, &salt);
        let der = secret_key.to_pkcs8_der()?;
        let (nonce, ciphertext) = wrapping_key.encrypt(&der)?;

        Ok(Self {
            salt,
            nonce,
            ciphertext,
        })
    }

    /// Recover the private key. Every failure collapses into [`UnlockError`].
    pub fn open(&self, passphrase: &str) -> Result<SecretKey, UnlockError> {
        let wrapping_key = derive_key(passphrase, &self.salt);
        let der = wrapping_key
            .decrypt(&self.nonce, &self.ciphertext)
            .map_err(|_| UnlockError)?;
        SecretKey::from_pkcs8_der(&der).map_err(|_| UnlockError)
    }
}

/// Generate a new identity keypair with the private half sealed under `passphrase`
///
/// Uses a [`RSA_KEY_BITS`] modulus. CPU heavy; see
/// [`blocking::generate_user_keypair`](crate::blocking::generate_user_keypair).
pub fn generate_user_keypair(passphrase: &str) -> Result<UserKeypair, IdentityError> {
    generate_user_keypair_with_bits(passphrase, RSA_KEY_BITS)
}

/// [`generate_user_keypair`] with an explicit modulus size
pub fn generate_user_keypair_with_bits(
    passphrase: &str,
    bits: usize,
) -> Result<UserKeypair, IdentityError> {
    let secret_key = SecretKey::generate_with_bits(bits)?;
    let public_key = secret_key.public().to_base64()?;
    let envelope = PrivateKeyEnvelope::seal(&secret_key, passphrase)?;

    tracing::info!(bits, "generated identity keypair");

    Ok(UserKeypair {
        public_key,
        encrypted_private_key: envelope.to_base64(),
    })
}

/// Unlock a sealed private key with its passphrase
///
/// Never returns a key that might be wrong: either the AEAD tag verifies and
/// the key parses, or this fails with [`UnlockError`].
pub fn unlock_private_key(
    encrypted_private_key: &str,
    passphrase: &str,
) -> Result<SecretKey, UnlockError> {
    let envelope = PrivateKeyEnvelope::from_base64(encrypted_private_key).map_err(|e| {
        tracing::debug!(error = %e, "sealed private key is malformed");
        UnlockError
    })?;
    envelope.open(passphrase)
}

/// Re-seal the same private key under a new passphrase
///
/// The public key is unchanged, so conversation keys already wrapped for this
/// identity stay readable. The returned keypair replaces the old one wholesale.
pub fn change_passphrase(
    keypair: &UserKeypair,
    old_passphrase: &str,
    new_passphrase: &str,
) -> Result<UserKeypair, IdentityError> {
    let secret_key = unlock_private_key(&keypair.encrypted_private_key, old_passphrase)?;
    let envelope = PrivateKeyEnvelope::seal(&secret_key, new_passphrase)?;

    tracing::info!("re-sealed identity private key under new passphrase");

    Ok(UserKeypair {
        public_key: keypair.public_key.clone(),
        encrypted_private_key: envelope.to_base64(),
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::keys::MIN_RSA_KEY_BITS;

    fn keypair(passphrase: &str) -> UserKeypair {
        generate_user_keypair_with_bits(passphrase, MIN_RSA_KEY_BITS).unwrap()
    }

    #[test]
    fn test_unlock_roundtrip() {
        let kp = keypair("correct-horse");
        let secret_key = unlock_private_key(&kp.encrypted_private_key, "correct-horse").unwrap();
        assert_eq!(secret_key.public(), kp.public().unwrap());
    }

    #[test]
    fn test_wrong_passphrase_fails() {
        let kp = keypair("correct-horse");
        assert_eq!(
            unlock_private_key(&kp.encrypted_private_key, "battery-staple").unwrap_err(),
            UnlockError
        );
        assert!(unlock_private_key(&kp.encrypted_private_key, "").is_err());
    }

    #[test]
    fn test_corrupted_blob_fails() {
        let kp = keypair("pw");
        let mut bytes = encoding::decode(&kp.encrypted_private_key).unwrap();

        // flip a ciphertext byte
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        assert!(unlock_private_key(&encoding::encode(&bytes), "pw").is_err());

        // flip a salt byte: the derived key changes, so the tag fails
        bytes[last] ^= 0x01;
        bytes[0] ^= 0x01;
        assert!(unlock_private_key(&encoding::encode(&bytes), "pw").is_err());

        // truncated and garbage inputs
        assert!(unlock_private_key(&encoding::encode(&bytes[..20]), "pw").is_err());
        assert!(unlock_private_key("not base64 at all", "pw").is_err());
    }

    #[test]
    fn test_envelope_fixed_offsets() {
        let kp = keypair("pw");
        let raw = encoding::decode(&kp.encrypted_private_key).unwrap();
        let envelope = PrivateKeyEnvelope::from_bytes(&raw).unwrap();

        assert_eq!(&raw[..16], &envelope.salt);
        assert_eq!(&raw[16..28], &envelope.nonce);
        assert_eq!(&raw[28..], envelope.ciphertext.as_slice());
        assert_eq!(envelope.to_bytes(), raw);
    }

    #[test]
    fn test_envelope_too_short() {
        let err = PrivateKeyEnvelope::from_bytes(&[0u8; 43]).unwrap_err();
        assert!(matches!(err, EncodingError::TooShort { min: 44, got: 43 }));
    }

    #[test]
    fn test_fresh_salt_and_nonce_per_seal() {
        let secret_key = SecretKey::generate_with_bits(MIN_RSA_KEY_BITS).unwrap();
        let a = PrivateKeyEnvelope::seal(&secret_key, "pw").unwrap();
        let b = PrivateKeyEnvelope::seal(&secret_key, "pw").unwrap();
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn test_change_passphrase() {
        let kp = keypair("old");
        let rekeyed = change_passphrase(&kp, "old", "new").unwrap();

        assert_eq!(rekeyed.public_key, kp.public_key);
        assert_ne!(rekeyed.encrypted_private_key, kp.encrypted_private_key);
        assert!(unlock_private_key(&rekeyed.encrypted_private_key, "old").is_err());

        let secret_key = unlock_private_key(&rekeyed.encrypted_private_key, "new").unwrap();
        assert_eq!(secret_key.public(), kp.public().unwrap());

        assert!(matches!(
            change_passphrase(&kp, "wrong", "new"),
            Err(IdentityError::Unlock(UnlockError))
        ));
    }

    #[test]
    fn test_keypair_json_shape() {
        let kp = UserKeypair {
            public_key: "cHVi".to_string(),
            encrypted_private_key: "cHJpdg==".to_string(),
        };
        let json = serde_json::to_value(&kp).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "publicKey": "cHVi", "encryptedPrivateKey": "cHJpdg==" })
        );
    }
}
