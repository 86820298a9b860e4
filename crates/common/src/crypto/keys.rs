use std::fmt;

use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use zeroize::Zeroizing;

use super::encoding::{self, EncodingError};

/// Modulus size for newly generated identity keys
pub const RSA_KEY_BITS: usize = 4096;
/// Smallest modulus accepted when generating or importing a key
pub const MIN_RSA_KEY_BITS: usize = 2048;

const PUBLIC_KEY_PEM_TAG: &str = "PUBLIC KEY";

/// Errors that can occur during key operations
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("key error: {0}")]
    Default(#[from] anyhow::Error),
    #[error("rsa error: {0}")]
    Rsa(#[from] rsa::Error),
    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),
    #[error("key too small, need at least {min} bits, got {bits}")]
    TooSmall { bits: usize, min: usize },
}

fn oaep() -> Oaep {
    Oaep::new::<Sha256>()
}

fn check_size(bits: usize) -> Result<(), KeyError> {
    if bits < MIN_RSA_KEY_BITS {
        return Err(KeyError::TooSmall {
            bits,
            min: MIN_RSA_KEY_BITS,
        });
    }
    Ok(())
}

/// Public half of a participant's identity keypair
///
/// An RSA public key used with OAEP (SHA-256) to wrap conversation keys for
/// its owner. Freely shareable; it travels as base64-encoded
/// SubjectPublicKeyInfo DER.
///
/// # Examples
///
/// ```ignore
/// let secret_key = SecretKey::generate()?;
/// let public_key = secret_key.public();
///
/// // Serialize to text for storage/transmission
/// let text = public_key.to_base64()?;
/// let recovered = PublicKey::from_base64(&text)?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey(RsaPublicKey);

impl PublicKey {
    /// Parse a public key from SubjectPublicKeyInfo DER
    ///
    /// # Errors
    ///
    /// Returns an error if the DER is malformed or the modulus is smaller than
    /// [`MIN_RSA_KEY_BITS`].
    pub fn from_der(der: &[u8]) -> Result<Self, KeyError> {
        let key = RsaPublicKey::from_public_key_der(der)
            .map_err(|e| anyhow::anyhow!("invalid public key DER: {}", e))?;
        check_size(key.size() * 8)?;
        Ok(Self(key))
    }

    /// Encode as SubjectPublicKeyInfo DER
    pub fn to_der(&self) -> Result<Vec<u8>, KeyError> {
        let doc = self
            .0
            .to_public_key_der()
            .map_err(|e| anyhow::anyhow!("public key DER encode error: {}", e))?;
        Ok(doc.as_bytes().to_vec())
    }

    /// Parse a public key from base64 text
    pub fn from_base64(text: &str) -> Result<Self, KeyError> {
        let der = encoding::decode(text)?;
        Self::from_der(&der)
    }

    /// Encode as base64 text, the form stored in `UserKeypair::public_key`
    pub fn to_base64(&self) -> Result<String, KeyError> {
        Ok(encoding::encode(self.to_der()?))
    }

    /// Encode public key in PEM format
    ///
    /// Returns a PEM-encoded string with tag "PUBLIC KEY".
    pub fn to_pem(&self) -> Result<String, KeyError> {
        let pem = pem::Pem::new(PUBLIC_KEY_PEM_TAG, self.to_der()?);
        Ok(pem::encode(&pem))
    }

    /// Parse a public key from PEM format
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The PEM string is malformed
    /// - The PEM tag is not "PUBLIC KEY"
    /// - The key itself is invalid or too small
    pub fn from_pem(pem_str: &str) -> Result<Self, KeyError> {
        let pem = pem::parse(pem_str).map_err(|e| anyhow::anyhow!("failed to parse PEM: {}", e))?;

        if pem.tag() != PUBLIC_KEY_PEM_TAG {
            return Err(anyhow::anyhow!("invalid PEM tag, expected PUBLIC KEY").into());
        }

        Self::from_der(pem.contents())
    }

    /// Modulus size in bits
    pub fn bits(&self) -> usize {
        self.0.size() * 8
    }

    /// RSA-OAEP encrypt a short payload (a symmetric key) to this key's owner
    pub(crate) fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>, KeyError> {
        Ok(self.0.encrypt(&mut OsRng, oaep(), data)?)
    }
}

/// Private half of a participant's identity keypair
///
/// Once unlocked this is a decrypt-only handle: it can unwrap conversation
/// keys addressed to its public key and derive that public key, nothing else.
/// It cannot be exported through the public API; the only way it leaves
/// memory is re-encrypted under a passphrase by
/// [`generate_user_keypair`](super::generate_user_keypair) or
/// [`change_passphrase`](super::change_passphrase).
///
/// The underlying key material is zeroized on drop.
#[derive(Clone)]
pub struct SecretKey(RsaPrivateKey);

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("bits", &(self.0.size() * 8))
            .finish_non_exhaustive()
    }
}

impl SecretKey {
    /// Generate a new [`RSA_KEY_BITS`] keypair with public exponent 65537
    ///
    /// This is slow (seconds). Keep it off latency-sensitive paths; see
    /// [`crate::blocking`].
    pub fn generate() -> Result<Self, KeyError> {
        Self::generate_with_bits(RSA_KEY_BITS)
    }

    /// Generate a keypair with an explicit modulus size
    ///
    /// # Errors
    ///
    /// Returns an error if `bits` is below [`MIN_RSA_KEY_BITS`] or generation fails.
    pub fn generate_with_bits(bits: usize) -> Result<Self, KeyError> {
        check_size(bits)?;
        tracing::debug!(bits, "generating rsa keypair");
        let key = RsaPrivateKey::new(&mut OsRng, bits)?;
        Ok(Self(key))
    }

    /// Derive the public key from this secret key
    pub fn public(&self) -> PublicKey {
        PublicKey(self.0.to_public_key())
    }

    /// Modulus size in bits
    pub fn bits(&self) -> usize {
        self.0.size() * 8
    }

    /// Encode as PKCS#8 DER into a buffer that is wiped on drop
    pub(crate) fn to_pkcs8_der(&self) -> Result<Zeroizing<Vec<u8>>, KeyError> {
        let doc = self
            .0
            .to_pkcs8_der()
            .map_err(|e| anyhow::anyhow!("private key DER encode error: {}", e))?;
        Ok(Zeroizing::new(doc.as_bytes().to_vec()))
    }

    /// Parse and validate a PKCS#8 DER private key
    pub(crate) fn from_pkcs8_der(der: &[u8]) -> Result<Self, KeyError> {
        let key = RsaPrivateKey::from_pkcs8_der(der)
            .map_err(|e| anyhow::anyhow!("invalid private key DER: {}", e))?;
        key.validate()?;
        check_size(key.size() * 8)?;
        Ok(Self(key))
    }

    /// RSA-OAEP decrypt a payload addressed to this key
    pub(crate) fn decrypt(&self, ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>, KeyError> {
        Ok(Zeroizing::new(self.0.decrypt(oaep(), ciphertext)?))
    }
}
