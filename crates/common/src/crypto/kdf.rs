//! Passphrase key derivation
//!
//! Stretches a human passphrase and a random salt into a 256-bit wrapping key
//! with PBKDF2-HMAC-SHA256. The same `(passphrase, salt)` pair always yields
//! the same key; there is no separate verifier, a wrong passphrase only shows
//! up when the AEAD tag check fails on the data the key protects.

use sha2::Sha256;

use super::secret::{Secret, SECRET_SIZE};

/// PBKDF2 iteration count
pub const PBKDF2_ITERATIONS: u32 = 100_000;
/// Size of the random salt stored alongside each protected blob
pub const SALT_SIZE: usize = 16;

/// Derive a symmetric wrapping key from a passphrase and salt
pub fn derive_key(passphrase: &str, salt: &[u8; SALT_SIZE]) -> Secret {
    let mut key = [0u8; SECRET_SIZE];
    pbkdf2::pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key);
    // the array is Copy, so clear the stack copy left behind
    let secret = Secret::from(key);
    zeroize::Zeroize::zeroize(&mut key);
    secret
}
