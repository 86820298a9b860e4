//! Cryptographic primitives for Hearth
//!
//! This module provides the end-to-end encryption layer for conversations:
//!
//! - **Identity**: RSA-4096 keypairs, the private half sealed at rest under a passphrase
//! - **Encryption**: AES-256-GCM for message bodies under a per-conversation `Secret`
//! - **Key Sharing**: RSA-OAEP (SHA-256) wrapping of the conversation key per participant
//!
//! # Security Model
//!
//! ## User Identity
//! Each user/device has one RSA keypair. The public key is published; the
//! private key is stored as `salt || nonce || AES-256-GCM(pkcs8)` where the
//! AES key comes from PBKDF2-HMAC-SHA256 (100,000 iterations) over the
//! user's passphrase. See [`UserKeypair`].
//!
//! ## Conversation Encryption
//! Every conversation has its own random 256-bit [`Secret`]. Messages are
//! AES-256-GCM encrypted under it with a fresh random nonce per message.
//!
//! ## Key Sharing Protocol
//! To give a participant access to a conversation:
//! 1. Import the participant's RSA public key
//! 2. RSA-OAEP encrypt the raw conversation key bytes under it
//! 3. Store the base64 result against the participant's id
//!
//! The participant recovers the key by:
//! 1. Unlocking their private key with their passphrase
//! 2. RSA-OAEP decrypting their entry
//!
//! The relaying service only ever sees public keys, sealed private keys,
//! wrapped keys and ciphertext.
//!
//! ## Not provided
//! No ratcheting between messages, no rewrap when a participant leaves, no
//! verification that a public key really belongs to who the server says.

pub mod encoding;
mod identity;
mod kdf;
mod keys;
mod message;
mod secret;
mod secret_share;

pub use encoding::EncodingError;
pub use identity::{
    change_passphrase, generate_user_keypair, generate_user_keypair_with_bits,
    unlock_private_key, IdentityError, PrivateKeyEnvelope, UnlockError, UserKeypair,
};
pub use kdf::{derive_key, PBKDF2_ITERATIONS, SALT_SIZE};
pub use keys::{KeyError, PublicKey, SecretKey, MIN_RSA_KEY_BITS, RSA_KEY_BITS};
pub use message::{decrypt_message, encrypt_message, EncryptedData, MessageError};
pub use secret::{Secret, SecretError, NONCE_SIZE, SECRET_SIZE, TAG_SIZE};
pub use secret_share::{
    decrypt_conversation_key, encrypt_conversation_key,
    encrypt_conversation_key_for_multiple_recipients, export_conversation_key,
    generate_conversation_key, import_conversation_key, SecretShare, UnwrapError, WrapError,
    WrapOutcome,
};
