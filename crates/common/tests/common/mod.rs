//! Shared test utilities for key management integration tests
#![allow(dead_code)]

use common::crypto::{
    generate_user_keypair_with_bits, unlock_private_key, SecretKey, UserKeypair, MIN_RSA_KEY_BITS,
};
use tracing_subscriber::EnvFilter;

/// A test participant: id, stored keypair, and the passphrase that unlocks it
pub struct Participant {
    pub id: String,
    pub passphrase: String,
    pub keypair: UserKeypair,
}

impl Participant {
    /// Unlock this participant's private key
    pub fn unlock(&self) -> SecretKey {
        unlock_private_key(&self.keypair.encrypted_private_key, &self.passphrase).unwrap()
    }
}

/// Enroll a participant with a small (fast) keypair
pub fn enroll(id: &str, passphrase: &str) -> Participant {
    Participant {
        id: id.to_string(),
        passphrase: passphrase.to_string(),
        keypair: generate_user_keypair_with_bits(passphrase, MIN_RSA_KEY_BITS).unwrap(),
    }
}

/// Install a test subscriber so `RUST_LOG=debug cargo test` shows library logs
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
