//! Async wrappers that move RSA work onto tokio's blocking pool
//!
//! Keypair generation, passphrase unlocking (PBKDF2 + RSA import) and RSA
//! wrap/unwrap take milliseconds to seconds of CPU. Call these from async
//! code instead of the synchronous functions so the runtime's worker threads
//! stay free. Symmetric message encryption is cheap and has no wrapper here.

use tokio::task::JoinError;

use crate::conversation::Recipients;
use crate::crypto::{self, IdentityError, Secret, SecretKey, UnlockError, UnwrapError, UserKeypair};

/// Error from a blocking-pool task
#[derive(Debug, thiserror::Error)]
pub enum BlockingError<E> {
    #[error(transparent)]
    Inner(E),
    #[error("blocking task failed: {0}")]
    Join(#[from] JoinError),
}

async fn run<T, E, F>(f: F) -> Result<T, BlockingError<E>>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await?
        .map_err(BlockingError::Inner)
}

/// [`crypto::generate_user_keypair_with_bits`] on the blocking pool
pub async fn generate_user_keypair(
    passphrase: String,
    bits: usize,
) -> Result<UserKeypair, BlockingError<IdentityError>> {
    run(move || crypto::generate_user_keypair_with_bits(&passphrase, bits)).await
}

/// [`crypto::unlock_private_key`] on the blocking pool
pub async fn unlock_private_key(
    encrypted_private_key: String,
    passphrase: String,
) -> Result<SecretKey, BlockingError<UnlockError>> {
    run(move || crypto::unlock_private_key(&encrypted_private_key, &passphrase)).await
}

/// [`crypto::change_passphrase`] on the blocking pool
pub async fn change_passphrase(
    keypair: UserKeypair,
    old_passphrase: String,
    new_passphrase: String,
) -> Result<UserKeypair, BlockingError<IdentityError>> {
    run(move || crypto::change_passphrase(&keypair, &old_passphrase, &new_passphrase)).await
}

/// [`crypto::encrypt_conversation_key_for_multiple_recipients`] on the blocking pool
pub async fn wrap_for_recipients(
    conversation_key: Secret,
    recipients: Recipients,
) -> Result<crypto::WrapOutcome, BlockingError<std::convert::Infallible>> {
    run(move || {
        Ok(crypto::encrypt_conversation_key_for_multiple_recipients(
            &conversation_key,
            &recipients,
        ))
    })
    .await
}

/// [`crypto::decrypt_conversation_key`] on the blocking pool
pub async fn unwrap_conversation_key(
    wrapped: String,
    secret_key: SecretKey,
) -> Result<Secret, BlockingError<UnwrapError>> {
    run(move || crypto::decrypt_conversation_key(&wrapped, &secret_key)).await
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::MIN_RSA_KEY_BITS;

    #[tokio::test]
    async fn test_blocking_roundtrip() {
        let keypair = generate_user_keypair("pw".to_string(), MIN_RSA_KEY_BITS)
            .await
            .unwrap();
        let secret_key = unlock_private_key(keypair.encrypted_private_key.clone(), "pw".to_string())
            .await
            .unwrap();

        let key = crypto::generate_conversation_key();
        let recipients = Recipients::from([("me".to_string(), keypair.public_key.clone())]);
        let outcome = wrap_for_recipients(key.clone(), recipients).await.unwrap();
        assert!(outcome.is_complete());

        let unwrapped = unwrap_conversation_key(outcome.wrapped["me"].clone(), secret_key)
            .await
            .unwrap();
        assert_eq!(unwrapped, key);
    }

    #[tokio::test]
    async fn test_blocking_change_passphrase() {
        let keypair = generate_user_keypair("old".to_string(), MIN_RSA_KEY_BITS)
            .await
            .unwrap();
        let changed = change_passphrase(keypair.clone(), "old".to_string(), "new".to_string())
            .await
            .unwrap();
        assert_eq!(changed.public_key, keypair.public_key);
        assert!(unlock_private_key(changed.encrypted_private_key.clone(), "new".to_string())
            .await
            .is_ok());
        assert!(
            change_passphrase(keypair, "wrong".to_string(), "new".to_string())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_blocking_errors_pass_through() {
        let keypair = generate_user_keypair("pw".to_string(), MIN_RSA_KEY_BITS)
            .await
            .unwrap();
        let err = unlock_private_key(keypair.encrypted_private_key, "wrong".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, BlockingError::Inner(UnlockError)));
        assert_eq!(err.to_string(), UnlockError.to_string());
    }
}
