/**
 * Cryptographic types and operations.
 *  - Identity keypairs and passphrase sealing
 *  - Conversation key wrapping
 *  - Message encryption
 */
pub mod crypto;
/**
 * Per-conversation sets of wrapped keys,
 *  the record a server stores for each conversation.
 */
pub mod conversation;
/**
 * Explicitly scoped holder for an unlocked identity
 *  and the conversation keys it has unwrapped.
 */
pub mod session;
/**
 * Async wrappers that run the expensive
 *  RSA operations on the blocking pool.
 */
pub mod blocking;

pub mod prelude {
    pub use crate::conversation::{start_conversation, ConversationKeySet, Recipients};
    pub use crate::crypto::{
        generate_user_keypair, unlock_private_key, EncryptedData, PublicKey, Secret, SecretKey,
        UserKeypair,
    };
    pub use crate::session::Session;
}
