pub mod conversation;
pub mod identity;
pub mod init;
pub mod message;
pub mod version;

pub use conversation::Conversation;
pub use identity::Identity;
pub use init::Init;
pub use message::Message;
pub use version::Version;

#[cfg(test)]
mod test {
    use std::collections::BTreeMap;
    use std::path::Path;

    use common::conversation::ConversationKeySet;
    use common::crypto::{generate_user_keypair_with_bits, MIN_RSA_KEY_BITS};
    use tempfile::TempDir;

    use super::*;
    use crate::op::{Op, OpContext};
    use crate::state::{read_json, write_json};

    async fn init(dir: &Path, id: &str, passphrase: &str) -> OpContext {
        let ctx = OpContext::new(Some(dir.to_path_buf()), Some(passphrase.to_string()));
        Init {
            participant_id: id.to_string(),
            key_bits: Some(MIN_RSA_KEY_BITS),
        }
        .execute(&ctx)
        .await
        .unwrap();
        ctx
    }

    #[tokio::test]
    async fn test_conversation_roundtrip_through_ops() {
        let temp = TempDir::new().unwrap();
        let ctx = init(&temp.path().join("alice"), "alice", "alice-pw").await;

        let bob = generate_user_keypair_with_bits("bob-pw", MIN_RSA_KEY_BITS).unwrap();
        let recipients_path = temp.path().join("recipients.json");
        let recipients = BTreeMap::from([
            ("bob".to_string(), bob.public_key.clone()),
            ("broken".to_string(), "AAAA".to_string()),
        ]);
        write_json(&recipients_path, &recipients).unwrap();

        let keys = temp.path().join("keys.json");
        let report = conversation::start::Start {
            recipients: recipients_path.clone(),
            out: Some(keys.clone()),
            strict: false,
        }
        .execute(&ctx)
        .await
        .unwrap();
        assert!(report.contains("skipped broken"));

        let key_set: ConversationKeySet = read_json(&keys).unwrap();
        assert!(key_set.contains("alice"));
        assert!(key_set.contains("bob"));
        assert!(!key_set.contains("broken"));

        let encrypted = message::encrypt::Encrypt {
            keys: keys.clone(),
            text: "hello".to_string(),
        }
        .execute(&ctx)
        .await
        .unwrap();
        let input = temp.path().join("message.json");
        std::fs::write(&input, encrypted).unwrap();

        let plaintext = message::decrypt::Decrypt {
            keys: keys.clone(),
            input,
        }
        .execute(&ctx)
        .await
        .unwrap();
        assert_eq!(plaintext, "hello");

        // bob can read his entry
        let bob_key = common::crypto::unlock_private_key(&bob.encrypted_private_key, "bob-pw")
            .unwrap();
        assert!(key_set.unwrap_for("bob", &bob_key).is_ok());
    }

    #[tokio::test]
    async fn test_strict_start_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let ctx = init(&temp.path().join("alice"), "alice", "pw").await;

        let recipients_path = temp.path().join("recipients.json");
        write_json(
            &recipients_path,
            &BTreeMap::from([("broken".to_string(), "AAAA".to_string())]),
        )
        .unwrap();

        let keys = temp.path().join("keys.json");
        let result = conversation::start::Start {
            recipients: recipients_path,
            out: Some(keys.clone()),
            strict: true,
        }
        .execute(&ctx)
        .await;
        assert!(matches!(
            result,
            Err(conversation::start::StartError::Incomplete(ids)) if ids == vec!["broken".to_string()]
        ));
        assert!(!keys.exists());
    }

    #[tokio::test]
    async fn test_add_participant_then_they_can_unwrap() {
        let temp = TempDir::new().unwrap();
        let ctx = init(&temp.path().join("alice"), "alice", "pw").await;

        let recipients_path = temp.path().join("recipients.json");
        write_json(&recipients_path, &BTreeMap::<String, String>::new()).unwrap();
        let keys = temp.path().join("keys.json");
        conversation::start::Start {
            recipients: recipients_path,
            out: Some(keys.clone()),
            strict: true,
        }
        .execute(&ctx)
        .await
        .unwrap();

        let carol = generate_user_keypair_with_bits("carol-pw", MIN_RSA_KEY_BITS).unwrap();
        conversation::add::Add {
            keys: keys.clone(),
            participant: "carol".to_string(),
            public_key: carol.public_key.clone(),
        }
        .execute(&ctx)
        .await
        .unwrap();

        let key_set: ConversationKeySet = read_json(&keys).unwrap();
        assert_eq!(key_set.len(), 2);
        let carol_key =
            common::crypto::unlock_private_key(&carol.encrypted_private_key, "carol-pw").unwrap();
        assert!(key_set.unwrap_for("carol", &carol_key).is_ok());
    }

    #[tokio::test]
    async fn test_passwd_then_old_passphrase_fails() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("alice");
        let ctx = init(&dir, "alice", "old").await;

        identity::passwd::Passwd {
            new_passphrase: "new".to_string(),
        }
        .execute(&ctx)
        .await
        .unwrap();

        assert!(identity::verify::Verify.execute(&ctx).await.is_err());

        let renewed = OpContext::new(Some(dir), Some("new".to_string()));
        let output = identity::verify::Verify.execute(&renewed).await.unwrap();
        assert!(output.contains("alice"));
    }

    #[tokio::test]
    async fn test_init_refuses_existing_directory() {
        let temp = TempDir::new().unwrap();
        let ctx = init(temp.path(), "alice", "pw").await;

        let result = Init {
            participant_id: "alice".to_string(),
            key_bits: Some(MIN_RSA_KEY_BITS),
        }
        .execute(&ctx)
        .await;
        assert!(matches!(result, Err(init::InitError::StateFailed(_))));
    }

    #[tokio::test]
    async fn test_show_prints_public_key() {
        let temp = TempDir::new().unwrap();
        let ctx = init(temp.path(), "alice", "pw").await;

        let output = identity::show::Show { pem: true }.execute(&ctx).await.unwrap();
        assert!(output.contains("Participant: alice"));
        assert!(output.contains("BEGIN PUBLIC KEY"));
    }
}
