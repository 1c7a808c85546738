//! Credential store over a key-value engine
//!
//! Key layout:
//! - `user:{id}` -> user record as JSON
//! - `email:{email}` -> owning user id
//! - `refresh_token:{id}` -> the user's current refresh token

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::domain::storage::KeyValueStore;
use crate::domain::user::{CredentialStore, User, UserId};
use crate::domain::DomainError;

const USER_PREFIX: &str = "user:";
const EMAIL_PREFIX: &str = "email:";
const REFRESH_TOKEN_PREFIX: &str = "refresh_token:";

fn user_key(id: &UserId) -> String {
    format!("{}{}", USER_PREFIX, id)
}

fn email_key(email: &str) -> String {
    format!("{}{}", EMAIL_PREFIX, email)
}

fn refresh_token_key(id: &UserId) -> String {
    format!("{}{}", REFRESH_TOKEN_PREFIX, id)
}

/// `CredentialStore` implementation for any `KeyValueStore` engine
#[derive(Debug, Clone)]
pub struct KvCredentialStore {
    kv: Arc<dyn KeyValueStore>,
}

impl KvCredentialStore {
    /// Create a store on top of the given engine
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    fn encode(user: &User) -> Result<String, DomainError> {
        serde_json::to_string(user)
            .map_err(|e| DomainError::internal(format!("Failed to serialize user: {}", e)))
    }

    fn decode(key: &str, raw: &str) -> Result<User, DomainError> {
        serde_json::from_str(raw).map_err(|e| {
            DomainError::storage(format!("Corrupt user record '{}': {}", key, e))
        })
    }

    /// Point the email index entry at `owner`. Returns false if a live user holds it.
    ///
    /// The index and the user records are written separately, so an entry can
    /// outlive its user. An entry whose user is gone, or no longer has this
    /// email, is taken over.
    async fn claim_email(&self, email: &str, owner: &UserId) -> Result<bool, DomainError> {
        let key = email_key(email);

        if self.kv.set_if_absent(&key, owner.as_str()).await? {
            return Ok(true);
        }

        let Some(current) = self.kv.get(&key).await? else {
            return self.kv.set_if_absent(&key, owner.as_str()).await;
        };

        let held = match UserId::new(current.as_str()) {
            Ok(id) => self
                .find_by_id(&id)
                .await?
                .is_some_and(|user| user.email() == email),
            Err(_) => false,
        };

        if held {
            return Ok(false);
        }

        warn!(user_id = %owner, stale_owner = %current, "Reclaiming stale email index entry");
        self.kv.set(&key, owner.as_str()).await?;

        Ok(true)
    }

    /// Removes an email index entry, but only while it still points at `owner`
    async fn release_email(&self, email: &str, owner: &UserId) -> Result<(), DomainError> {
        let key = email_key(email);

        if self.kv.get(&key).await?.as_deref() == Some(owner.as_str()) {
            self.kv.delete(&key).await?;
        }

        Ok(())
    }

    /// Undo an index claim after a failed write; the original error wins
    async fn rollback_email(&self, email: &str, owner: &UserId) {
        if let Err(e) = self.release_email(email, owner).await {
            warn!(user_id = %owner, error = %e, "Failed to roll back email index entry");
        }
    }
}

#[async_trait]
impl CredentialStore for KvCredentialStore {
    async fn create(&self, user: User) -> Result<User, DomainError> {
        let raw = Self::encode(&user)?;

        if !self.claim_email(user.email(), user.id()).await? {
            return Err(DomainError::conflict("Email already exists"));
        }

        match self.kv.set_if_absent(&user_key(user.id()), &raw).await {
            Ok(true) => Ok(user),
            Ok(false) => {
                self.rollback_email(user.email(), user.id()).await;
                Err(DomainError::conflict(format!(
                    "User with ID '{}' already exists",
                    user.id()
                )))
            }
            Err(e) => {
                self.rollback_email(user.email(), user.id()).await;
                Err(e)
            }
        }
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        let key = user_key(id);

        match self.kv.get(&key).await? {
            Some(raw) => Self::decode(&key, &raw).map(Some),
            None => Ok(None),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let Some(owner) = self.kv.get(&email_key(email)).await? else {
            return Ok(None);
        };

        let Ok(id) = UserId::new(owner) else {
            return Ok(None);
        };

        Ok(self
            .find_by_id(&id)
            .await?
            .filter(|user| user.email() == email))
    }

    async fn find_all(&self) -> Result<Vec<User>, DomainError> {
        self.kv
            .scan_prefix(USER_PREFIX)
            .await?
            .iter()
            .map(|(key, raw)| Self::decode(key, raw))
            .collect()
    }

    async fn update(&self, user: &User) -> Result<User, DomainError> {
        let key = user_key(user.id());
        let existing = self
            .find_by_id(user.id())
            .await?
            .ok_or_else(|| DomainError::not_found(format!("User '{}' not found", user.id())))?;

        let email_changed = existing.email() != user.email();

        if email_changed && !self.claim_email(user.email(), user.id()).await? {
            return Err(DomainError::conflict("Email already exists"));
        }

        if let Err(e) = self.kv.set(&key, &Self::encode(user)?).await {
            if email_changed {
                self.rollback_email(user.email(), user.id()).await;
            }
            return Err(e);
        }

        if email_changed {
            self.release_email(existing.email(), user.id()).await?;
        }

        Ok(user.clone())
    }

    async fn delete(&self, id: &UserId) -> Result<bool, DomainError> {
        let Some(user) = self.find_by_id(id).await? else {
            return Ok(false);
        };

        let removed = self.kv.delete(&user_key(id)).await?;
        self.release_email(user.email(), id).await?;
        self.kv.delete(&refresh_token_key(id)).await?;

        Ok(removed)
    }

    async fn save_refresh_token(&self, user_id: &UserId, token: &str) -> Result<(), DomainError> {
        self.kv.set(&refresh_token_key(user_id), token).await
    }

    async fn find_refresh_token(&self, token: &str) -> Result<Option<UserId>, DomainError> {
        let entries = self.kv.scan_prefix(REFRESH_TOKEN_PREFIX).await?;

        Ok(entries
            .into_iter()
            .find(|(_, stored)| stored == token)
            .and_then(|(key, _)| {
                key.strip_prefix(REFRESH_TOKEN_PREFIX)
                    .and_then(|id| UserId::new(id).ok())
            }))
    }

    async fn delete_refresh_token(&self, user_id: &UserId) -> Result<bool, DomainError> {
        self.kv.delete(&refresh_token_key(user_id)).await
    }

    async fn health_check(&self) -> Result<(), DomainError> {
        self.kv.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::storage::MockKeyValueStore;
    use crate::domain::user::UserChanges;
    use crate::infrastructure::storage::InMemoryKeyValueStore;

    fn create_store() -> (KvCredentialStore, Arc<InMemoryKeyValueStore>) {
        let kv = Arc::new(InMemoryKeyValueStore::new());
        (KvCredentialStore::new(kv.clone()), kv)
    }

    fn make_user(id: &str, username: &str, email: &str) -> User {
        User::new(
            UserId::new(id).unwrap(),
            username,
            email,
            "$argon2id$hash",
            "Test",
            "User",
            30,
        )
    }

    #[tokio::test]
    async fn test_create_writes_record_and_index() {
        let (store, kv) = create_store();

        store
            .create(make_user("u1", "alice", "alice@example.com"))
            .await
            .unwrap();

        assert!(kv.get("user:u1").await.unwrap().is_some());
        assert_eq!(
            kv.get("email:alice@example.com").await.unwrap().as_deref(),
            Some("u1")
        );
    }

    #[tokio::test]
    async fn test_create_duplicate_email() {
        let (store, kv) = create_store();

        store
            .create(make_user("u1", "alice", "same@example.com"))
            .await
            .unwrap();

        let result = store.create(make_user("u2", "bob", "same@example.com")).await;

        assert!(matches!(result, Err(DomainError::Conflict { .. })));
        assert!(kv.get("user:u2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_duplicate_id_releases_email() {
        let (store, kv) = create_store();

        store
            .create(make_user("u1", "alice", "alice@example.com"))
            .await
            .unwrap();

        let result = store.create(make_user("u1", "bob", "bob@example.com")).await;

        assert!(matches!(result, Err(DomainError::Conflict { .. })));
        assert!(kv.get("email:bob@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_reclaims_dangling_email_entry() {
        let kv = Arc::new(InMemoryKeyValueStore::with_entries([("email:a@x.com", "ghost")]));
        let store = KvCredentialStore::new(kv.clone());

        assert!(store.find_by_email("a@x.com").await.unwrap().is_none());

        store.create(make_user("u1", "alice", "a@x.com")).await.unwrap();

        assert_eq!(kv.get("email:a@x.com").await.unwrap().as_deref(), Some("u1"));
        assert_eq!(
            store.find_by_email("a@x.com").await.unwrap().unwrap().username(),
            "alice"
        );
    }

    #[tokio::test]
    async fn test_create_reclaims_entry_of_user_who_moved_email() {
        let (store, kv) = create_store();
        let mut alice = store.create(make_user("u1", "alice", "a@x.com")).await.unwrap();

        alice.apply(UserChanges {
            email: Some("a2@x.com".to_string()),
            ..Default::default()
        });
        kv.set("user:u1", &KvCredentialStore::encode(&alice).unwrap())
            .await
            .unwrap();

        store.create(make_user("u2", "bob", "a@x.com")).await.unwrap();
        assert_eq!(kv.get("email:a@x.com").await.unwrap().as_deref(), Some("u2"));
    }

    #[tokio::test]
    async fn test_create_same_user_twice_keeps_index() {
        let (store, kv) = create_store();
        store.create(make_user("u1", "alice", "a@x.com")).await.unwrap();

        let result = store.create(make_user("u1", "alice", "a@x.com")).await;

        assert!(matches!(result, Err(DomainError::Conflict { .. })));
        assert_eq!(kv.get("email:a@x.com").await.unwrap().as_deref(), Some("u1"));
    }

    #[tokio::test]
    async fn test_update_reclaims_dangling_email_entry() {
        let (store, kv) = create_store();
        let mut alice = store.create(make_user("u1", "alice", "a@x.com")).await.unwrap();
        kv.set("email:b@x.com", "ghost").await.unwrap();

        alice.apply(UserChanges {
            email: Some("b@x.com".to_string()),
            ..Default::default()
        });
        store.update(&alice).await.unwrap();

        assert_eq!(kv.get("email:b@x.com").await.unwrap().as_deref(), Some("u1"));
        assert!(kv.get("email:a@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_by_email() {
        let (store, _) = create_store();

        store
            .create(make_user("u1", "alice", "alice@example.com"))
            .await
            .unwrap();

        let found = store.find_by_email("alice@example.com").await.unwrap();
        assert_eq!(found.unwrap().username(), "alice");

        assert!(store.find_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_all() {
        let (store, _) = create_store();

        assert!(store.find_all().await.unwrap().is_empty());

        store.create(make_user("u1", "alice", "a@x.com")).await.unwrap();
        store.create(make_user("u2", "bob", "b@x.com")).await.unwrap();
        store.save_refresh_token(&UserId::new("u1").unwrap(), "tok").await.unwrap();

        assert_eq!(store.find_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_moves_email_index() {
        let (store, kv) = create_store();
        let mut user = store.create(make_user("u1", "alice", "old@x.com")).await.unwrap();

        user.apply(UserChanges {
            email: Some("new@x.com".to_string()),
            ..Default::default()
        });
        store.update(&user).await.unwrap();

        assert!(kv.get("email:old@x.com").await.unwrap().is_none());
        assert_eq!(kv.get("email:new@x.com").await.unwrap().as_deref(), Some("u1"));
        assert!(store.find_by_email("new@x.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_to_taken_email() {
        let (store, _) = create_store();
        store.create(make_user("u1", "alice", "a@x.com")).await.unwrap();
        let mut bob = store.create(make_user("u2", "bob", "b@x.com")).await.unwrap();

        bob.apply(UserChanges {
            email: Some("a@x.com".to_string()),
            ..Default::default()
        });

        let result = store.update(&bob).await;
        assert!(matches!(result, Err(DomainError::Conflict { .. })));

        let stored = store.find_by_id(bob.id()).await.unwrap().unwrap();
        assert_eq!(stored.email(), "b@x.com");
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let (store, _) = create_store();

        let result = store.update(&make_user("ghost", "ghost", "g@x.com")).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let (store, kv) = create_store();
        let id = UserId::new("u1").unwrap();

        store.create(make_user("u1", "alice", "a@x.com")).await.unwrap();
        store.save_refresh_token(&id, "tok").await.unwrap();

        assert!(store.delete(&id).await.unwrap());

        assert!(kv.get("user:u1").await.unwrap().is_none());
        assert!(kv.get("email:a@x.com").await.unwrap().is_none());
        assert!(kv.get("refresh_token:u1").await.unwrap().is_none());
        assert!(!store.delete(&id).await.unwrap());
    }

    #[tokio::test]
    async fn test_refresh_token_overwrite_and_lookup() {
        let (store, _) = create_store();
        let id = UserId::new("u1").unwrap();

        store.save_refresh_token(&id, "first").await.unwrap();
        store.save_refresh_token(&id, "second").await.unwrap();

        assert_eq!(store.find_refresh_token("first").await.unwrap(), None);
        assert_eq!(store.find_refresh_token("second").await.unwrap(), Some(id.clone()));

        assert!(store.delete_refresh_token(&id).await.unwrap());
        assert_eq!(store.find_refresh_token("second").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_record_is_storage_error() {
        let kv = Arc::new(InMemoryKeyValueStore::with_entries([("user:u1", "not json")]));
        let store = KvCredentialStore::new(kv);

        let result = store.find_by_id(&UserId::new("u1").unwrap()).await;
        assert!(matches!(result, Err(DomainError::Storage { .. })));
    }

    #[tokio::test]
    async fn test_engine_failure_propagates() {
        let mut kv = MockKeyValueStore::new();
        kv.expect_scan_prefix()
            .returning(|_| Err(DomainError::storage("disk gone")));

        let store = KvCredentialStore::new(Arc::new(kv));

        let result = store.find_refresh_token("tok").await;
        assert!(matches!(result, Err(DomainError::Storage { .. })));
    }

    #[tokio::test]
    async fn test_failed_record_write_rolls_back_index() {
        let mut kv = MockKeyValueStore::new();
        kv.expect_set_if_absent()
            .withf(|key, _| key.starts_with("email:"))
            .returning(|_, _| Ok(true));
        kv.expect_set_if_absent()
            .withf(|key, _| key.starts_with("user:"))
            .returning(|_, _| Err(DomainError::storage("write failed")));
        kv.expect_get().returning(|_| Ok(Some("u1".to_string())));
        kv.expect_delete()
            .withf(|key| key.starts_with("email:"))
            .times(1)
            .returning(|_| Ok(true));

        let store = KvCredentialStore::new(Arc::new(kv));

        let result = store.create(make_user("u1", "alice", "a@x.com")).await;
        assert!(matches!(result, Err(DomainError::Storage { .. })));
    }
}
