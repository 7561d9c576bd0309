use super::{
    CredentialStore, DEFAULT_ROLE, NewUser, PasswordHasher, PasswordPolicy, StoreError,
    StoreFuture, User, ValidationError, normalize_username, validate_registration,
};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Process-local store keyed by normalized username.
///
/// Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, User>>,
    hasher: PasswordHasher,
    policy: PasswordPolicy,
}

impl MemoryStore {
    #[must_use]
    pub fn new(hasher: PasswordHasher, policy: PasswordPolicy) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            hasher,
            policy,
        }
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

impl CredentialStore for MemoryStore {
    fn create<'a>(&'a self, user: NewUser, password: &'a str) -> StoreFuture<'a, User> {
        Box::pin(async move {
            let errors =
                validate_registration(&user.username, user.email.as_deref(), password, &self.policy);
            if !errors.is_empty() {
                return Err(StoreError::Validation(errors));
            }

            let key = normalize_username(&user.username);

            // Cheap early exit before paying for the hash.
            if self.users.read().await.contains_key(&key) {
                return Err(StoreError::Validation(vec![
                    ValidationError::duplicate_username(&user.username),
                ]));
            }

            let password_hash = self.hasher.hash(password).await?;

            // Re-check under the write lock: another request may have won the race.
            let mut users = self.users.write().await;
            if users.contains_key(&key) {
                return Err(StoreError::Validation(vec![
                    ValidationError::duplicate_username(&user.username),
                ]));
            }

            let record = User {
                id: Uuid::new_v4(),
                username: user.username,
                email: user.email,
                role: DEFAULT_ROLE.to_string(),
                password_hash,
            };
            users.insert(key, record.clone());

            debug!("User created: {}", record.id);

            Ok(record)
        })
    }

    fn find_by_name<'a>(&'a self, username: &'a str) -> StoreFuture<'a, Option<User>> {
        Box::pin(async move {
            let key = normalize_username(username);
            Ok(self.users.read().await.get(&key).cloned())
        })
    }

    fn verify_password<'a>(&'a self, user: &'a User, password: &'a str) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            let stored = {
                let users = self.users.read().await;
                users
                    .get(&normalize_username(&user.username))
                    .filter(|stored| stored.id == user.id)
                    .map(|stored| stored.password_hash.clone())
            };

            match stored {
                Some(hash) => self.hasher.verify(&hash, password).await,
                None => Ok(false),
            }
        })
    }

    fn ping(&self) -> StoreFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }

    fn kind(&self) -> &'static str {
        "memory"
    }
}
