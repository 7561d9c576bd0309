//! Argon2id password hashing.
//!
//! Hashes are stored as PHC strings so parameters travel with each hash and
//! can be raised later without invalidating existing users. Both operations
//! are CPU bound and run on the blocking pool.

use super::StoreError;
use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher as _, PasswordVerifier, Version,
    password_hash::SaltString,
};
use rand::rngs::OsRng;
use tracing::{debug, error};

#[derive(Clone, Debug)]
pub struct PasswordHasher {
    params: Params,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl PasswordHasher {
    #[must_use]
    pub fn new(params: Params) -> Self {
        Self { params }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash `password` with a fresh random salt.
    ///
    /// # Errors
    /// Returns [`StoreError::Hash`] if Argon2 rejects the input.
    pub async fn hash(&self, password: &str) -> Result<String, StoreError> {
        let argon2 = self.argon2();
        let password = password.to_owned();

        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            argon2
                .hash_password(password.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| {
                    error!("Error hashing password: {}", e);
                    StoreError::Hash(e.to_string())
                })
        })
        .await?
    }

    /// Verify `password` against a stored PHC string.
    ///
    /// A mismatch is `Ok(false)`; only a malformed stored hash is an error.
    ///
    /// # Errors
    /// Returns [`StoreError::Hash`] if `hash` is not a valid PHC string.
    pub async fn verify(&self, hash: &str, password: &str) -> Result<bool, StoreError> {
        let argon2 = self.argon2();
        let hash = hash.to_owned();
        let password = password.to_owned();

        tokio::task::spawn_blocking(move || {
            let parsed = PasswordHash::new(&hash).map_err(|e| {
                error!("Stored password hash is malformed: {}", e);
                StoreError::Hash(e.to_string())
            })?;

            match argon2.verify_password(password.as_bytes(), &parsed) {
                Ok(()) => Ok(true),
                Err(e) => {
                    debug!("Password verification failed: {}", e);
                    Ok(false)
                }
            }
        })
        .await?
    }
}
