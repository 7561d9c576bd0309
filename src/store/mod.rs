//! Credential store: user records, password hashing and registration rules.
//!
//! The store is the only component that ever sees a password hash. Callers
//! look users up by name and ask the store to verify a password; they never
//! compare hashes themselves.
//!
//! Two backends implement [`CredentialStore`]:
//!
//! - [`MemoryStore`] keeps users in a process-local map, used when no DSN is
//!   configured and in tests.
//! - [`PgStore`] persists users in `PostgreSQL` (see `sql/schema.sql`).
//!
//! Usernames are unique case-insensitively: both backends key on
//! [`normalize_username`].

mod hasher;
mod memory;
mod postgres;
mod validation;

pub use hasher::PasswordHasher;
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use validation::{PasswordPolicy, ValidationError, validate_registration};

use serde::{Deserialize, Serialize};
use std::{future::Future, pin::Pin};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// Role assigned to every registered user.
pub const DEFAULT_ROLE: &str = "SimpleUser";

pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("validation failed")]
    Validation(Vec<ValidationError>),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Registration input.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl NewUser {
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: None,
        }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

#[derive(ToSchema, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: String,
    #[serde(skip)]
    pub(crate) password_hash: String,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("password_hash", &"***")
            .finish()
    }
}

/// Persistence for user accounts and password verification.
///
/// Implementations own their concurrency control: `create` must check for a
/// duplicate username and insert atomically.
pub trait CredentialStore: Send + Sync {
    /// Validate, hash and persist a new user.
    ///
    /// Fails with [`StoreError::Validation`] when the username, email or
    /// password break the registration rules, or the username is taken.
    fn create<'a>(&'a self, user: NewUser, password: &'a str) -> StoreFuture<'a, User>;

    /// Case-insensitive lookup by username.
    fn find_by_name<'a>(&'a self, username: &'a str) -> StoreFuture<'a, Option<User>>;

    /// Check `password` against the stored hash of `user`.
    fn verify_password<'a>(&'a self, user: &'a User, password: &'a str) -> StoreFuture<'a, bool>;

    /// Cheap liveness probe used by `/health`.
    fn ping(&self) -> StoreFuture<'_, ()>;

    /// Backend name reported by `/health`.
    fn kind(&self) -> &'static str;
}

/// Normalized form used for uniqueness and lookups.
#[must_use]
pub fn normalize_username(username: &str) -> String {
    username.to_lowercase()
}
