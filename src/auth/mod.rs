//! Registration, token issuance and bearer-token authentication.
//!
//! Flow overview for `issue_token`: look the user up by name, verify the
//! password, build the claim set from the stored user, sign it. An unknown
//! user and a wrong password produce the same [`AuthError::InvalidCredentials`]
//! so callers cannot probe which usernames exist.

mod error;

pub use error::{AuthError, INVALID_CREDENTIALS};

use crate::{
    store::{CredentialStore, NewUser, User},
    token::{Claims, TokenIssuer, now_unix_seconds},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, instrument};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub access_token: String,
    pub username: String,
}

/// Identity asserted by a verified bearer token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    pub username: String,
    pub role: String,
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.name,
            role: claims.role,
        }
    }
}

pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    issuer: TokenIssuer,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("store", &self.store.kind())
            .field("issuer", &self.issuer)
            .finish()
    }
}

impl AuthService {
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>, issuer: TokenIssuer) -> Self {
        Self { store, issuer }
    }

    #[must_use]
    pub fn store(&self) -> &dyn CredentialStore {
        self.store.as_ref()
    }

    #[must_use]
    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Register a user. Validation and duplicate errors come back as
    /// [`AuthError::ValidationFailed`] with the store's error list unchanged.
    ///
    /// # Errors
    /// [`AuthError::ValidationFailed`] or [`AuthError::Store`].
    #[instrument(skip(self, password))]
    pub async fn register(&self, user: NewUser, password: &str) -> Result<User, AuthError> {
        let created = self.store.create(user, password).await?;

        debug!("Registered user {}", created.id);

        Ok(self
            .store
            .find_by_name(&created.username)
            .await?
            .unwrap_or(created))
    }

    /// Authenticate `username`/`password` and mint an access token.
    ///
    /// # Errors
    /// [`AuthError::InvalidCredentials`] for an unknown user or wrong password;
    /// [`AuthError::Store`] or [`AuthError::Token`] for internal failures.
    pub async fn issue_token(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AccessToken, AuthError> {
        self.issue_token_at(username, password, now_unix_seconds())
            .await
    }

    /// [`Self::issue_token`] with an explicit issuance time (unix seconds).
    ///
    /// # Errors
    /// See [`Self::issue_token`].
    #[instrument(skip(self, password))]
    pub async fn issue_token_at(
        &self,
        username: &str,
        password: &str,
        now: i64,
    ) -> Result<AccessToken, AuthError> {
        // Unknown users skip the hash, so only the error text matches a wrong password.
        let Some(user) = self.store.find_by_name(username).await? else {
            debug!("User not found");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.store.verify_password(&user, password).await? {
            debug!("Password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let access_token = self.issuer.issue(&user, now).map_err(|e| {
            error!("Error signing token: {:?}", e);
            AuthError::Token(e)
        })?;

        debug!("Token issued");

        Ok(AccessToken {
            access_token,
            username: user.username,
        })
    }

    /// Resolve a bearer token to the identity it asserts.
    ///
    /// # Errors
    /// [`AuthError::Unauthorized`] for any invalid, expired or foreign token.
    pub fn authenticate(&self, token: &str) -> Result<Principal, AuthError> {
        self.authenticate_at(token, now_unix_seconds())
    }

    /// [`Self::authenticate`] at an explicit time (unix seconds).
    ///
    /// # Errors
    /// See [`Self::authenticate`].
    pub fn authenticate_at(&self, token: &str, now: i64) -> Result<Principal, AuthError> {
        self.issuer
            .verify(token, now)
            .map(Principal::from)
            .map_err(|e| {
                debug!("Token rejected: {}", e);
                AuthError::Unauthorized
            })
    }
}
