use crate::{
    store::{StoreError, ValidationError},
    token::TokenError,
};
use thiserror::Error;

pub const INVALID_CREDENTIALS: &str = "Invalid username or password.";

#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown user or wrong password. The two are deliberately not told apart.
    #[error("Invalid username or password.")]
    InvalidCredentials,
    #[error("validation failed")]
    ValidationFailed(Vec<ValidationError>),
    #[error("unauthorized")]
    Unauthorized,
    #[error("credential store error")]
    Store(#[source] StoreError),
    #[error("token error")]
    Token(#[source] TokenError),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(errors) => Self::ValidationFailed(errors),
            other => Self::Store(other),
        }
    }
}
