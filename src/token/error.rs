use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("signing key must be at least 32 bytes")]
    KeyTooShort,
    #[error("token lifetime must be positive")]
    InvalidLifetime,
    #[error("failed to encode token")]
    Encode(#[source] jsonwebtoken::errors::Error),
    #[error("invalid token")]
    Invalid(#[source] jsonwebtoken::errors::Error),
    #[error("token not yet valid")]
    NotYetValid,
    #[error("token expired")]
    Expired,
}
