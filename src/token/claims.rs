use serde::{Deserialize, Serialize};

/// Claim set carried by every access token.
///
/// `name` and `role` describe the user at issuance time; nothing re-reads the
/// store when the token is presented later.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub iss: String,
    pub aud: String,
    /// User id.
    pub sub: String,
    pub name: String,
    pub role: String,
    pub nbf: i64,
    pub iat: i64,
    pub exp: i64,
}
