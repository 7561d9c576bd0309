//! HS256 access tokens.
//!
//! Tokens are compact JWS strings signed with a single symmetric key. They are
//! self-contained: verification needs only the key, the expected issuer and
//! audience, and the current time. Expiry is the only way a token stops being
//! valid.

mod claims;
mod error;

pub use claims::Claims;
pub use error::TokenError;

use crate::store::User;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const MIN_KEY_BYTES: usize = 32;
const DEFAULT_ISSUER: &str = "tessera";
const DEFAULT_AUDIENCE: &str = "tessera";
const DEFAULT_LIFETIME_MINUTES: u64 = 60;

#[derive(Clone)]
pub struct TokenConfig {
    signing_key: SecretString,
    issuer: String,
    audience: String,
    lifetime: Duration,
}

impl TokenConfig {
    #[must_use]
    pub fn new(signing_key: SecretString) -> Self {
        Self {
            signing_key,
            issuer: DEFAULT_ISSUER.to_string(),
            audience: DEFAULT_AUDIENCE.to_string(),
            lifetime: Duration::from_secs(DEFAULT_LIFETIME_MINUTES * 60),
        }
    }

    #[must_use]
    pub fn with_issuer(mut self, issuer: String) -> Self {
        self.issuer = issuer;
        self
    }

    #[must_use]
    pub fn with_audience(mut self, audience: String) -> Self {
        self.audience = audience;
        self
    }

    #[must_use]
    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    #[must_use]
    pub fn with_lifetime_minutes(self, minutes: u64) -> Self {
        self.with_lifetime(Duration::from_secs(minutes.saturating_mul(60)))
    }

    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    #[must_use]
    pub fn audience(&self) -> &str {
        &self.audience
    }

    #[must_use]
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("signing_key", &"***")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

/// Signs and verifies access tokens for one key, issuer and audience.
pub struct TokenIssuer {
    issuer: String,
    audience: String,
    lifetime_seconds: i64,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenIssuer {
    /// # Errors
    /// Returns [`TokenError::KeyTooShort`] for keys under 32 bytes and
    /// [`TokenError::InvalidLifetime`] for a zero or oversized lifetime.
    pub fn new(config: TokenConfig) -> Result<Self, TokenError> {
        let key = config.signing_key.expose_secret().as_bytes();
        if key.len() < MIN_KEY_BYTES {
            return Err(TokenError::KeyTooShort);
        }

        let lifetime_seconds = i64::try_from(config.lifetime.as_secs())
            .ok()
            .filter(|seconds| *seconds > 0)
            .ok_or(TokenError::InvalidLifetime)?;

        // Time claims are checked against an explicit clock in `verify`, so
        // jsonwebtoken only handles the signature, algorithm, iss and aud.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[config.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "aud", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(key),
            decoding_key: DecodingKey::from_secret(key),
            issuer: config.issuer,
            audience: config.audience,
            lifetime_seconds,
            validation,
        })
    }

    #[must_use]
    pub fn lifetime_seconds(&self) -> i64 {
        self.lifetime_seconds
    }

    /// Build the claim set for `user`, valid from `now` for the configured lifetime.
    #[must_use]
    pub fn claims_for(&self, user: &User, now: i64) -> Claims {
        Claims {
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            sub: user.id.to_string(),
            name: user.username.clone(),
            role: user.role.clone(),
            nbf: now,
            iat: now,
            exp: now.saturating_add(self.lifetime_seconds),
        }
    }

    /// Sign a token for `user` issued at `now` (unix seconds).
    ///
    /// # Errors
    /// Returns [`TokenError::Encode`] if serialization or signing fails.
    pub fn issue(&self, user: &User, now: i64) -> Result<String, TokenError> {
        let claims = self.claims_for(user, now);
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(TokenError::Encode)
    }

    /// Verify `token` at `now` (unix seconds) and return its claims.
    ///
    /// The token is valid on `[nbf, exp)`, with no leeway.
    ///
    /// # Errors
    /// - [`TokenError::Invalid`] for malformed tokens, bad signatures, other
    ///   algorithms, or a foreign issuer/audience.
    /// - [`TokenError::NotYetValid`] when `now < nbf`.
    /// - [`TokenError::Expired`] when `now >= exp`.
    pub fn verify(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(TokenError::Invalid)?;
        let claims = data.claims;

        if now < claims.nbf {
            return Err(TokenError::NotYetValid);
        }

        if now >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("lifetime_seconds", &self.lifetime_seconds)
            .finish_non_exhaustive()
    }
}

/// Current time as unix seconds.
#[must_use]
pub fn now_unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| {
            i64::try_from(duration.as_secs()).unwrap_or(i64::MAX)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::DEFAULT_ROLE;
    use anyhow::{Result, anyhow};
    use uuid::Uuid;

    const KEY: &str = "0123456789abcdef0123456789abcdef";
    const T: i64 = 1_700_000_000;

    fn user(name: &str) -> User {
        User {
            id: Uuid::new_v4(),
            username: name.to_string(),
            email: None,
            role: DEFAULT_ROLE.to_string(),
            password_hash: String::new(),
        }
    }

    fn config(key: &str) -> TokenConfig {
        TokenConfig::new(SecretString::from(key.to_string()))
            .with_issuer("https://tessera.test".to_string())
            .with_audience("tessera-clients".to_string())
            .with_lifetime_minutes(5)
    }

    fn issuer() -> Result<TokenIssuer> {
        TokenIssuer::new(config(KEY)).map_err(|e| anyhow!(e))
    }

    #[test]
    fn short_key_is_rejected() {
        let result = TokenIssuer::new(config("too-short"));
        assert!(matches!(result, Err(TokenError::KeyTooShort)));
    }

    #[test]
    fn zero_lifetime_is_rejected() {
        let result = TokenIssuer::new(config(KEY).with_lifetime(Duration::ZERO));
        assert!(matches!(result, Err(TokenError::InvalidLifetime)));
    }

    #[test]
    fn defaults() {
        let config = TokenConfig::new(SecretString::from(KEY.to_string()));
        assert_eq!(config.issuer(), "tessera");
        assert_eq!(config.audience(), "tessera");
        assert_eq!(config.lifetime(), Duration::from_secs(3600));
        assert!(!format!("{config:?}").contains(KEY));
    }

    #[test]
    fn issued_token_carries_identity_claims() -> Result<()> {
        let issuer = issuer()?;
        let alice = user("alice");
        let token = issuer.issue(&alice, T)?;
        assert_eq!(token.split('.').count(), 3);

        let claims = issuer.verify(&token, T)?;
        assert_eq!(claims.name, "alice");
        assert_eq!(claims.role, "SimpleUser");
        assert_eq!(claims.sub, alice.id.to_string());
        assert_eq!(claims.iss, "https://tessera.test");
        assert_eq!(claims.aud, "tessera-clients");
        assert_eq!(claims.nbf, T);
        assert_eq!(claims.iat, T);
        assert_eq!(claims.exp, T + 300);
        Ok(())
    }

    #[test]
    fn expiry_boundary() -> Result<()> {
        let issuer = issuer()?;
        let token = issuer.issue(&user("alice"), T)?;
        let lifetime = issuer.lifetime_seconds();

        assert!(issuer.verify(&token, T + lifetime - 1).is_ok());
        assert!(matches!(
            issuer.verify(&token, T + lifetime),
            Err(TokenError::Expired)
        ));
        assert!(matches!(
            issuer.verify(&token, T + lifetime + 1),
            Err(TokenError::Expired)
        ));
        Ok(())
    }

    #[test]
    fn not_yet_valid_before_nbf() -> Result<()> {
        let issuer = issuer()?;
        let token = issuer.issue(&user("alice"), T)?;
        assert!(matches!(
            issuer.verify(&token, T - 1),
            Err(TokenError::NotYetValid)
        ));
        Ok(())
    }

    #[test]
    fn other_key_is_rejected() -> Result<()> {
        let other = TokenIssuer::new(config("fedcba9876543210fedcba9876543210"))?;
        let token = other.issue(&user("alice"), T)?;
        assert!(matches!(
            issuer()?.verify(&token, T),
            Err(TokenError::Invalid(_))
        ));
        Ok(())
    }

    #[test]
    fn foreign_issuer_or_audience_is_rejected() -> Result<()> {
        let foreign_iss =
            TokenIssuer::new(config(KEY).with_issuer("https://evil.test".to_string()))?;
        let token = foreign_iss.issue(&user("alice"), T)?;
        assert!(matches!(
            issuer()?.verify(&token, T),
            Err(TokenError::Invalid(_))
        ));

        let foreign_aud = TokenIssuer::new(config(KEY).with_audience("someone-else".to_string()))?;
        let token = foreign_aud.issue(&user("alice"), T)?;
        assert!(matches!(
            issuer()?.verify(&token, T),
            Err(TokenError::Invalid(_))
        ));
        Ok(())
    }

    #[test]
    fn tampered_payload_is_rejected() -> Result<()> {
        let issuer = issuer()?;
        let token = issuer.issue(&user("alice"), T)?;
        let forged_claims = issuer.claims_for(&user("mallory"), T);
        let forged_payload = encode(
            &Header::new(Algorithm::HS256),
            &forged_claims,
            &EncodingKey::from_secret(b"fedcba9876543210fedcba9876543210"),
        )?;

        let mut parts: Vec<&str> = token.split('.').collect();
        let forged_parts: Vec<&str> = forged_payload.split('.').collect();
        parts[1] = forged_parts[1];
        let tampered = parts.join(".");

        assert!(matches!(
            issuer.verify(&tampered, T),
            Err(TokenError::Invalid(_))
        ));
        Ok(())
    }

    #[test]
    fn garbage_is_rejected() -> Result<()> {
        assert!(matches!(
            issuer()?.verify("not.a.token", T),
            Err(TokenError::Invalid(_))
        ));
        assert!(matches!(
            issuer()?.verify("", T),
            Err(TokenError::Invalid(_))
        ));
        Ok(())
    }

    #[test]
    fn now_is_after_2020() {
        assert!(now_unix_seconds() > 1_577_836_800);
    }
}
