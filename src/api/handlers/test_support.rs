use crate::{
    auth::AuthService,
    store::{MemoryStore, PasswordHasher, PasswordPolicy},
    token::{TokenConfig, TokenIssuer},
};
use anyhow::{Result, anyhow};
use argon2::Params;
use secrecy::SecretString;
use std::sync::Arc;

pub const TEST_SIGNING_KEY: &str = "0123456789abcdef0123456789abcdef";

/// Memory-backed service with cheap hashing parameters.
pub fn memory_service() -> Result<Arc<AuthService>> {
    let params = Params::new(8, 1, 1, None).map_err(|e| anyhow!(e))?;
    let store = MemoryStore::new(PasswordHasher::new(params), PasswordPolicy::default());
    let issuer = TokenIssuer::new(TokenConfig::new(SecretString::from(
        TEST_SIGNING_KEY.to_string(),
    )))?;
    Ok(Arc::new(AuthService::new(Arc::new(store), issuer)))
}
