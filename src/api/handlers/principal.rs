//! Bearer token extraction.
//!
//! Flow Overview: read `Authorization: Bearer <token>`, verify the token, and
//! return the principal it names. Every failure is a bare 401 with a
//! `WWW-Authenticate: Bearer` challenge; the reason is only logged.

use crate::auth::{AuthService, Principal};
use axum::{
    http::{
        HeaderMap, StatusCode,
        header::{AUTHORIZATION, WWW_AUTHENTICATE},
    },
    response::{IntoResponse, Response},
};
use tracing::debug;

/// Resolve the bearer token in `headers`, or return a 401 response.
pub fn require_auth(headers: &HeaderMap, service: &AuthService) -> Result<Principal, Response> {
    let Some(token) = bearer_token(headers) else {
        debug!("Missing bearer token");
        return Err(unauthorized());
    };

    service.authenticate(token).map_err(|_| unauthorized())
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    if token.is_empty() { None } else { Some(token) }
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, [(WWW_AUTHENTICATE, "Bearer")]).into_response()
}
