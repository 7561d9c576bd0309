//! Route handlers for tessera.
//!
//! Handlers receive the shared [`crate::auth::AuthService`] through an
//! `Extension` layer and translate its results into HTTP responses.

pub mod health;
pub mod principal;
pub mod register;
pub mod root;
pub mod token;
pub mod types;
pub mod user;

#[cfg(test)]
pub(crate) mod test_support;
