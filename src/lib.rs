//! # Tessera
//!
//! `tessera` registers users, verifies their passwords, and issues short-lived
//! HS256 bearer tokens that carry the user's name and role.
//!
//! ## Flow
//!
//! 1. `POST /register` validates the username, optional email and password,
//!    hashes the password with Argon2id and stores the user.
//! 2. `POST /token` takes `[username, password]`, verifies it, and returns a
//!    signed JWT with `name` and `role` claims. Unknown users and wrong
//!    passwords get the same error.
//! 3. `GET /user/{id}` accepts `Authorization: Bearer <token>` and echoes the
//!    name from the token.
//!
//! Tokens are self-contained. There is no revocation or refresh; a token is
//! valid from `nbf` until `exp` and nothing can end it earlier.
//!
//! ## Storage
//!
//! Users live in `PostgreSQL` when a DSN is configured (schema in
//! `sql/schema.sql`, applied on startup), otherwise in memory.

pub mod api;
pub mod auth;
pub mod cli;
pub mod store;
pub mod token;
