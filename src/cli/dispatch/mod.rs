//! Map validated CLI arguments to the action to run.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{self, store, token};
use anyhow::Result;

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches
        .get_one::<u16>(commands::ARG_PORT)
        .copied()
        .unwrap_or(8080);

    let store_opts = store::Options::parse(matches)?;
    let token_opts = token::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn: store_opts.dsn,
        password_min_length: store_opts.password_min_length,
        jwt_signing_key: token_opts.signing_key,
        jwt_issuer: token_opts.issuer,
        jwt_audience: token_opts.audience,
        jwt_lifetime_minutes: token_opts.lifetime_minutes,
    }))
}
