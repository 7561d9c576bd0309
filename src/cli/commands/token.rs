use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_JWT_SIGNING_KEY: &str = "jwt-signing-key";
pub const ARG_JWT_ISSUER: &str = "jwt-issuer";
pub const ARG_JWT_AUDIENCE: &str = "jwt-audience";
pub const ARG_JWT_LIFETIME_MINUTES: &str = "jwt-lifetime-minutes";

#[derive(Debug, Clone)]
pub struct Options {
    pub signing_key: SecretString,
    pub issuer: String,
    pub audience: String,
    pub lifetime_minutes: u64,
}

impl Options {
    /// Parse access token arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the signing key is missing or blank.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let signing_key = match matches.get_one::<String>(ARG_JWT_SIGNING_KEY) {
            Some(value) if !value.trim().is_empty() => SecretString::from(value.clone()),
            _ => anyhow::bail!("missing required argument: --{ARG_JWT_SIGNING_KEY}"),
        };

        let get_or = |id: &str, default: &str| {
            matches
                .get_one::<String>(id)
                .cloned()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Ok(Self {
            signing_key,
            issuer: get_or(ARG_JWT_ISSUER, "tessera"),
            audience: get_or(ARG_JWT_AUDIENCE, "tessera"),
            lifetime_minutes: matches
                .get_one::<u64>(ARG_JWT_LIFETIME_MINUTES)
                .copied()
                .unwrap_or(60),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_JWT_SIGNING_KEY)
                .long(ARG_JWT_SIGNING_KEY)
                .help("HS256 signing key for access tokens (at least 32 bytes)")
                .env("TESSERA_JWT_SIGNING_KEY")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_JWT_ISSUER)
                .long(ARG_JWT_ISSUER)
                .help("Issuer (iss) written to and expected in access tokens")
                .default_value("tessera")
                .env("TESSERA_JWT_ISSUER"),
        )
        .arg(
            Arg::new(ARG_JWT_AUDIENCE)
                .long(ARG_JWT_AUDIENCE)
                .help("Audience (aud) written to and expected in access tokens")
                .default_value("tessera")
                .env("TESSERA_JWT_AUDIENCE"),
        )
        .arg(
            Arg::new(ARG_JWT_LIFETIME_MINUTES)
                .long(ARG_JWT_LIFETIME_MINUTES)
                .help("Access token lifetime in minutes")
                .default_value("60")
                .env("TESSERA_JWT_LIFETIME_MINUTES")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}
