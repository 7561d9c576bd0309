use crate::{
    api,
    auth::AuthService,
    store::{CredentialStore, MemoryStore, PasswordHasher, PasswordPolicy, PgStore},
    token::{TokenConfig, TokenIssuer},
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: Option<String>,
    pub password_min_length: usize,
    pub jwt_signing_key: SecretString,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub jwt_lifetime_minutes: u64,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the token configuration is invalid, the database is
/// unreachable, or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let issuer = TokenIssuer::new(
        TokenConfig::new(args.jwt_signing_key)
            .with_issuer(args.jwt_issuer)
            .with_audience(args.jwt_audience)
            .with_lifetime_minutes(args.jwt_lifetime_minutes),
    )
    .context("Invalid access token configuration")?;

    let hasher = PasswordHasher::default();
    let policy = PasswordPolicy::default().with_required_length(args.password_min_length);

    let store: Arc<dyn CredentialStore> = if let Some(dsn) = &args.dsn {
        let store = PgStore::connect(dsn, hasher, policy)
            .await
            .context("Failed to connect to database")?;
        store
            .migrate()
            .await
            .context("Failed to apply database schema")?;
        Arc::new(store)
    } else {
        warn!("No DSN configured, users are kept in memory and lost on exit");
        Arc::new(MemoryStore::new(hasher, policy))
    };

    let service = Arc::new(AuthService::new(store, issuer));

    api::new(args.port, service).await
}

fn log_startup_args(args: &Args) {
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        (
            "store",
            args.dsn
                .as_deref()
                .map_or_else(|| "memory".to_string(), redact_dsn),
        ),
        ("jwt_issuer", args.jwt_issuer.clone()),
        ("jwt_audience", args.jwt_audience.clone()),
        (
            "jwt_lifetime",
            format!("{} minutes", args.jwt_lifetime_minutes),
        ),
        ("password_min_length", args.password_min_length.to_string()),
    ];

    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!(
        "{} {} - {}\n\nStartup configuration:",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        short_commit(api::GIT_COMMIT_HASH)
    );
    for (key, value) in entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}

fn redact_dsn(dsn: &str) -> String {
    match Url::parse(dsn) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("REDACTED"));
            }
            parsed.to_string()
        }
        Err(_) => "invalid-dsn".to_string(),
    }
}

fn short_commit(hash: &str) -> &str {
    let trimmed = hash.trim();
    trimmed.get(..7).unwrap_or(trimmed)
}
