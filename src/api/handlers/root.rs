use crate::api::GIT_COMMIT_HASH;

/// Plain-text banner served at `/`.
pub async fn root() -> String {
    banner()
}

fn banner() -> String {
    let short_hash = GIT_COMMIT_HASH.get(..7).unwrap_or(GIT_COMMIT_HASH);
    format!(
        "{} {} - {}\n",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        short_hash
    )
}
