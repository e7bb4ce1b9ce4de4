//! Subcommand implementations.

pub mod import;
pub mod migrate;

use secrecy::SecretString;
use sqlx::PgPool;

/// Environment variable holding the database URL.
pub const DATABASE_URL_VAR: &str = "FOODGRAM_DATABASE_URL";

/// Read the database URL, falling back to the generic `DATABASE_URL`.
///
/// Loads `.env` first so the CLI sees the same settings as the server.
pub fn database_url() -> Option<SecretString> {
    dotenvy::dotenv().ok();
    std::env::var(DATABASE_URL_VAR)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .filter(|url| !url.trim().is_empty())
        .map(SecretString::from)
}

/// Open a connection pool.
///
/// # Errors
///
/// Returns `sqlx::Error` if the database is unreachable.
pub async fn connect(url: &SecretString) -> Result<PgPool, sqlx::Error> {
    tracing::info!("Connecting to database...");
    foodgram_server::db::create_pool(url).await
}
