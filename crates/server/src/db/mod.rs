//! Database operations for Foodgram `PostgreSQL`.
//!
//! ## Tables
//!
//! - `users`, `auth_tokens` - Accounts and API tokens
//! - `tags`, `ingredients` - Reference data (imported via the CLI)
//! - `recipes`, `recipe_tags`, `recipe_ingredients` - Recipes and their relations
//! - `favorites`, `shopping_cart` - Per-user recipe lists
//! - `follows` - Subscriptions between users
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p foodgram-cli -- migrate
//! ```

pub mod follows;
pub mod ingredients;
pub mod recipes;
pub mod tags;
pub mod tokens;
pub mod user_recipes;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map unique violations to [`RepositoryError::Conflict`].
///
/// `describe` receives the violated constraint name, if the driver reports one.
pub(crate) fn map_unique_violation(
    e: sqlx::Error,
    describe: impl FnOnce(Option<&str>) -> String,
) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(describe(db_err.constraint()));
    }
    RepositoryError::Database(e)
}

/// Escape `%`, `_` and `\` so user input matches literally inside `LIKE`.
#[must_use]
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("salt"), "salt");
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }
}
