//! Database migration commands.
//!
//! Migrations live in `crates/server/migrations/` and are embedded at build
//! time with `sqlx::migrate!`. The server never migrates on startup; run this
//! before deploying a new version.
//!
//! # Environment Variables
//!
//! - `FOODGRAM_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

use thiserror::Error;

use super::{DATABASE_URL_VAR, connect, database_url};

/// Errors that can occur during migration.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration execution error.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Apply all pending migrations.
///
/// # Errors
///
/// Returns an error if the database URL is unset, the connection fails, or a
/// migration fails to apply.
pub async fn run() -> Result<(), MigrationError> {
    let url = database_url().ok_or(MigrationError::MissingEnvVar(DATABASE_URL_VAR))?;
    let pool = connect(&url).await?;

    let migrator = sqlx::migrate!("../server/migrations");
    tracing::info!(available = migrator.iter().count(), "Running migrations...");
    migrator.run(&pool).await?;

    tracing::info!("Migrations complete");
    Ok(())
}
