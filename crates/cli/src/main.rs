//! Foodgram CLI - Database migrations and reference data import.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! foodgram-cli migrate
//!
//! # Load the ingredient catalogue
//! foodgram-cli import ingredients data/ingredients.json
//! foodgram-cli import ingredients data/ingredients.csv
//!
//! # Load recipe tags
//! foodgram-cli import tags data/tags.json
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `import ingredients` - Bulk-load ingredients (`{name, measurement_unit}`
//!   JSON, or `name,measurement_unit` CSV)
//! - `import tags` - Bulk-load tags (`{name, slug}`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

use commands::import::InputFormat;

#[derive(Parser)]
#[command(name = "foodgram-cli")]
#[command(author, version, about = "Foodgram CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Import reference data from a file
    Import {
        #[command(subcommand)]
        kind: ImportKind,
    },
}

#[derive(Subcommand)]
enum ImportKind {
    /// Import ingredients from a JSON array of `{name, measurement_unit}`
    /// or a header-less `name,measurement_unit` CSV file
    Ingredients {
        /// Path to the JSON or CSV file
        path: PathBuf,
        /// File format (default: guessed from the extension)
        #[arg(long, value_enum)]
        format: Option<InputFormat>,
    },
    /// Import tags from a JSON array of `{name, slug}`
    Tags {
        /// Path to the JSON file
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Import { kind } => match kind {
            ImportKind::Ingredients { path, format } => {
                let format = format.unwrap_or_else(|| InputFormat::from_path(&path));
                commands::import::ingredients(&path, format).await?;
            }
            ImportKind::Tags { path } => {
                commands::import::tags(&path).await?;
            }
        },
    }
    Ok(())
}
