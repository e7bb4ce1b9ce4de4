//! Reference data import.
//!
//! Tags and ingredients are never created through the API. They are loaded
//! from JSON files shaped like:
//!
//! ```json
//! [{"name": "flour", "measurement_unit": "g"}]
//! [{"name": "Breakfast", "slug": "breakfast"}]
//! ```
//!
//! Ingredients may also come from a header-less CSV file with one
//! `name,measurement_unit` pair per line.
//!
//! Rows whose name (or tag slug) already exists are skipped, so re-running an
//! import is safe. Rows that would violate column limits are skipped with a
//! warning instead of aborting the whole file.

use std::path::Path;

use clap::ValueEnum;

use foodgram_server::db::RepositoryError;
use foodgram_server::db::ingredients::IngredientRepository;
use foodgram_server::db::tags::TagRepository;
use serde::Deserialize;
use thiserror::Error;

use super::{DATABASE_URL_VAR, connect, database_url};

const MAX_INGREDIENT_NAME: usize = 128;
const MAX_UNIT: usize = 64;
const MAX_TAG_FIELD: usize = 32;

/// Errors that can occur during import.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// The input file could not be read.
    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// The input file is not the expected JSON shape.
    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    /// Insert failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),
}

/// Input file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    Json,
    Csv,
}

impl InputFormat {
    /// `csv` for `*.csv` files, JSON otherwise.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Self::Csv,
            _ => Self::Json,
        }
    }
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
struct IngredientRecord {
    name: String,
    measurement_unit: String,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
struct TagRecord {
    name: String,
    slug: String,
}

/// Outcome of one import run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub inserted: usize,
    pub existing: usize,
    pub rejected: usize,
}

impl IngredientRecord {
    fn normalized(self) -> Result<(String, String), String> {
        let name = self.name.trim();
        let unit = self.measurement_unit.trim();
        if name.is_empty() || unit.is_empty() {
            return Err("name and measurement_unit are required".to_owned());
        }
        if name.chars().count() > MAX_INGREDIENT_NAME {
            return Err(format!("name longer than {MAX_INGREDIENT_NAME} characters"));
        }
        if unit.chars().count() > MAX_UNIT {
            return Err(format!("measurement_unit longer than {MAX_UNIT} characters"));
        }
        Ok((name.to_owned(), unit.to_owned()))
    }
}

impl TagRecord {
    fn normalized(self) -> Result<(String, String), String> {
        let name = self.name.trim();
        let slug = self.slug.trim();
        if name.is_empty() || slug.is_empty() {
            return Err("name and slug are required".to_owned());
        }
        if name.chars().count() > MAX_TAG_FIELD || slug.len() > MAX_TAG_FIELD {
            return Err(format!("name and slug are limited to {MAX_TAG_FIELD} characters"));
        }
        if !slug
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_'))
        {
            return Err(format!("slug {slug:?} may only contain letters, digits, '-' and '_'"));
        }
        Ok((name.to_owned(), slug.to_owned()))
    }
}

fn parse_records<T: for<'de> Deserialize<'de>>(path: &Path, raw: &str) -> Result<Vec<T>, ImportError> {
    serde_json::from_str(raw).map_err(|source| ImportError::Json {
        path: path.display().to_string(),
        source,
    })
}

/// Rows of a header-less `name,measurement_unit` CSV file.
///
/// Rows that cannot be read are returned as rejection reasons so that one bad
/// line does not abort the import.
fn parse_ingredient_csv(raw: &str) -> Vec<Result<IngredientRecord, String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(raw.as_bytes());

    reader
        .records()
        .map(|row| {
            let row = row.map_err(|e| e.to_string())?;
            match (row.get(0), row.get(1)) {
                (Some(name), Some(unit)) => Ok(IngredientRecord {
                    name: name.to_owned(),
                    measurement_unit: unit.to_owned(),
                }),
                _ => Err(format!("expected name and measurement_unit, got {} field(s)", row.len())),
            }
        })
        .collect()
}

async fn read_file(path: &Path) -> Result<String, ImportError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ImportError::Io {
            path: path.display().to_string(),
            source,
        })
}

/// Import ingredients from `path` in the given format.
///
/// # Errors
///
/// Returns an error if the file is unreadable or not a JSON array, or if the
/// database rejects an insert for reasons other than a duplicate name.
pub async fn ingredients(path: &Path, format: InputFormat) -> Result<ImportSummary, ImportError> {
    let raw = read_file(path).await?;
    let records: Vec<Result<IngredientRecord, String>> = match format {
        InputFormat::Json => parse_records::<IngredientRecord>(path, &raw)?
            .into_iter()
            .map(Ok)
            .collect(),
        InputFormat::Csv => parse_ingredient_csv(&raw),
    };
    tracing::info!(rows = records.len(), file = %path.display(), ?format, "Importing ingredients");

    let url = database_url().ok_or(ImportError::MissingEnvVar(DATABASE_URL_VAR))?;
    let pool = connect(&url).await?;
    let repo = IngredientRepository::new(&pool);

    let mut summary = ImportSummary::default();
    for (index, record) in records.into_iter().enumerate() {
        match record.and_then(IngredientRecord::normalized) {
            Ok((name, unit)) => {
                if repo.insert_if_absent(&name, &unit).await? {
                    summary.inserted += 1;
                } else {
                    summary.existing += 1;
                }
            }
            Err(reason) => {
                tracing::warn!(row = index, %reason, "Skipping ingredient");
                summary.rejected += 1;
            }
        }
    }

    log_summary("ingredients", summary);
    Ok(summary)
}

/// Import tags from `path`.
///
/// # Errors
///
/// Returns an error if the file is unreadable or malformed, or if the
/// database rejects an insert for reasons other than a duplicate.
pub async fn tags(path: &Path) -> Result<ImportSummary, ImportError> {
    let records: Vec<TagRecord> = parse_records(path, &read_file(path).await?)?;
    tracing::info!(rows = records.len(), file = %path.display(), "Importing tags");

    let url = database_url().ok_or(ImportError::MissingEnvVar(DATABASE_URL_VAR))?;
    let pool = connect(&url).await?;
    let repo = TagRepository::new(&pool);

    let mut summary = ImportSummary::default();
    for (index, record) in records.into_iter().enumerate() {
        match record.normalized() {
            Ok((name, slug)) => {
                if repo.insert_if_absent(&name, &slug).await? {
                    summary.inserted += 1;
                } else {
                    summary.existing += 1;
                }
            }
            Err(reason) => {
                tracing::warn!(row = index, %reason, "Skipping tag");
                summary.rejected += 1;
            }
        }
    }

    log_summary("tags", summary);
    Ok(summary)
}

fn log_summary(what: &str, summary: ImportSummary) {
    tracing::info!(
        inserted = summary.inserted,
        skipped = summary.existing,
        rejected = summary.rejected,
        "Imported {what}"
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ingredients() {
        let raw = r#"[
            {"name": "мука", "measurement_unit": "г"},
            {"name": " eggs ", "measurement_unit": "шт"}
        ]"#;
        let records: Vec<IngredientRecord> = parse_records(Path::new("i.json"), raw).unwrap();
        assert_eq!(records.len(), 2);

        let normalized: Vec<_> = records
            .into_iter()
            .map(|r| r.normalized().unwrap())
            .collect();
        assert_eq!(normalized[1], ("eggs".to_owned(), "шт".to_owned()));
    }

    #[test]
    fn test_parse_ingredient_csv() {
        let raw = "абрикосовое варенье,г\n\"соль, крупная\", щепотка\nлук\n";

        let rows = parse_ingredient_csv(raw);
        assert_eq!(rows.len(), 3);

        let first = rows[0].as_ref().unwrap();
        assert_eq!(first.name, "абрикосовое варенье");
        assert_eq!(first.measurement_unit, "г");

        let normalized = rows
            .into_iter()
            .map(|row| row.and_then(IngredientRecord::normalized))
            .collect::<Vec<_>>();
        assert_eq!(
            normalized[1],
            Ok(("соль, крупная".to_owned(), "щепотка".to_owned()))
        );
        assert!(normalized[2].as_ref().unwrap_err().contains("1 field"));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(InputFormat::from_path(Path::new("data/ingredients.csv")), InputFormat::Csv);
        assert_eq!(InputFormat::from_path(Path::new("data/INGREDIENTS.CSV")), InputFormat::Csv);
        assert_eq!(InputFormat::from_path(Path::new("data/ingredients.json")), InputFormat::Json);
        assert_eq!(InputFormat::from_path(Path::new("ingredients")), InputFormat::Json);
    }

    #[test]
    fn test_parse_rejects_wrong_shape() {
        let err = parse_records::<IngredientRecord>(Path::new("i.json"), r#"{"name": "x"}"#)
            .unwrap_err();
        assert!(matches!(err, ImportError::Json { .. }));
        assert!(err.to_string().starts_with("Invalid JSON in i.json"));

        let err = parse_records::<TagRecord>(Path::new("t.json"), r#"[{"name": "Lunch"}]"#)
            .unwrap_err();
        assert!(err.to_string().contains("slug"));
    }

    #[test]
    fn test_ingredient_limits() {
        let blank = IngredientRecord {
            name: "  ".to_owned(),
            measurement_unit: "g".to_owned(),
        };
        assert!(blank.normalized().is_err());

        let long = IngredientRecord {
            name: "x".repeat(MAX_INGREDIENT_NAME + 1),
            measurement_unit: "g".to_owned(),
        };
        assert!(long.normalized().is_err());

        // limits count characters, not bytes
        let cyrillic = IngredientRecord {
            name: "щ".repeat(MAX_INGREDIENT_NAME),
            measurement_unit: "г".to_owned(),
        };
        assert!(cyrillic.normalized().is_ok());
    }

    #[test]
    fn test_tag_slug_format() {
        let ok = TagRecord {
            name: "Завтрак".to_owned(),
            slug: "breakfast_1".to_owned(),
        };
        assert_eq!(
            ok.normalized().unwrap(),
            ("Завтрак".to_owned(), "breakfast_1".to_owned())
        );

        let bad = TagRecord {
            name: "Lunch".to_owned(),
            slug: "lunch time".to_owned(),
        };
        assert!(bad.normalized().unwrap_err().contains("may only contain"));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = ingredients(Path::new("/nonexistent/ingredients.csv"), InputFormat::Csv)
            .await
            .unwrap_err();
        assert!(matches!(err, ImportError::Io { .. }));
    }
}
