//! Import delivery prices from CSV files.
//!
//! Every `*.csv` file in the directory is read in name order. Files have a
//! `Postcode,Economy,Premium` header. Rows with a blank postcode or a price
//! that is not a number are skipped and written to `invalid_<file>.json`
//! beside the input. Valid rows of one file are upserted in one transaction;
//! a file that fails is logged and the import moves on.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use tracing::{error, info, warn};

use flagstone_core::Postcode;
use flagstone_delivery::db::{self, PostcodePrice, PostcodeRepository};

use super::database_url;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("{0}")]
    MissingEnvVar(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A CSV row as written, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    #[serde(rename = "Postcode", default)]
    pub postcode: String,
    #[serde(rename = "Economy", default)]
    pub economy: String,
    #[serde(rename = "Premium", default)]
    pub premium: String,
}

/// A rejected row and why it was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidRow {
    /// 1-based line in the file, counting the header.
    pub line: u64,
    pub reason: String,
    #[serde(flatten)]
    pub row: RawRow,
}

/// The rows of one file, split by validity.
#[derive(Debug, Default)]
pub struct ParsedFile {
    pub valid: Vec<PostcodePrice>,
    pub invalid: Vec<InvalidRow>,
}

/// Totals over a whole import.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub files: usize,
    pub failed_files: usize,
    pub imported: u64,
    pub invalid: usize,
}

/// Import every CSV file in `dir`.
///
/// # Errors
///
/// Returns `ImportError` if the directory cannot be listed or the database
/// is unreachable. Errors in individual files are logged, not returned.
pub async fn run(dir: &Path) -> Result<ImportSummary, ImportError> {
    let url = database_url("DELIVERY_DATABASE_URL").map_err(ImportError::MissingEnvVar)?;
    let files = csv_files(dir)?;
    info!(dir = %dir.display(), files = files.len(), "Importing postcode prices");

    let pool = db::create_pool(&url).await?;
    Ok(import_files(&pool, &files).await)
}

async fn import_files(pool: &PgPool, files: &[PathBuf]) -> ImportSummary {
    let mut summary = ImportSummary::default();

    for path in files {
        summary.files += 1;
        match import_file(pool, path).await {
            Ok((imported, invalid)) => {
                summary.imported += imported;
                summary.invalid += invalid;
                info!(file = %path.display(), imported, invalid, "Imported file");
            }
            Err(e) => {
                summary.failed_files += 1;
                error!(file = %path.display(), error = %e, "Failed to import file");
            }
        }
    }

    summary
}

async fn import_file(pool: &PgPool, path: &Path) -> Result<(u64, usize), ImportError> {
    let file = std::fs::File::open(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed = parse_rows(file)?;

    if !parsed.invalid.is_empty() {
        let report = invalid_report_path(path);
        warn!(
            file = %path.display(),
            count = parsed.invalid.len(),
            report = %report.display(),
            "Skipping invalid rows"
        );
        let json = serde_json::to_vec_pretty(&parsed.invalid)?;
        std::fs::write(&report, json).map_err(|source| ImportError::Io {
            path: report.clone(),
            source,
        })?;
    }

    let imported = PostcodeRepository::new(pool)
        .upsert_many(&parsed.valid)
        .await?;
    Ok((imported, parsed.invalid.len()))
}

/// `*.csv` files directly in `dir`, sorted by name.
///
/// # Errors
///
/// Returns `ImportError::Io` if the directory cannot be read.
pub fn csv_files(dir: &Path) -> Result<Vec<PathBuf>, ImportError> {
    let io_err = |source| ImportError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Where rejected rows of `csv_path` are written.
#[must_use]
pub fn invalid_report_path(csv_path: &Path) -> PathBuf {
    let stem = csv_path
        .file_stem()
        .map_or_else(|| "postcodes".into(), |s| s.to_string_lossy());
    csv_path.with_file_name(format!("invalid_{stem}.json"))
}

/// Read and validate all rows.
///
/// # Errors
///
/// Returns `ImportError::Csv` if the input is not CSV at all.
pub fn parse_rows(reader: impl Read) -> Result<ParsedFile, ImportError> {
    let mut csv = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut parsed = ParsedFile::default();
    for (index, record) in csv.deserialize::<RawRow>().enumerate() {
        // Header is line 1
        let line = u64::try_from(index).map_or(u64::MAX, |i| i + 2);
        let row = match record {
            Ok(row) => row,
            Err(e) => {
                parsed.invalid.push(InvalidRow {
                    line,
                    reason: e.to_string(),
                    row: RawRow::default(),
                });
                continue;
            }
        };

        match validate_row(&row) {
            Ok(price) => parsed.valid.push(price),
            Err(reason) => parsed.invalid.push(InvalidRow { line, reason, row }),
        }
    }
    Ok(parsed)
}

/// Validate one row: a postcode and two numeric prices.
///
/// # Errors
///
/// Returns the reason the row is rejected.
pub fn validate_row(row: &RawRow) -> Result<PostcodePrice, String> {
    let postcode = Postcode::parse(&row.postcode).map_err(|e| e.to_string())?;
    let economy = parse_price(&row.economy).ok_or("economy price is not a number")?;
    let premium = parse_price(&row.premium).ok_or("premium price is not a number")?;

    Ok(PostcodePrice {
        postcode: postcode.to_string(),
        economy_price: economy,
        premium_price: premium,
    })
}

fn parse_price(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn row(postcode: &str, economy: &str, premium: &str) -> RawRow {
        RawRow {
            postcode: postcode.to_string(),
            economy: economy.to_string(),
            premium: premium.to_string(),
        }
    }

    #[test]
    fn test_validate_row_normalizes_postcode() {
        let price = validate_row(&row(" sw1a 1aa ", "12.50", "25")).unwrap();
        assert_eq!(price.postcode, "SW1A 1AA");
        assert_eq!(price.economy_price, Decimal::new(1250, 2));
        assert_eq!(price.premium_price, Decimal::new(25, 0));
    }

    #[test]
    fn test_validate_row_rejects_blank_postcode() {
        assert!(validate_row(&row("", "1", "2")).is_err());
    }

    #[test]
    fn test_validate_row_rejects_non_numeric_price() {
        let err = validate_row(&row("LS1", "ten", "2")).unwrap_err();
        assert!(err.contains("economy"));
        let err = validate_row(&row("LS1", "1", "")).unwrap_err();
        assert!(err.contains("premium"));
    }

    #[test]
    fn test_parse_rows_splits_valid_and_invalid() {
        let input = "Postcode,Economy,Premium\n\
                     AB10,45.00,65.00\n\
                     ,10,20\n\
                     AB11,abc,65\n\
                     AB12, 40 , 60 \n";
        let parsed = parse_rows(input.as_bytes()).unwrap();

        assert_eq!(parsed.valid.len(), 2);
        assert_eq!(parsed.valid[1].postcode, "AB12");
        assert_eq!(parsed.invalid.len(), 2);
        assert_eq!(parsed.invalid[0].line, 3);
        assert_eq!(parsed.invalid[1].line, 4);
        assert_eq!(parsed.invalid[1].row.postcode, "AB11");
    }

    #[test]
    fn test_invalid_rows_serialize_flat() {
        let invalid = InvalidRow {
            line: 3,
            reason: "postcode cannot be empty".to_string(),
            row: row("", "10", "20"),
        };
        let json = serde_json::to_value(&invalid).unwrap();
        assert_eq!(json["line"], 3);
        assert_eq!(json["Economy"], "10");
    }

    #[test]
    fn test_invalid_report_path() {
        let path = invalid_report_path(Path::new("/data/postcodes/scotland.csv"));
        assert_eq!(path, Path::new("/data/postcodes/invalid_scotland.json"));
    }

    #[test]
    fn test_csv_files_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.csv", "a.CSV", "notes.txt", "invalid_a.json"] {
            std::fs::write(dir.path().join(name), "Postcode,Economy,Premium\n").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.csv")).unwrap();

        let files = csv_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.CSV", "b.csv"]);
    }

    #[test]
    fn test_csv_files_missing_dir() {
        let result = csv_files(Path::new("/nonexistent/flagstone/postcodes"));
        assert!(matches!(result, Err(ImportError::Io { .. })));
    }
}
