use std::path::PathBuf;

use thiserror::Error;

/// Result alias used by the loading and configuration layers.
pub type Result<T> = std::result::Result<T, SimError>;

/// Errors surfaced while loading tables or selection files.
///
/// The simulation itself never fails: malformed fields degrade to
/// exclusion instead of propagating.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("failed to read workbook: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("workbook has no worksheets")]
    EmptyWorkbook,
    #[error("{table} table has no `{column}` column")]
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },
    #[error("invalid selection file {path}: {source}")]
    Selection {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
