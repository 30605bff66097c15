//! Error taxonomy for the benchmark pipeline.
//!
//! Structural problems (a table without a required column, unreadable files)
//! are returned as errors and propagate to the caller. Data sparsity is not an
//! error: zero denominators and missing periods show up as `None` values in the
//! output tables. The one sparsity case that *is* surfaced is an empty store or
//! department selection, so the caller can show a corrective message instead of
//! rendering empty charts.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BenchError {
    /// A table was read or composed without a column the operation needs.
    #[error("table `{table}` is missing required column `{column}`")]
    MissingColumn { table: String, column: String },

    /// Filter narrowing left nothing to aggregate.
    #[error("selection is empty: {0}")]
    EmptySelection(String),

    #[error("unknown store: {0}")]
    UnknownStore(String),

    /// A period field could not be interpreted (e.g. a quarter name that is not `Q1`..`Q4`).
    #[error("invalid period value `{value}` in column `{column}`")]
    InvalidPeriod { column: String, value: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl BenchError {
    pub fn missing_column(table: &str, column: &str) -> Self {
        BenchError::MissingColumn {
            table: table.to_string(),
            column: column.to_string(),
        }
    }

    /// True for the user-facing, recoverable variant.
    pub fn is_empty_selection(&self) -> bool {
        matches!(self, BenchError::EmptySelection(_))
    }
}

pub type Result<T> = std::result::Result<T, BenchError>;
