//! Error types for loading and parsing booking data.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to read the input file at all. Aborts the run.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("malformed CSV at data row {row}: {source}")]
    Malformed {
        row: usize,
        #[source]
        source: csv::Error,
    },

    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),
}

/// A data row that cannot become a booking. Date-dependent analysis is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("data row {row}: missing value for '{column}'")]
    MissingField { row: usize, column: &'static str },

    #[error("data row {row}: cannot parse booking_date '{value}'")]
    InvalidDate { row: usize, value: String },
}
