//! Error types for the regimeshift library.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors that can occur during change-point analysis.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Required input file does not exist.
    #[error("input file not found: {0}")]
    NotFound(PathBuf),

    /// A required column is missing from an input table.
    #[error("missing required column: {0}")]
    MissingColumn(String),

    /// Input data is empty where observations are required.
    #[error("empty input data: {0}")]
    EmptyData(String),

    /// No posterior samples available to summarize.
    #[error("no posterior samples available")]
    EmptyPosterior,

    /// The bounded change-index prior collapsed to fewer than two candidates.
    #[error("degenerate change-index range [{lower}, {upper}] for {n} observations")]
    DegenerateTauRange { lower: usize, upper: usize, n: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Index out of bounds.
    #[error("index out of bounds: {index} (size: {size})")]
    IndexOutOfBounds { index: usize, size: usize },

    /// A derived statistic is numerically undefined.
    #[error("numerically degenerate result: {0}")]
    NumericDegeneracy(String),

    /// Underlying I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read/write failure.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = AnalysisError::MissingColumn("Price".to_string());
        assert_eq!(err.to_string(), "missing required column: Price");

        let err = AnalysisError::DegenerateTauRange { lower: 1, upper: 1, n: 2 };
        assert!(err.to_string().contains("[1, 1]"));

        let err = AnalysisError::IndexOutOfBounds { index: 10, size: 5 };
        assert_eq!(err.to_string(), "index out of bounds: 10 (size: 5)");
    }
}
