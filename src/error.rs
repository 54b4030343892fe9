//! Error types for the genome-qcqa library.

use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum QcError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("curve must be either \"elbow\" or \"knee\", got '{0}'")]
    InvalidCurveMode(String),

    #[error("Missing required column '{column}' for stage '{stage}'")]
    MissingRequiredColumn { column: String, stage: String },

    #[error("Invalid value '{value}' in column '{column}' at row {row}: expected {expected}")]
    InvalidValue {
        column: String,
        row: usize,
        value: String,
        expected: &'static str,
    },

    #[error("Empty data: {0}")]
    EmptyData(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl QcError {
    /// Shorthand for a missing column raised by a named stage.
    pub fn missing_column(column: &str, stage: &str) -> Self {
        QcError::MissingRequiredColumn {
            column: column.to_string(),
            stage: stage.to_string(),
        }
    }
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, QcError>;
