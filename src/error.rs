//! Error types for feature derivation and training.

use thiserror::Error;

/// Errors raised while deriving features from a session table.
#[derive(Error, Debug)]
pub enum FeatureError {
    /// A raw timestamp cell could not be parsed
    #[error("Parse error: column '{column}' row {row}: '{value}' is not a valid timestamp")]
    Parse {
        column: String,
        row: usize,
        value: String,
    },

    /// Expected column families are missing or inconsistent
    #[error("Schema error: {0}")]
    Schema(String),
}

/// Errors raised by the training stage.
#[derive(Error, Debug)]
pub enum TrainError {
    /// Unrecognized classifier backend key
    #[error("Configuration error: unsupported model type '{0}'")]
    UnknownModel(String),

    /// Feature matrix or labels unusable for fitting
    #[error("Invalid training data: {0}")]
    InvalidData(String),

    #[error(transparent)]
    Feature(#[from] FeatureError),
}

/// Result type for feature derivation
pub type Result<T> = std::result::Result<T, FeatureError>;
