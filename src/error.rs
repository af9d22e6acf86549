//! Error types for the fraud baseline

use thiserror::Error;

/// Result type alias for baseline operations
pub type Result<T> = std::result::Result<T, BaselineError>;

/// Main error type for the baseline
#[derive(Error, Debug)]
pub enum BaselineError {
    #[error("Dataset must contain a '{0}' column (1=fraud, 0=legit)")]
    MissingColumn(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Preprocessing error: {0}")]
    PreprocessingError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Computation error: {0}")]
    ComputationError(String),
}

impl From<polars::error::PolarsError> for BaselineError {
    fn from(err: polars::error::PolarsError) -> Self {
        BaselineError::DataError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for BaselineError {
    fn from(err: ndarray::ShapeError) -> Self {
        BaselineError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
