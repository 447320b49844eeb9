//! Error types for the cytodx pipeline

use thiserror::Error;

/// Result type alias for cytodx operations
pub type Result<T> = std::result::Result<T, CytodxError>;

/// Main error type for training and inference
#[derive(Error, Debug)]
pub enum CytodxError {
    /// Caller-supplied features violate the fitted schema (count, emptiness, finiteness)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Artifact directory is incomplete
    #[error("Missing artifact: {0}")]
    MissingArtifact(String),

    /// Cluster model produced an id the cluster map does not cover
    #[error("Unknown cluster: {0} is not present in the cluster map")]
    UnknownCluster(usize),

    #[error("Training data error: {0}")]
    TrainingDataError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<serde_json::Error> for CytodxError {
    fn from(err: serde_json::Error) -> Self {
        CytodxError::SerializationError(err.to_string())
    }
}

impl From<bincode::Error> for CytodxError {
    fn from(err: bincode::Error) -> Self {
        CytodxError::SerializationError(err.to_string())
    }
}

impl From<csv::Error> for CytodxError {
    fn from(err: csv::Error) -> Self {
        CytodxError::DataError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for CytodxError {
    fn from(err: ndarray::ShapeError) -> Self {
        CytodxError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
