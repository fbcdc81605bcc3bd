//! Preprocessing Error Types

use feature_engine::SchemaError;
use thiserror::Error;

/// Errors while loading or applying the scaler
#[derive(Debug, Error)]
pub enum PreprocessError {
    /// Artifact file could not be read
    #[error("Failed to read scaler artifact {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Artifact contents are not a valid scaler
    #[error("Failed to parse scaler artifact {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Artifact parsed but its parameters are inconsistent
    #[error("Invalid scaler artifact: {0}")]
    Invalid(String),

    /// Row or artifact disagrees with the feature schema
    #[error(transparent)]
    Schema(#[from] SchemaError),
}
