//! Two-Stage Inference Engine
//!
//! Runs the binary failure screener, folds its verdict into the categorical
//! flag, and runs the multi-class fault classifier on the extended row.

mod classifier;
mod engine;
mod ensemble;

pub use classifier::{argmax_first, Classifier};
pub use engine::{
    FaultClass, FaultStatus, InferenceEngine, Prediction, ScreeningStatus, PROBABILITY_TOLERANCE,
};
pub use ensemble::{Node, Objective, Tree, TreeEnsemble};

use feature_engine::SchemaError;
use thiserror::Error;

/// Errors during artifact loading or inference
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Failed to read model artifact {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse model artifact {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid model artifact: {0}")]
    InvalidArtifact(String),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("Invalid probability distribution: {0}")]
    InvalidDistribution(String),
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
}
