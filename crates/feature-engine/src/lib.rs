//! Feature Engineering Engine
//!
//! Captures raw machine sensor readings and derives the engineered features
//! consumed by the scaler and both classifiers.

mod features;
mod input;
mod schema;

pub use features::{compute_features, FeatureVector, EPSILON};
pub use input::RawInput;
pub use schema::{FeatureSchema, SchemaError, CATEGORICAL_WIDTH, FEATURE_SCHEMA, NUMERIC_WIDTH};
