//! Feature Preprocessing
//!
//! Loads the fitted scaler artifact and applies it to the numeric columns of
//! a feature vector.

mod error;
mod scaler;

pub use error::PreprocessError;
pub use scaler::{scale, ScaledFeatureVector, Scaler, StandardScaler};
