//! Feature Schema
//!
//! The scaler and both classifiers were fit on one exact column order.
//! Artifacts declare the columns they expect and are checked against this
//! schema when they are wired together, so a reordered or truncated artifact
//! fails at startup instead of silently mis-scoring.

use serde::Serialize;
use thiserror::Error;

/// Number of numeric (scaled) columns
pub const NUMERIC_WIDTH: usize = 10;

/// Number of categorical (unscaled) columns
pub const CATEGORICAL_WIDTH: usize = 1;

/// Errors raised when an artifact disagrees with the schema
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("{artifact} expects columns {actual:?}, schema v{version} defines {expected:?}")]
    SchemaMismatch {
        artifact: String,
        version: u32,
        expected: Vec<String>,
        actual: Vec<String>,
    },
    #[error("Feature width mismatch: expected {expected}, got {actual}")]
    WidthMismatch { expected: usize, actual: usize },
}

/// Named, versioned column layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeatureSchema {
    pub version: u32,
    pub numeric: [&'static str; NUMERIC_WIDTH],
    pub categorical: [&'static str; CATEGORICAL_WIDTH],
}

/// Layout used by the bundled artifacts
pub const FEATURE_SCHEMA: FeatureSchema = FeatureSchema {
    version: 1,
    numeric: [
        "Type",
        "Air_temperature_[K]",
        "Process_temperature_[K]",
        "Rotational_speed_[rpm]",
        "Torque_[Nm]",
        "Tool_wear_[min]",
        "Temp_Delta",
        "Power_[W]",
        "Wear_per_Torque",
        "Speed_Torque_Ratio",
    ],
    categorical: ["No_failure"],
};

impl FeatureSchema {
    pub fn numeric_names(&self) -> &[&'static str] {
        &self.numeric
    }

    /// Numeric columns followed by categorical columns
    pub fn all_names(&self) -> Vec<&'static str> {
        self.numeric.iter().chain(self.categorical.iter()).copied().collect()
    }

    /// Check an artifact's numeric columns
    pub fn validate_numeric(&self, artifact: &str, columns: &[String]) -> Result<(), SchemaError> {
        self.compare(artifact, &self.numeric, columns)
    }

    /// Check an artifact's full (numeric + categorical) columns
    pub fn validate_all(&self, artifact: &str, columns: &[String]) -> Result<(), SchemaError> {
        self.compare(artifact, &self.all_names(), columns)
    }

    /// Check that a row has the expected width
    pub fn check_width(expected: usize, actual: usize) -> Result<(), SchemaError> {
        if expected == actual {
            Ok(())
        } else {
            Err(SchemaError::WidthMismatch { expected, actual })
        }
    }

    fn compare(&self, artifact: &str, expected: &[&str], actual: &[String]) -> Result<(), SchemaError> {
        let matches = expected.len() == actual.len()
            && expected.iter().zip(actual).all(|(e, a)| *e == a.as_str());
        if matches {
            Ok(())
        } else {
            Err(SchemaError::SchemaMismatch {
                artifact: artifact.to_string(),
                version: self.version,
                expected: expected.iter().map(|s| s.to_string()).collect(),
                actual: actual.to_vec(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_all_names_appends_categorical() {
        let names = FEATURE_SCHEMA.all_names();
        assert_eq!(names.len(), NUMERIC_WIDTH + CATEGORICAL_WIDTH);
        assert_eq!(names[NUMERIC_WIDTH], "No_failure");
        assert_eq!(names[0], "Type");
    }

    #[test]
    fn test_matching_columns_pass() {
        let cols = owned(FEATURE_SCHEMA.numeric_names());
        assert!(FEATURE_SCHEMA.validate_numeric("scaler", &cols).is_ok());
        let cols = owned(&FEATURE_SCHEMA.all_names());
        assert!(FEATURE_SCHEMA.validate_all("classifier", &cols).is_ok());
    }

    #[test]
    fn test_reordered_columns_rejected() {
        let mut cols = owned(FEATURE_SCHEMA.numeric_names());
        cols.swap(1, 2);
        let err = FEATURE_SCHEMA.validate_numeric("scaler", &cols).unwrap_err();
        match err {
            SchemaError::SchemaMismatch { artifact, version, .. } => {
                assert_eq!(artifact, "scaler");
                assert_eq!(version, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_categorical_rejected() {
        let cols = owned(FEATURE_SCHEMA.numeric_names());
        assert!(FEATURE_SCHEMA.validate_all("classifier", &cols).is_err());
    }

    #[test]
    fn test_width_check() {
        assert!(FeatureSchema::check_width(10, 10).is_ok());
        assert_eq!(
            FeatureSchema::check_width(11, 10),
            Err(SchemaError::WidthMismatch { expected: 11, actual: 10 })
        );
    }
}
