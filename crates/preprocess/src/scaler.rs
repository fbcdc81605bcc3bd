//! Standardizing Scaler

use crate::error::PreprocessError;
use feature_engine::{FeatureSchema, FeatureVector, NUMERIC_WIDTH};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// A fitted column transform.
///
/// Implementations are loaded once and shared read-only between requests.
pub trait Scaler: Send + Sync {
    /// Columns the transform was fit on, in order
    fn feature_names(&self) -> &[String];

    /// Transform one row
    fn transform(&self, row: &[f64]) -> Result<Vec<f64>, PreprocessError>;
}

/// Numeric features after scaling, in schema order.
///
/// The categorical flag is never scaled; it is appended with [`Self::with_flag`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScaledFeatureVector {
    values: [f64; NUMERIC_WIDTH],
}

impl ScaledFeatureVector {
    pub fn new(values: [f64; NUMERIC_WIDTH]) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[f64; NUMERIC_WIDTH] {
        &self.values
    }

    /// Scaled numeric values followed by the categorical flag
    pub fn with_flag(&self, flag: f64) -> [f64; NUMERIC_WIDTH + 1] {
        let mut row = [0.0; NUMERIC_WIDTH + 1];
        row[..NUMERIC_WIDTH].copy_from_slice(&self.values);
        row[NUMERIC_WIDTH] = flag;
        row
    }
}

/// Apply the scaler to the ten numeric fields of a feature vector
pub fn scale(features: &FeatureVector, scaler: &dyn Scaler) -> Result<ScaledFeatureVector, PreprocessError> {
    let transformed = scaler.transform(&features.to_array())?;
    FeatureSchema::check_width(NUMERIC_WIDTH, transformed.len())?;

    let mut values = [0.0; NUMERIC_WIDTH];
    values.copy_from_slice(&transformed);
    debug!("Scaled features: {:?}", values);
    Ok(ScaledFeatureVector::new(values))
}

/// Per-column standardization `(x - mean) / scale`.
///
/// A zero scale (constant training column) is treated as 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    feature_names: Vec<String>,
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Build a scaler from fitted parameters
    pub fn from_parts(
        feature_names: Vec<String>,
        mean: Vec<f64>,
        scale: Vec<f64>,
    ) -> Result<Self, PreprocessError> {
        let scaler = Self {
            feature_names,
            mean,
            scale,
        };
        scaler.validate()?;
        Ok(scaler)
    }

    /// Load a scaler artifact from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PreprocessError> {
        let path = path.as_ref();
        let path_str = path.display().to_string();
        info!("Loading scaler artifact from {}", path_str);

        let contents = std::fs::read_to_string(path).map_err(|source| PreprocessError::Io {
            path: path_str.clone(),
            source,
        })?;
        let scaler: Self = serde_json::from_str(&contents).map_err(|source| PreprocessError::Parse {
            path: path_str,
            source,
        })?;
        scaler.validate()?;

        info!("Scaler loaded: {} columns", scaler.feature_names.len());
        Ok(scaler)
    }

    fn validate(&self) -> Result<(), PreprocessError> {
        let n = self.feature_names.len();
        if n == 0 {
            return Err(PreprocessError::Invalid("no columns".to_string()));
        }
        if self.mean.len() != n || self.scale.len() != n {
            return Err(PreprocessError::Invalid(format!(
                "{} columns but {} means and {} scales",
                n,
                self.mean.len(),
                self.scale.len()
            )));
        }
        if let Some(i) = self
            .mean
            .iter()
            .chain(self.scale.iter())
            .position(|v| !v.is_finite())
        {
            return Err(PreprocessError::Invalid(format!(
                "non-finite parameter for column {}",
                self.feature_names[i % n]
            )));
        }
        Ok(())
    }
}

impl Scaler for StandardScaler {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn transform(&self, row: &[f64]) -> Result<Vec<f64>, PreprocessError> {
        FeatureSchema::check_width(self.feature_names.len(), row.len())?;

        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| {
                let scale = if *scale == 0.0 { 1.0 } else { *scale };
                (x - mean) / scale
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feature_engine::{compute_features, RawInput, FEATURE_SCHEMA};
    use std::io::Write;

    fn schema_names() -> Vec<String> {
        FEATURE_SCHEMA.numeric_names().iter().map(|s| s.to_string()).collect()
    }

    fn unit_scaler() -> StandardScaler {
        StandardScaler::from_parts(schema_names(), vec![0.0; 10], vec![1.0; 10]).unwrap()
    }

    #[test]
    fn test_standardization() {
        let scaler = StandardScaler::from_parts(
            vec!["a".into(), "b".into()],
            vec![10.0, -2.0],
            vec![2.0, 0.5],
        )
        .unwrap();
        let out = scaler.transform(&[14.0, -1.0]).unwrap();
        assert_eq!(out, vec![2.0, 2.0]);
    }

    #[test]
    fn test_zero_scale_treated_as_one() {
        let scaler =
            StandardScaler::from_parts(vec!["a".into()], vec![5.0], vec![0.0]).unwrap();
        assert_eq!(scaler.transform(&[7.0]).unwrap(), vec![2.0]);
    }

    #[test]
    fn test_width_mismatch_rejected() {
        let scaler = unit_scaler();
        assert!(matches!(
            scaler.transform(&[1.0, 2.0]),
            Err(PreprocessError::Schema(_))
        ));
    }

    #[test]
    fn test_inconsistent_parameters_rejected() {
        let result = StandardScaler::from_parts(schema_names(), vec![0.0; 9], vec![1.0; 10]);
        assert!(matches!(result, Err(PreprocessError::Invalid(_))));

        let mut scale = vec![1.0; 10];
        scale[3] = f64::NAN;
        let result = StandardScaler::from_parts(schema_names(), vec![0.0; 10], scale);
        assert!(matches!(result, Err(PreprocessError::Invalid(_))));
    }

    #[test]
    fn test_scale_feature_vector() {
        let raw = RawInput {
            air_temperature: 300.0,
            process_temperature: 310.0,
            ..Default::default()
        };
        let features = compute_features(&raw);
        let scaled = scale(&features, &unit_scaler()).unwrap();
        assert_eq!(scaled.values(), &features.to_array());

        let row = scaled.with_flag(1.0);
        assert_eq!(row.len(), 11);
        assert_eq!(row[10], 1.0);
        assert_eq!(row[6], 10.0);
    }

    #[test]
    fn test_load_from_file() {
        let scaler = unit_scaler();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(&scaler).unwrap().as_bytes())
            .unwrap();

        let loaded = StandardScaler::load(file.path()).unwrap();
        assert_eq!(loaded.feature_names(), scaler.feature_names());
    }

    #[test]
    fn test_load_missing_file() {
        let err = StandardScaler::load("/nonexistent/scaler.json").unwrap_err();
        assert!(matches!(err, PreprocessError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/scaler.json"));
    }

    #[test]
    fn test_load_corrupt_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"\x00\x01not json").unwrap();
        let err = StandardScaler::load(file.path()).unwrap_err();
        assert!(matches!(err, PreprocessError::Parse { .. }));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }
}
