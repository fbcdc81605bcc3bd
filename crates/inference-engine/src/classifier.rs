//! Classifier Interface

use crate::InferenceError;

/// A pretrained classifier artifact.
///
/// Loaded once per process and shared read-only; implementations must not
/// carry per-request state.
pub trait Classifier: Send + Sync {
    /// Columns the model was trained on, in order
    fn feature_names(&self) -> &[String];

    /// Number of output classes
    fn n_classes(&self) -> usize;

    /// Class probability distribution for one row
    fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, InferenceError>;

    /// Predicted class index for one row
    fn predict(&self, row: &[f64]) -> Result<usize, InferenceError> {
        let proba = self.predict_proba(row)?;
        argmax_first(&proba)
            .ok_or_else(|| InferenceError::InferenceFailed("empty probability vector".to_string()))
    }
}

/// Index of the maximum value.
///
/// Ties resolve to the earliest index, so with the fault class order
/// `[No_failure, TWF, RNF, PWF, HDF, OSF]` a tie always favours the class
/// listed first. Returns `None` for an empty slice.
pub fn argmax_first(values: &[f64]) -> Option<usize> {
    let mut iter = values.iter().enumerate();
    let (mut best_idx, mut best) = iter.next().map(|(i, v)| (i, *v))?;
    for (i, &v) in iter {
        if v > best || (best.is_nan() && !v.is_nan()) {
            best_idx = i;
            best = v;
        }
    }
    Some(best_idx)
}
