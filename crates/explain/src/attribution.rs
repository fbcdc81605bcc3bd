//! Attribution Types

use crate::ExplainError;
use feature_engine::FeatureSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Computes per-feature contributions for one class of a model.
///
/// Read-only: explaining a row never changes the prediction it explains.
pub trait Explainer: Send + Sync {
    /// Columns of the explained model, in order
    fn feature_names(&self) -> &[String];

    /// Model output for `class_index` when no feature is known
    fn expected_value(&self, class_index: usize) -> Result<f64, ExplainError>;

    /// One contribution per feature for `class_index`
    fn contributions(&self, row: &[f64], class_index: usize) -> Result<Vec<f64>, ExplainError>;
}

/// Contribution of one feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureContribution {
    pub feature: String,
    /// Feature value the model saw
    pub value: f64,
    pub contribution: f64,
}

/// Explanation of one row for one class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribution {
    pub class_index: usize,
    /// Baseline output for the class
    pub expected_value: f64,
    pub contributions: Vec<FeatureContribution>,
}

impl Attribution {
    pub fn total_contribution(&self) -> f64 {
        self.contributions.iter().map(|c| c.contribution).sum()
    }

    /// Baseline plus all contributions
    pub fn output_value(&self) -> f64 {
        self.expected_value + self.total_contribution()
    }
}

/// Explain `row` for the predicted class
pub fn explain(explainer: &dyn Explainer, row: &[f64], class_index: usize) -> Result<Attribution, ExplainError> {
    let names = explainer.feature_names();
    FeatureSchema::check_width(names.len(), row.len())?;

    let expected_value = explainer.expected_value(class_index)?;
    let values = explainer.contributions(row, class_index)?;
    FeatureSchema::check_width(names.len(), values.len())?;

    let contributions = names
        .iter()
        .zip(row)
        .zip(values)
        .map(|((feature, value), contribution)| FeatureContribution {
            feature: feature.clone(),
            value: *value,
            contribution,
        })
        .collect();

    let attribution = Attribution {
        class_index,
        expected_value,
        contributions,
    };
    debug!(
        "Attribution for class {}: base={:.4}, output={:.4}",
        class_index,
        attribution.expected_value,
        attribution.output_value()
    );
    Ok(attribution)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct LinearExplainer {
        names: Vec<String>,
        weights: Vec<f64>,
    }

    impl Explainer for LinearExplainer {
        fn feature_names(&self) -> &[String] {
            &self.names
        }

        fn expected_value(&self, class_index: usize) -> Result<f64, ExplainError> {
            if class_index > 0 {
                return Err(ExplainError::ClassOutOfRange { class: class_index, n_classes: 1 });
            }
            Ok(0.5)
        }

        fn contributions(&self, row: &[f64], _class_index: usize) -> Result<Vec<f64>, ExplainError> {
            Ok(row.iter().zip(&self.weights).map(|(x, w)| x * w).collect())
        }
    }

    fn linear() -> LinearExplainer {
        LinearExplainer {
            names: vec!["a".into(), "b".into()],
            weights: vec![2.0, -1.0],
        }
    }

    #[test]
    fn test_explain_pairs_names_values_and_contributions() {
        let attribution = explain(&linear(), &[1.0, 3.0], 0).unwrap();
        assert_eq!(attribution.contributions.len(), 2);
        assert_eq!(attribution.contributions[0].feature, "a");
        assert_eq!(attribution.contributions[1].value, 3.0);
        assert_eq!(attribution.contributions[1].contribution, -3.0);
        assert_eq!(attribution.total_contribution(), -1.0);
        assert_eq!(attribution.output_value(), -0.5);
    }

    #[test]
    fn test_explain_rejects_wrong_width() {
        assert!(matches!(explain(&linear(), &[1.0], 0), Err(ExplainError::Schema(_))));
    }

    #[test]
    fn test_explain_propagates_class_errors() {
        assert!(matches!(
            explain(&linear(), &[1.0, 1.0], 3),
            Err(ExplainError::ClassOutOfRange { class: 3, .. })
        ));
    }
}
