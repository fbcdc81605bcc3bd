//! Gradient-Boosted Tree Ensemble Artifact
//!
//! JSON layout:
//!
//! ```json
//! {
//!   "objective": "multi_softprob",
//!   "feature_names": ["Type", "..."],
//!   "base_margin": [0.5, 0.5, 0.5, 0.5, 0.5, 0.5],
//!   "trees": [
//!     { "group": 0, "nodes": [
//!       { "kind": "split", "feature": 4, "threshold": 0.8, "left": 1, "right": 2, "cover": 10.0 },
//!       { "kind": "leaf", "value": 0.3, "cover": 7.0 },
//!       { "kind": "leaf", "value": -0.4, "cover": 3.0 }
//!     ] }
//!   ]
//! }
//! ```
//!
//! A row goes left when `x < threshold`; NaN follows `default_left`.
//! Child indices always point forward, which keeps every tree acyclic.

use crate::classifier::Classifier;
use crate::InferenceError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Link between summed tree margins and class probabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    /// One margin group, sigmoid link, classes `[0, 1]`
    BinaryLogistic,
    /// One margin group per class, softmax link
    MultiSoftprob,
}

/// Tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        #[serde(default = "default_left")]
        default_left: bool,
        /// Training weight reaching this node
        cover: f64,
    },
    Leaf {
        value: f64,
        cover: f64,
    },
}

fn default_left() -> bool {
    true
}

impl Node {
    pub fn cover(&self) -> f64 {
        match self {
            Node::Split { cover, .. } | Node::Leaf { cover, .. } => *cover,
        }
    }

    pub fn leaf_value(&self) -> Option<f64> {
        match self {
            Node::Leaf { value, .. } => Some(*value),
            Node::Split { .. } => None,
        }
    }

    /// Child a row descends into, `None` for leaves.
    ///
    /// A feature index past the end of the row is treated as missing.
    pub fn next(&self, row: &[f64]) -> Option<usize> {
        match self {
            Node::Split {
                feature,
                threshold,
                left,
                right,
                default_left,
                ..
            } => {
                let x = row.get(*feature).copied().unwrap_or(f64::NAN);
                let go_left = if x.is_nan() { *default_left } else { x < *threshold };
                Some(if go_left { *left } else { *right })
            }
            Node::Leaf { .. } => None,
        }
    }
}

/// One regression tree contributing to a single output group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    #[serde(default)]
    group: usize,
    nodes: Vec<Node>,
}

impl Tree {
    pub fn new(group: usize, nodes: Vec<Node>) -> Self {
        Self { group, nodes }
    }

    pub fn group(&self) -> usize {
        self.group
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Leaf value reached by a row
    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        while let Some(next) = self.nodes[idx].next(row) {
            idx = next;
        }
        self.nodes[idx].leaf_value().unwrap_or_default()
    }

    /// Cover-weighted mean leaf value, the baseline the tree contributes
    /// when no feature is known
    pub fn expected_value(&self) -> f64 {
        self.node_expectation(0)
    }

    fn node_expectation(&self, idx: usize) -> f64 {
        match &self.nodes[idx] {
            Node::Leaf { value, .. } => *value,
            Node::Split {
                left, right, cover, ..
            } => {
                let l = self.nodes[*left].cover() / cover;
                let r = self.nodes[*right].cover() / cover;
                l * self.node_expectation(*left) + r * self.node_expectation(*right)
            }
        }
    }

    fn validate(&self, tree_idx: usize, n_features: usize, n_groups: usize) -> Result<(), InferenceError> {
        let invalid = |msg: String| InferenceError::InvalidArtifact(format!("tree {}: {}", tree_idx, msg));

        if self.nodes.is_empty() {
            return Err(invalid("no nodes".to_string()));
        }
        if self.group >= n_groups {
            return Err(invalid(format!("group {} out of range ({} groups)", self.group, n_groups)));
        }

        let len = self.nodes.len();
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    cover,
                    ..
                } => {
                    if *feature >= n_features {
                        return Err(invalid(format!("node {} splits on feature {} of {}", i, feature, n_features)));
                    }
                    if threshold.is_nan() {
                        return Err(invalid(format!("node {} has NaN threshold", i)));
                    }
                    for child in [left, right] {
                        if *child <= i || *child >= len {
                            return Err(invalid(format!("node {} has invalid child {}", i, child)));
                        }
                    }
                    if left == right {
                        return Err(invalid(format!("node {} has identical children", i)));
                    }
                    if !(cover.is_finite() && *cover > 0.0) {
                        return Err(invalid(format!("node {} has non-positive cover", i)));
                    }
                }
                Node::Leaf { value, cover } => {
                    if !value.is_finite() {
                        return Err(invalid(format!("leaf {} has non-finite value", i)));
                    }
                    if !(cover.is_finite() && *cover >= 0.0) {
                        return Err(invalid(format!("leaf {} has invalid cover", i)));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Additive ensemble of regression trees
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEnsemble {
    objective: Objective,
    feature_names: Vec<String>,
    base_margin: Vec<f64>,
    trees: Vec<Tree>,
}

impl TreeEnsemble {
    /// Build and validate an ensemble
    pub fn new(
        objective: Objective,
        feature_names: Vec<String>,
        base_margin: Vec<f64>,
        trees: Vec<Tree>,
    ) -> Result<Self, InferenceError> {
        let model = Self {
            objective,
            feature_names,
            base_margin,
            trees,
        };
        model.validate()?;
        Ok(model)
    }

    /// Load an ensemble artifact from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, InferenceError> {
        let path = path.as_ref();
        let path_str = path.display().to_string();
        info!("Loading model artifact from {}", path_str);

        let contents = std::fs::read_to_string(path).map_err(|source| InferenceError::Io {
            path: path_str.clone(),
            source,
        })?;
        let model: Self = serde_json::from_str(&contents).map_err(|source| InferenceError::Parse {
            path: path_str,
            source,
        })?;
        model.validate()?;

        info!(
            "Model loaded: {:?}, {} trees, {} features, {} classes",
            model.objective,
            model.trees.len(),
            model.feature_names.len(),
            model.n_classes()
        );
        Ok(model)
    }

    pub fn objective(&self) -> Objective {
        self.objective
    }

    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    pub fn base_margin(&self) -> &[f64] {
        &self.base_margin
    }

    /// Number of margin groups (1 for binary, one per class otherwise)
    pub fn n_groups(&self) -> usize {
        self.base_margin.len()
    }

    /// Map a class index to the margin group that explains it.
    ///
    /// For the binary objective both classes share the single group; the
    /// margin is the log-odds of class 1.
    pub fn group_for_class(&self, class: usize) -> usize {
        match self.objective {
            Objective::BinaryLogistic => 0,
            Objective::MultiSoftprob => class,
        }
    }

    /// Raw (pre-link) output per group
    pub fn margins(&self, row: &[f64]) -> Result<Vec<f64>, InferenceError> {
        if row.len() != self.feature_names.len() {
            return Err(feature_engine::SchemaError::WidthMismatch {
                expected: self.feature_names.len(),
                actual: row.len(),
            }
            .into());
        }

        let mut margins = self.base_margin.clone();
        for tree in &self.trees {
            margins[tree.group] += tree.predict(row);
        }
        debug!("Tree margins: {:?}", margins);
        Ok(margins)
    }

    fn validate(&self) -> Result<(), InferenceError> {
        let n_features = self.feature_names.len();
        if n_features == 0 {
            return Err(InferenceError::InvalidArtifact("no feature names".to_string()));
        }

        let groups_ok = match self.objective {
            Objective::BinaryLogistic => self.base_margin.len() == 1,
            Objective::MultiSoftprob => self.base_margin.len() >= 2,
        };
        if !groups_ok {
            return Err(InferenceError::InvalidArtifact(format!(
                "{:?} objective with {} base margins",
                self.objective,
                self.base_margin.len()
            )));
        }
        if self.base_margin.iter().any(|m| !m.is_finite()) {
            return Err(InferenceError::InvalidArtifact("non-finite base margin".to_string()));
        }

        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(i, n_features, self.n_groups())?;
        }
        Ok(())
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn softmax(margins: &[f64]) -> Vec<f64> {
    let max = margins.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = margins.iter().map(|m| (m - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

impl Classifier for TreeEnsemble {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn n_classes(&self) -> usize {
        match self.objective {
            Objective::BinaryLogistic => 2,
            Objective::MultiSoftprob => self.base_margin.len(),
        }
    }

    fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, InferenceError> {
        let margins = self.margins(row)?;
        Ok(match self.objective {
            Objective::BinaryLogistic => {
                let p = sigmoid(margins[0]);
                vec![1.0 - p, p]
            }
            Objective::MultiSoftprob => softmax(&margins),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("f{}", i)).collect()
    }

    fn stump(group: usize, feature: usize, threshold: f64, left: f64, right: f64) -> Tree {
        Tree::new(
            group,
            vec![
                Node::Split {
                    feature,
                    threshold,
                    left: 1,
                    right: 2,
                    default_left: true,
                    cover: 10.0,
                },
                Node::Leaf { value: left, cover: 6.0 },
                Node::Leaf { value: right, cover: 4.0 },
            ],
        )
    }

    #[test]
    fn test_tree_routing() {
        let tree = stump(0, 1, 0.5, -1.0, 2.0);
        assert_eq!(tree.predict(&[0.0, 0.1]), -1.0);
        assert_eq!(tree.predict(&[0.0, 0.5]), 2.0);
        assert_eq!(tree.predict(&[0.0, f64::NAN]), -1.0);
    }

    #[test]
    fn test_expected_value_is_cover_weighted() {
        let tree = stump(0, 0, 0.0, -1.0, 2.0);
        assert!((tree.expected_value() - (0.6 * -1.0 + 0.4 * 2.0)).abs() < 1e-12);
    }

    #[test]
    fn test_binary_probabilities() {
        let model = TreeEnsemble::new(
            Objective::BinaryLogistic,
            names(2),
            vec![0.0],
            vec![stump(0, 0, 0.0, -2.0, 2.0)],
        )
        .unwrap();

        let low = model.predict_proba(&[-1.0, 0.0]).unwrap();
        assert!((low[0] + low[1] - 1.0).abs() < 1e-12);
        assert!(low[0] > low[1]);
        assert_eq!(model.predict(&[-1.0, 0.0]).unwrap(), 0);
        assert_eq!(model.predict(&[1.0, 0.0]).unwrap(), 1);
        assert_eq!(model.n_classes(), 2);
    }

    #[test]
    fn test_binary_even_odds_predicts_zero() {
        let model = TreeEnsemble::new(Objective::BinaryLogistic, names(1), vec![0.0], vec![]).unwrap();
        assert_eq!(model.predict_proba(&[3.0]).unwrap(), vec![0.5, 0.5]);
        assert_eq!(model.predict(&[3.0]).unwrap(), 0);
    }

    #[test]
    fn test_multiclass_softmax() {
        let model = TreeEnsemble::new(
            Objective::MultiSoftprob,
            names(2),
            vec![0.0, 0.0, 0.0],
            vec![stump(1, 0, 0.0, 0.0, 3.0), stump(2, 1, 0.0, 0.0, 1.0)],
        )
        .unwrap();

        let proba = model.predict_proba(&[1.0, 1.0]).unwrap();
        assert_eq!(proba.len(), 3);
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert_eq!(model.predict(&[1.0, 1.0]).unwrap(), 1);

        // All margins equal: uniform distribution, first class wins the tie
        let proba = model.predict_proba(&[-1.0, -1.0]).unwrap();
        assert!(proba.iter().all(|p| (p - 1.0 / 3.0).abs() < 1e-12));
        assert_eq!(model.predict(&[-1.0, -1.0]).unwrap(), 0);
    }

    #[test]
    fn test_softmax_handles_large_margins() {
        let proba = softmax(&[1000.0, 999.0, -1000.0]);
        assert!(proba.iter().all(|p| p.is_finite()));
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_row_width_checked() {
        let model = TreeEnsemble::new(Objective::BinaryLogistic, names(3), vec![0.0], vec![]).unwrap();
        assert!(matches!(model.margins(&[1.0]), Err(InferenceError::Schema(_))));
    }

    #[test]
    fn test_invalid_trees_rejected() {
        let backward = Tree::new(
            0,
            vec![
                Node::Leaf { value: 0.0, cover: 1.0 },
                Node::Split {
                    feature: 0,
                    threshold: 0.0,
                    left: 0,
                    right: 2,
                    default_left: true,
                    cover: 1.0,
                },
                Node::Leaf { value: 0.0, cover: 1.0 },
            ],
        );
        assert!(TreeEnsemble::new(Objective::BinaryLogistic, names(1), vec![0.0], vec![backward]).is_err());

        let bad_feature = stump(0, 5, 0.0, 0.0, 0.0);
        assert!(TreeEnsemble::new(Objective::BinaryLogistic, names(2), vec![0.0], vec![bad_feature]).is_err());

        let bad_group = stump(4, 0, 0.0, 0.0, 0.0);
        assert!(TreeEnsemble::new(Objective::MultiSoftprob, names(1), vec![0.0; 3], vec![bad_group]).is_err());

        assert!(TreeEnsemble::new(Objective::MultiSoftprob, names(1), vec![0.0], vec![]).is_err());
        assert!(TreeEnsemble::new(Objective::BinaryLogistic, vec![], vec![0.0], vec![]).is_err());
    }

    #[test]
    fn test_load_json_artifact() {
        let json = r#"{
            "objective": "binary_logistic",
            "feature_names": ["a", "b"],
            "base_margin": [0.25],
            "trees": [{ "nodes": [
                { "kind": "split", "feature": 1, "threshold": 2.0, "left": 1, "right": 2, "cover": 5.0 },
                { "kind": "leaf", "value": 1.0, "cover": 3.0 },
                { "kind": "leaf", "value": -1.0, "cover": 2.0 }
            ] }]
        }"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let model = TreeEnsemble::load(file.path()).unwrap();
        assert_eq!(model.trees().len(), 1);
        assert_eq!(model.trees()[0].group(), 0);
        assert_eq!(model.margins(&[0.0, 1.0]).unwrap(), vec![1.25]);
    }

    #[test]
    fn test_load_errors_name_the_file() {
        let err = TreeEnsemble::load("/missing/model.json").unwrap_err();
        assert!(matches!(err, InferenceError::Io { .. }));
        assert!(err.to_string().contains("/missing/model.json"));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{\"objective\": \"unknown\"}").unwrap();
        let err = TreeEnsemble::load(file.path()).unwrap_err();
        assert!(matches!(err, InferenceError::Parse { .. }));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }
}
