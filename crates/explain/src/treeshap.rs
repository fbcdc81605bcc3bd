//! Exact TreeSHAP for gradient-boosted tree ensembles
//!
//! Path-dependent algorithm: the expectation over unknown features follows
//! the training cover recorded at each split. Contributions are in margin
//! space and, for one class, sum to `margin - expected_value`.

use crate::attribution::Explainer;
use crate::ExplainError;
use feature_engine::FeatureSchema;
use inference_engine::{Classifier, Node, Objective, Tree, TreeEnsemble};
use std::sync::Arc;
use tracing::debug;

/// Explainer over a shared tree ensemble
pub struct TreeExplainer {
    model: Arc<TreeEnsemble>,
    /// Baseline margin per output group
    expected: Vec<f64>,
}

impl TreeExplainer {
    pub fn new(model: Arc<TreeEnsemble>) -> Self {
        let mut expected = model.base_margin().to_vec();
        for tree in model.trees() {
            expected[tree.group()] += tree.expected_value();
        }
        debug!("Tree explainer baselines: {:?}", expected);
        Self { model, expected }
    }

    /// Binary models explain class 0 as the negated class-1 margin
    fn sign(&self, class_index: usize) -> f64 {
        match self.model.objective() {
            Objective::BinaryLogistic if class_index == 0 => -1.0,
            _ => 1.0,
        }
    }

    fn check_class(&self, class_index: usize) -> Result<usize, ExplainError> {
        let n_classes = self.model.n_classes();
        if class_index >= n_classes {
            return Err(ExplainError::ClassOutOfRange {
                class: class_index,
                n_classes,
            });
        }
        Ok(self.model.group_for_class(class_index))
    }
}

impl Explainer for TreeExplainer {
    fn feature_names(&self) -> &[String] {
        self.model.feature_names()
    }

    fn expected_value(&self, class_index: usize) -> Result<f64, ExplainError> {
        let group = self.check_class(class_index)?;
        Ok(self.sign(class_index) * self.expected[group])
    }

    fn contributions(&self, row: &[f64], class_index: usize) -> Result<Vec<f64>, ExplainError> {
        let group = self.check_class(class_index)?;
        FeatureSchema::check_width(self.model.feature_names().len(), row.len())?;

        let mut phi = vec![0.0; row.len()];
        for tree in self.model.trees().iter().filter(|t| t.group() == group) {
            tree_shap(tree, row, &mut phi);
        }

        let sign = self.sign(class_index);
        if sign < 0.0 {
            phi.iter_mut().for_each(|v| *v = -*v);
        }
        Ok(phi)
    }
}

#[derive(Debug, Clone, Copy)]
struct PathElement {
    /// `None` for the root sentinel
    feature: Option<usize>,
    zero_fraction: f64,
    one_fraction: f64,
    weight: f64,
}

/// Add one tree's contributions for `row` into `phi`
fn tree_shap(tree: &Tree, row: &[f64], phi: &mut [f64]) {
    if tree.nodes().is_empty() {
        return;
    }
    recurse(tree, row, phi, 0, &[], 1.0, 1.0, None);
}

#[allow(clippy::too_many_arguments)]
fn recurse(
    tree: &Tree,
    row: &[f64],
    phi: &mut [f64],
    node_idx: usize,
    parent_path: &[PathElement],
    zero_fraction: f64,
    one_fraction: f64,
    feature: Option<usize>,
) {
    let nodes = tree.nodes();
    let mut path = parent_path.to_vec();
    extend_path(&mut path, zero_fraction, one_fraction, feature);

    let node = &nodes[node_idx];
    match node {
        Node::Leaf { value, .. } => {
            for i in 1..path.len() {
                let weight = unwound_path_sum(&path, i);
                let el = path[i];
                if let Some(f) = el.feature {
                    phi[f] += weight * (el.one_fraction - el.zero_fraction) * value;
                }
            }
        }
        Node::Split {
            feature: split,
            left,
            right,
            cover,
            ..
        } => {
            let hot = node.next(row).unwrap_or(*left);
            let cold = if hot == *left { *right } else { *left };
            let hot_zero = nodes[hot].cover() / cover;
            let cold_zero = nodes[cold].cover() / cover;

            // Undo an earlier split on the same feature so it is counted once
            let mut incoming_zero = 1.0;
            let mut incoming_one = 1.0;
            if let Some(idx) = path.iter().position(|e| e.feature == Some(*split)) {
                incoming_zero = path[idx].zero_fraction;
                incoming_one = path[idx].one_fraction;
                unwind_path(&mut path, idx);
            }

            recurse(tree, row, phi, hot, &path, hot_zero * incoming_zero, incoming_one, Some(*split));
            recurse(tree, row, phi, cold, &path, cold_zero * incoming_zero, 0.0, Some(*split));
        }
    }
}

fn extend_path(path: &mut Vec<PathElement>, zero_fraction: f64, one_fraction: f64, feature: Option<usize>) {
    let depth = path.len();
    path.push(PathElement {
        feature,
        zero_fraction,
        one_fraction,
        weight: if depth == 0 { 1.0 } else { 0.0 },
    });

    let denom = (depth + 1) as f64;
    for i in (0..depth).rev() {
        path[i + 1].weight += one_fraction * path[i].weight * (i + 1) as f64 / denom;
        path[i].weight = zero_fraction * path[i].weight * (depth - i) as f64 / denom;
    }
}

fn unwind_path(path: &mut Vec<PathElement>, path_index: usize) {
    let depth = path.len() - 1;
    let one_fraction = path[path_index].one_fraction;
    let zero_fraction = path[path_index].zero_fraction;
    let denom = (depth + 1) as f64;
    let mut next_one_portion = path[depth].weight;

    for i in (0..depth).rev() {
        if one_fraction != 0.0 {
            let tmp = path[i].weight;
            path[i].weight = next_one_portion * denom / ((i + 1) as f64 * one_fraction);
            next_one_portion = tmp - path[i].weight * zero_fraction * (depth - i) as f64 / denom;
        } else {
            path[i].weight = path[i].weight * denom / (zero_fraction * (depth - i) as f64);
        }
    }

    // Weights stay positional; only the element identities shift down
    for i in path_index..depth {
        path[i].feature = path[i + 1].feature;
        path[i].zero_fraction = path[i + 1].zero_fraction;
        path[i].one_fraction = path[i + 1].one_fraction;
    }
    path.truncate(depth);
}

fn unwound_path_sum(path: &[PathElement], path_index: usize) -> f64 {
    let depth = path.len() - 1;
    let one_fraction = path[path_index].one_fraction;
    let zero_fraction = path[path_index].zero_fraction;
    let denom = (depth + 1) as f64;
    let mut next_one_portion = path[depth].weight;
    let mut total = 0.0;

    for i in (0..depth).rev() {
        if one_fraction != 0.0 {
            let tmp = next_one_portion * denom / ((i + 1) as f64 * one_fraction);
            total += tmp;
            next_one_portion = path[i].weight - tmp * zero_fraction * ((depth - i) as f64 / denom);
        } else if zero_fraction != 0.0 {
            total += (path[i].weight / zero_fraction) / ((depth - i) as f64 / denom);
        }
    }
    total
}
