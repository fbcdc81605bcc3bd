//! Feature Attribution
//!
//! Explains the fault classifier's output for one class as per-feature
//! contributions relative to a baseline expected value.

mod attribution;
mod treeshap;
mod views;

pub use attribution::{explain, Attribution, Explainer, FeatureContribution};
pub use treeshap::TreeExplainer;
pub use views::{
    FeatureImportance, ForcePlot, GlobalSummary, SummaryView, Waterfall, WaterfallStep,
    SINGLE_ROW_SUMMARY_NOTICE,
};

use feature_engine::SchemaError;
use thiserror::Error;

/// Errors while computing attributions
#[derive(Debug, Error)]
pub enum ExplainError {
    #[error("Class index {class} out of range ({n_classes} classes)")]
    ClassOutOfRange { class: usize, n_classes: usize },
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("Attributions cover different features and cannot be summarized")]
    InconsistentRows,
}
