//! Attribution Views
//!
//! Local views (force, waterfall) describe one row. The global summary
//! averages attribution magnitudes across rows and is only meaningful for
//! more than one row.

use crate::attribution::{Attribution, FeatureContribution};
use crate::ExplainError;
use serde::{Deserialize, Serialize};

/// Notice shown in place of the global summary for a single row
pub const SINGLE_ROW_SUMMARY_NOTICE: &str =
    "SHAP summary requires multiple rows. Force and waterfall plots shown for single prediction.";

fn by_magnitude(a: &FeatureContribution, b: &FeatureContribution) -> std::cmp::Ordering {
    b.contribution.abs().total_cmp(&a.contribution.abs())
}

/// Contributions split by the direction they push the output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForcePlot {
    pub base_value: f64,
    pub output_value: f64,
    /// Pushing the output higher, largest first
    pub higher: Vec<FeatureContribution>,
    /// Pushing the output lower, largest magnitude first
    pub lower: Vec<FeatureContribution>,
}

impl ForcePlot {
    pub fn from_attribution(attribution: &Attribution) -> Self {
        let mut higher: Vec<_> = attribution
            .contributions
            .iter()
            .filter(|c| c.contribution > 0.0)
            .cloned()
            .collect();
        let mut lower: Vec<_> = attribution
            .contributions
            .iter()
            .filter(|c| c.contribution < 0.0)
            .cloned()
            .collect();
        higher.sort_by(by_magnitude);
        lower.sort_by(by_magnitude);

        Self {
            base_value: attribution.expected_value,
            output_value: attribution.output_value(),
            higher,
            lower,
        }
    }
}

/// One bar of a waterfall chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterfallStep {
    pub label: String,
    /// Feature value, absent for the folded remainder
    pub value: Option<f64>,
    pub contribution: f64,
    pub start: f64,
    pub end: f64,
}

/// Cumulative walk from the baseline to the model output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waterfall {
    pub base_value: f64,
    pub output_value: f64,
    pub steps: Vec<WaterfallStep>,
}

impl Waterfall {
    /// Build a waterfall, largest contributions first.
    ///
    /// With `max_display`, at most that many bars are produced; the smallest
    /// contributions are folded into a single "N other features" bar.
    pub fn from_attribution(attribution: &Attribution, max_display: Option<usize>) -> Self {
        let mut ordered = attribution.contributions.clone();
        ordered.sort_by(by_magnitude);

        let shown = match max_display {
            Some(max) if max > 0 && ordered.len() > max => max - 1,
            _ => ordered.len(),
        };
        let folded = ordered.split_off(shown);

        let mut running = attribution.expected_value;
        let mut steps = Vec::with_capacity(ordered.len() + 1);
        for c in ordered {
            let start = running;
            running += c.contribution;
            steps.push(WaterfallStep {
                label: c.feature,
                value: Some(c.value),
                contribution: c.contribution,
                start,
                end: running,
            });
        }
        if !folded.is_empty() {
            let contribution: f64 = folded.iter().map(|c| c.contribution).sum();
            let start = running;
            running += contribution;
            steps.push(WaterfallStep {
                label: format!("{} other features", folded.len()),
                value: None,
                contribution,
                start,
                end: running,
            });
        }

        Self {
            base_value: attribution.expected_value,
            output_value: running,
            steps,
        }
    }
}

/// Mean absolute contribution of one feature across rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub mean_abs_contribution: f64,
}

/// Global importance across several explained rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalSummary {
    pub rows: usize,
    /// Most important first
    pub importance: Vec<FeatureImportance>,
}

/// Global view, or the reason it was skipped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SummaryView {
    Available(GlobalSummary),
    Skipped { notice: String },
}

impl GlobalSummary {
    /// Summarize the attributions of several rows.
    ///
    /// Fewer than two rows yields [`SummaryView::Skipped`] with
    /// [`SINGLE_ROW_SUMMARY_NOTICE`].
    pub fn from_attributions(attributions: &[Attribution]) -> Result<SummaryView, ExplainError> {
        let Some(first) = attributions.first().filter(|_| attributions.len() > 1) else {
            return Ok(SummaryView::Skipped {
                notice: SINGLE_ROW_SUMMARY_NOTICE.to_string(),
            });
        };

        let width = first.contributions.len();
        let mut totals = vec![0.0; width];
        for attribution in attributions {
            let consistent = attribution.contributions.len() == width
                && attribution
                    .contributions
                    .iter()
                    .zip(&first.contributions)
                    .all(|(a, b)| a.feature == b.feature);
            if !consistent {
                return Err(ExplainError::InconsistentRows);
            }
            for (total, c) in totals.iter_mut().zip(&attribution.contributions) {
                *total += c.contribution.abs();
            }
        }

        let rows = attributions.len();
        let mut importance: Vec<_> = first
            .contributions
            .iter()
            .zip(totals)
            .map(|(c, total)| FeatureImportance {
                feature: c.feature.clone(),
                mean_abs_contribution: total / rows as f64,
            })
            .collect();
        importance.sort_by(|a, b| b.mean_abs_contribution.total_cmp(&a.mean_abs_contribution));

        Ok(SummaryView::Available(GlobalSummary { rows, importance }))
    }
}
