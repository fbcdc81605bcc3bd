//! Display Shaping

use crate::pipeline::ScoredRow;
use explain::{Attribution, ForcePlot, SummaryView, Waterfall};
use feature_engine::{FeatureVector, RawInput};
use inference_engine::{FaultClass, FaultStatus, Prediction, ScreeningStatus};
use serde::Serialize;

/// Bars shown in the waterfall before the rest are folded together
pub const WATERFALL_MAX_DISPLAY: usize = 10;

/// One line of the probability table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbabilityRow {
    pub fault_type: FaultClass,
    pub description: &'static str,
    pub probability: f64,
    /// Probability formatted for display, e.g. `"12.34%"`
    pub percentage: String,
}

pub fn format_percentage(probability: f64) -> String {
    format!("{:.2}%", probability * 100.0)
}

/// Everything the dashboard shows for one row
#[derive(Debug, Clone, Serialize)]
pub struct PredictionReport {
    pub inputs: RawInput,
    pub features: FeatureVector,
    pub binary_status: ScreeningStatus,
    pub multi_class_status: FaultStatus,
    /// Only present when a fault is identified
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted_fault: Option<FaultClass>,
    pub prediction: Prediction,
    pub probabilities: Vec<ProbabilityRow>,
    pub attribution: Attribution,
    pub force_plot: ForcePlot,
    pub waterfall: Waterfall,
}

impl PredictionReport {
    pub fn from_scored(scored: ScoredRow) -> Self {
        let prediction = scored.prediction;
        let multi_class_status = prediction.fault_status();
        let predicted_fault =
            (multi_class_status == FaultStatus::FaultIdentified).then_some(prediction.fault_class);

        let probabilities = FaultClass::ALL
            .iter()
            .zip(prediction.probabilities)
            .map(|(class, probability)| ProbabilityRow {
                fault_type: *class,
                description: class.description(),
                probability,
                percentage: format_percentage(probability),
            })
            .collect();

        let force_plot = ForcePlot::from_attribution(&scored.attribution);
        let waterfall = Waterfall::from_attribution(&scored.attribution, Some(WATERFALL_MAX_DISPLAY));

        Self {
            inputs: scored.raw,
            features: scored.features,
            binary_status: prediction.screening,
            multi_class_status,
            predicted_fault,
            prediction,
            probabilities,
            attribution: scored.attribution,
            force_plot,
            waterfall,
        }
    }
}

/// Reports for a batch of rows plus the global attribution view
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub rows: Vec<PredictionReport>,
    pub summary: SummaryView,
}
