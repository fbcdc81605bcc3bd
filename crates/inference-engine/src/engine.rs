//! Inference Engine Implementation

use crate::classifier::{argmax_first, Classifier};
use crate::InferenceError;
use feature_engine::{FeatureSchema, FEATURE_SCHEMA, NUMERIC_WIDTH};
use preprocess::ScaledFeatureVector;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Allowed deviation of a probability distribution's sum from 1
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Screener label meaning "no failure"
const NO_FAILURE_LABEL: usize = 1;

/// Verdict of the binary screener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScreeningStatus {
    #[serde(rename = "No Failure")]
    NoFailure,
    #[serde(rename = "Failure Detected")]
    FailureDetected,
}

impl ScreeningStatus {
    /// Label 1 means no failure, anything else is a detection
    pub fn from_label(label: usize) -> Self {
        if label == NO_FAILURE_LABEL {
            ScreeningStatus::NoFailure
        } else {
            ScreeningStatus::FailureDetected
        }
    }

    /// Categorical flag fed to the fault classifier: 0 for no failure, 1 otherwise
    pub fn flag(&self) -> f64 {
        match self {
            ScreeningStatus::NoFailure => 0.0,
            ScreeningStatus::FailureDetected => 1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScreeningStatus::NoFailure => "No Failure",
            ScreeningStatus::FailureDetected => "Failure Detected",
        }
    }
}

/// Fault category, in the order of the classifier's outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaultClass {
    #[serde(rename = "No_failure")]
    NoFailure,
    #[serde(rename = "TWF")]
    ToolWear,
    #[serde(rename = "RNF")]
    Random,
    #[serde(rename = "PWF")]
    Power,
    #[serde(rename = "HDF")]
    HeatDissipation,
    #[serde(rename = "OSF")]
    Overstrain,
}

impl FaultClass {
    /// Output order of the fault classifier; also the argmax tie-break order
    pub const ALL: [FaultClass; 6] = [
        FaultClass::NoFailure,
        FaultClass::ToolWear,
        FaultClass::Random,
        FaultClass::Power,
        FaultClass::HeatDissipation,
        FaultClass::Overstrain,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FaultClass::NoFailure => "No_failure",
            FaultClass::ToolWear => "TWF",
            FaultClass::Random => "RNF",
            FaultClass::Power => "PWF",
            FaultClass::HeatDissipation => "HDF",
            FaultClass::Overstrain => "OSF",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            FaultClass::NoFailure => "No failure",
            FaultClass::ToolWear => "Tool wear failure",
            FaultClass::Random => "Random failure",
            FaultClass::Power => "Power failure",
            FaultClass::HeatDissipation => "Heat dissipation failure",
            FaultClass::Overstrain => "Overstrain failure",
        }
    }
}

/// Multi-class status line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaultStatus {
    #[serde(rename = "Good condition")]
    GoodCondition,
    #[serde(rename = "Fault identified")]
    FaultIdentified,
}

impl FaultStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultStatus::GoodCondition => "Good condition",
            FaultStatus::FaultIdentified => "Fault identified",
        }
    }
}

/// Result of the two-stage inference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Screener verdict
    pub screening: ScreeningStatus,
    /// Raw screener label
    pub screener_label: usize,
    /// Categorical flag appended for the fault classifier
    pub no_failure_flag: f64,
    /// Most probable fault class
    pub fault_class: FaultClass,
    /// Probability per fault class, in [`FaultClass::ALL`] order
    pub probabilities: [f64; 6],
}

impl Prediction {
    pub fn fault_status(&self) -> FaultStatus {
        if self.fault_class == FaultClass::NoFailure {
            FaultStatus::GoodCondition
        } else {
            FaultStatus::FaultIdentified
        }
    }

    /// Probability of the predicted class
    pub fn confidence(&self) -> f64 {
        self.probabilities[self.fault_class.index()]
    }
}

/// Two-stage orchestrator over injected, read-only model handles
pub struct InferenceEngine {
    screener: Arc<dyn Classifier>,
    classifier: Arc<dyn Classifier>,
}

impl InferenceEngine {
    /// Wire both models, checking their declared columns against the schema
    pub fn new(screener: Arc<dyn Classifier>, classifier: Arc<dyn Classifier>) -> Result<Self, InferenceError> {
        FEATURE_SCHEMA.validate_numeric("binary screener", screener.feature_names())?;
        FEATURE_SCHEMA.validate_all("fault classifier", classifier.feature_names())?;

        if screener.n_classes() != 2 {
            return Err(InferenceError::InvalidArtifact(format!(
                "binary screener has {} classes",
                screener.n_classes()
            )));
        }
        if classifier.n_classes() != FaultClass::ALL.len() {
            return Err(InferenceError::InvalidArtifact(format!(
                "fault classifier has {} classes, expected {}",
                classifier.n_classes(),
                FaultClass::ALL.len()
            )));
        }

        info!("Inference engine ready (schema v{})", FEATURE_SCHEMA.version);
        Ok(Self { screener, classifier })
    }

    /// Run screening then fault typing on one scaled row
    pub fn infer(&self, scaled: &ScaledFeatureVector) -> Result<Prediction, InferenceError> {
        // Stage A: screener sees the numeric columns only
        let numeric = scaled.values();
        FeatureSchema::check_width(self.screener.feature_names().len(), NUMERIC_WIDTH)?;
        let screener_label = self.screener.predict(numeric)?;
        let screening = ScreeningStatus::from_label(screener_label);
        debug!("Screener label {} -> {}", screener_label, screening.as_str());

        // Stage B: the screener verdict becomes an input feature
        let no_failure_flag = screening.flag();
        let row = scaled.with_flag(no_failure_flag);
        FeatureSchema::check_width(self.classifier.feature_names().len(), row.len())?;
        let proba = self.classifier.predict_proba(&row)?;
        let probabilities = validate_distribution(&proba)?;

        let class_index = argmax_first(&probabilities)
            .ok_or_else(|| InferenceError::InferenceFailed("empty distribution".to_string()))?;
        let fault_class = FaultClass::from_index(class_index)
            .ok_or_else(|| InferenceError::InferenceFailed(format!("class index {} out of range", class_index)))?;
        debug!(
            "Fault classifier: {} (p={:.4}, flag={})",
            fault_class.as_str(),
            probabilities[class_index],
            no_failure_flag
        );

        Ok(Prediction {
            screening,
            screener_label,
            no_failure_flag,
            fault_class,
            probabilities,
        })
    }
}

/// Check the classifier produced a proper six-class distribution
fn validate_distribution(proba: &[f64]) -> Result<[f64; 6], InferenceError> {
    let probabilities: [f64; 6] = proba.try_into().map_err(|_| {
        InferenceError::InvalidDistribution(format!("expected {} classes, got {}", FaultClass::ALL.len(), proba.len()))
    })?;

    if let Some(bad) = probabilities.iter().find(|p| !p.is_finite() || **p < 0.0) {
        return Err(InferenceError::InvalidDistribution(format!("invalid probability {}", bad)));
    }
    let total: f64 = probabilities.iter().sum();
    if (total - 1.0).abs() > PROBABILITY_TOLERANCE {
        return Err(InferenceError::InvalidDistribution(format!("probabilities sum to {}", total)));
    }
    Ok(probabilities)
}
