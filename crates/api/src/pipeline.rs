//! Scoring Pipeline
//!
//! raw input → engineered features → scaled features → screener →
//! fault classifier → attribution. Every call recomputes from scratch; the
//! artifacts are injected once and only read.

use crate::config::ArtifactSettings;
use crate::error::PipelineError;
use crate::report::{BatchReport, PredictionReport};
use explain::{explain, Attribution, Explainer, GlobalSummary, TreeExplainer};
use feature_engine::{compute_features, FeatureVector, RawInput, FEATURE_SCHEMA};
use inference_engine::{Classifier, InferenceEngine, Prediction, TreeEnsemble};
use preprocess::{scale, ScaledFeatureVector, Scaler, StandardScaler};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Everything computed for one input row
#[derive(Debug, Clone)]
pub struct ScoredRow {
    pub raw: RawInput,
    pub features: FeatureVector,
    pub scaled: ScaledFeatureVector,
    pub prediction: Prediction,
    pub attribution: Attribution,
    /// Time spent scoring this row alone
    pub elapsed: Duration,
}

pub struct Pipeline {
    scaler: Arc<dyn Scaler>,
    engine: InferenceEngine,
    explainer: Arc<dyn Explainer>,
}

impl Pipeline {
    /// Wire the artifacts together, validating each against the feature schema
    pub fn new(
        scaler: Arc<dyn Scaler>,
        screener: Arc<dyn Classifier>,
        classifier: Arc<dyn Classifier>,
        explainer: Arc<dyn Explainer>,
    ) -> Result<Self, PipelineError> {
        FEATURE_SCHEMA.validate_numeric("scaler", scaler.feature_names())?;
        FEATURE_SCHEMA.validate_all("explainer", explainer.feature_names())?;
        let engine = InferenceEngine::new(screener, classifier)?;
        Ok(Self {
            scaler,
            engine,
            explainer,
        })
    }

    /// Load the three artifacts from disk. Any failure here is fatal.
    pub fn load(artifacts: &ArtifactSettings) -> Result<Self, PipelineError> {
        let scaler = Arc::new(StandardScaler::load(&artifacts.scaler_path)?);
        let screener = Arc::new(TreeEnsemble::load(&artifacts.screener_path)?);
        let classifier = Arc::new(TreeEnsemble::load(&artifacts.classifier_path)?);
        let explainer = Arc::new(TreeExplainer::new(classifier.clone()));

        let pipeline = Self::new(scaler, screener, classifier, explainer)?;
        info!("Pipeline ready: scaler, screener and fault classifier loaded");
        Ok(pipeline)
    }

    /// Score and explain one row
    pub fn score(&self, raw: &RawInput) -> Result<ScoredRow, PipelineError> {
        let start = Instant::now();
        let features = compute_features(raw);
        let scaled = scale(&features, self.scaler.as_ref())?;
        let prediction = self.engine.infer(&scaled)?;

        let row = scaled.with_flag(prediction.no_failure_flag);
        let attribution = explain(self.explainer.as_ref(), &row, prediction.fault_class.index())?;

        debug!(
            "Scored row: {} / {}",
            prediction.screening.as_str(),
            prediction.fault_class.as_str()
        );
        Ok(ScoredRow {
            raw: *raw,
            features,
            scaled,
            prediction,
            attribution,
            elapsed: start.elapsed(),
        })
    }

    /// Full dashboard report for one row
    pub fn run(&self, raw: &RawInput) -> Result<PredictionReport, PipelineError> {
        let scored = self.score(raw)?;
        record_metrics(&scored);
        Ok(PredictionReport::from_scored(scored))
    }

    /// Reports for several rows plus the global attribution summary
    pub fn run_batch(&self, rows: &[RawInput]) -> Result<BatchReport, PipelineError> {
        if rows.is_empty() {
            return Err(PipelineError::EmptyBatch);
        }

        let scored = self.score_all(rows)?;
        let attributions: Vec<Attribution> = scored.iter().map(|s| s.attribution.clone()).collect();
        let summary = GlobalSummary::from_attributions(&attributions)?;
        debug!("Batch of {} rows scored", scored.len());

        Ok(BatchReport {
            rows: scored.into_iter().map(PredictionReport::from_scored).collect(),
            summary,
        })
    }

    /// Score every row, recording metrics per row
    fn score_all(&self, rows: &[RawInput]) -> Result<Vec<ScoredRow>, PipelineError> {
        let scored = rows
            .iter()
            .map(|raw| self.score(raw))
            .collect::<Result<Vec<_>, _>>()?;
        scored.iter().for_each(record_metrics);
        Ok(scored)
    }
}

fn record_metrics(scored: &ScoredRow) {
    metrics::counter!("machineguard_predictions_total", "fault" => scored.prediction.fault_class.as_str()).increment(1);
    metrics::histogram!("machineguard_pipeline_seconds").record(scored.elapsed.as_secs_f64());
}
