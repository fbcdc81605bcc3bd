//! Prediction Routes

use axum::{extract::State, Json};
use explain::SummaryView;
use feature_engine::RawInput;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::report::{BatchReport, PredictionReport};
use crate::AppState;

/// Single-row response: the row's report plus the global view for that one row
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    #[serde(flatten)]
    pub report: PredictionReport,
    pub global_summary: SummaryView,
}

/// Request body for the batch endpoint
#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub rows: Vec<RawInput>,
}

/// Score one row
pub async fn predict(
    State(state): State<Arc<AppState>>,
    Json(raw): Json<RawInput>,
) -> ApiResult<Json<PredictResponse>> {
    let batch = state.pipeline.run_batch(std::slice::from_ref(&raw))?;
    let BatchReport { rows, summary } = batch;
    let report = rows
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::BadRequest("no report produced".to_string()))?;

    Ok(Json(PredictResponse {
        report,
        global_summary: summary,
    }))
}

/// Score several rows and summarize their attributions
pub async fn predict_batch(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BatchRequest>,
) -> ApiResult<Json<BatchReport>> {
    let report = state.pipeline.run_batch(&request.rows)?;
    Ok(Json(report))
}
