//! Schema Route

use axum::Json;
use feature_engine::{FeatureSchema, FEATURE_SCHEMA};
use inference_engine::FaultClass;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct FaultClassInfo {
    pub index: usize,
    pub code: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SchemaResponse {
    pub schema: FeatureSchema,
    pub fault_classes: Vec<FaultClassInfo>,
}

/// Column layout the artifacts were validated against, plus the fault classes
pub async fn get_schema() -> Json<SchemaResponse> {
    let fault_classes = FaultClass::ALL
        .iter()
        .map(|class| FaultClassInfo {
            index: class.index(),
            code: class.as_str(),
            description: class.description(),
        })
        .collect();

    Json(SchemaResponse {
        schema: FEATURE_SCHEMA,
        fault_classes,
    })
}
