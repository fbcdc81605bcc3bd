//! End-to-end tests against the bundled artifacts

use api::{config::ArtifactSettings, create_router, pipeline::Pipeline, AppState};
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use explain::SINGLE_ROW_SUMMARY_NOTICE;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn artifacts() -> ArtifactSettings {
    let root = concat!(env!("CARGO_MANIFEST_DIR"), "/../../artifacts");
    ArtifactSettings {
        scaler_path: format!("{root}/preprocess/scaler_single_class.json"),
        screener_path: format!("{root}/model/single_class_model.json"),
        classifier_path: format!("{root}/model/multi_class_model.json"),
    }
}

fn app() -> Router {
    let pipeline = Pipeline::load(&artifacts()).unwrap();
    create_router(Arc::new(AppState::new(pipeline, None)))
}

fn reference_row() -> Value {
    json!({
        "Type": 0.0,
        "Air_temperature_[K]": 300.0,
        "Process_temperature_[K]": 310.0,
        "Rotational_speed_[rpm]": 1500.0,
        "Torque_[Nm]": 40.0,
        "Tool_wear_[min]": 10.0
    })
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn test_reference_row_is_deterministic() {
    let (status, first) = post_json(app(), "/api/v1/predict", reference_row()).await;
    assert_eq!(status, StatusCode::OK);
    let (_, second) = post_json(app(), "/api/v1/predict", reference_row()).await;
    assert_eq!(first, second);

    assert_eq!(first["binary_status"], "No Failure");
    assert_eq!(first["prediction"]["no_failure_flag"], 0.0);
    assert_eq!(first["features"]["Temp_Delta"], 10.0);

    let probabilities = first["probabilities"].as_array().unwrap();
    assert_eq!(probabilities.len(), 6);
    let total: f64 = probabilities
        .iter()
        .map(|p| p["probability"].as_f64().unwrap())
        .sum();
    assert!((total - 1.0).abs() < 1e-6);

    let contributions = first["attribution"]["contributions"].as_array().unwrap();
    assert_eq!(contributions.len(), 11);
}

#[tokio::test]
async fn test_single_row_has_summary_notice() {
    let (_, body) = post_json(app(), "/api/v1/predict", reference_row()).await;
    assert_eq!(body["global_summary"]["status"], "skipped");
    assert_eq!(body["global_summary"]["notice"], SINGLE_ROW_SUMMARY_NOTICE);
}

#[tokio::test]
async fn test_batch_has_global_summary() {
    let mut strained = reference_row();
    strained["Torque_[Nm]"] = json!(70.0);
    let (status, body) = post_json(
        app(),
        "/api/v1/predict/batch",
        json!({ "rows": [reference_row(), strained] }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rows"].as_array().unwrap().len(), 2);
    assert_eq!(body["rows"][1]["binary_status"], "Failure Detected");
    assert_eq!(body["summary"]["status"], "available");
    assert_eq!(body["summary"]["rows"], 2);
}

#[tokio::test]
async fn test_empty_batch_is_rejected() {
    let (status, body) = post_json(app(), "/api/v1/predict/batch", json!({ "rows": [] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn test_missing_fields_default_to_zero() {
    let (status, body) = post_json(app(), "/api/v1/predict", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["inputs"]["Torque_[Nm]"], 0.0);
}

#[tokio::test]
async fn test_dashboard_renders_form_and_results() {
    let (status, html) = get(
        app(),
        "/?Torque_%5BNm%5D=40&Air_temperature_%5BK%5D=300&Process_temperature_%5BK%5D=310&Rotational_speed_%5Brpm%5D=1500&Tool_wear_%5Bmin%5D=10",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("<form"));
    assert!(html.contains("Multi-Class Predicted Probabilities"));
    assert!(html.contains("No Failure"));
}

#[tokio::test]
async fn test_dashboard_blank_field_reads_as_zero() {
    let (status, html) = get(
        app(),
        "/?Type=&Air_temperature_%5BK%5D=300&Process_temperature_%5BK%5D=310&Rotational_speed_%5Brpm%5D=1500&Torque_%5BNm%5D=40&Tool_wear_%5Bmin%5D=10",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("name=\"Type\" value=\"0\""));
    assert!(html.contains("Multi-Class Predicted Probabilities"));
    assert!(!html.contains("Prediction failed"));
}

#[tokio::test]
async fn test_dashboard_non_numeric_field_shows_error() {
    let (status, html) = get(app(), "/?Torque_%5BNm%5D=abc&Rotational_speed_%5Brpm%5D=1500").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("<form"));
    assert!(html.contains("class=\"error\""));
    assert!(html.contains("Torque_[Nm] = &quot;abc&quot; is not a number"));
    assert!(!html.contains("Multi-Class Predicted Probabilities"));
}

#[tokio::test]
async fn test_health_and_schema() {
    let (status, health) = get(app(), "/api/v1/health").await;
    assert_eq!(status, StatusCode::OK);
    let health: Value = serde_json::from_str(&health).unwrap();
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["schema_version"], 1);
    assert_eq!(health["components"]["metrics"], "disabled");

    let (status, schema) = get(app(), "/api/v1/schema").await;
    assert_eq!(status, StatusCode::OK);
    let schema: Value = serde_json::from_str(&schema).unwrap();
    assert_eq!(schema["schema"]["numeric"][6], "Temp_Delta");
    assert_eq!(schema["schema"]["categorical"][0], "No_failure");
    assert_eq!(schema["fault_classes"][5]["code"], "OSF");
}

#[tokio::test]
async fn test_metrics_disabled_is_not_found() {
    let (status, _) = get(app(), "/metrics").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
