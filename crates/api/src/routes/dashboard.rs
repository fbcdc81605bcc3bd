//! Dashboard Route

use axum::{
    extract::{Query, State},
    response::Html,
};
use feature_engine::{RawInput, FEATURE_SCHEMA};
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

use crate::render::render_dashboard;
use crate::AppState;

/// Form fields exactly as the browser submits them.
///
/// A cleared number input arrives as an empty string, so fields are taken
/// as text and parsed here rather than by the query extractor.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DashboardForm {
    #[serde(rename = "Type")]
    machine_type: String,
    #[serde(rename = "Air_temperature_[K]")]
    air_temperature: String,
    #[serde(rename = "Process_temperature_[K]")]
    process_temperature: String,
    #[serde(rename = "Rotational_speed_[rpm]")]
    rotational_speed: String,
    #[serde(rename = "Torque_[Nm]")]
    torque: String,
    #[serde(rename = "Tool_wear_[min]")]
    tool_wear: String,
}

impl DashboardForm {
    /// Blank fields read as 0.0. Returns the input plus one message per
    /// field that is not a number; those fields are left at 0.0.
    pub fn parse(&self) -> (RawInput, Vec<String>) {
        let fields = [
            &self.machine_type,
            &self.air_temperature,
            &self.process_temperature,
            &self.rotational_speed,
            &self.torque,
            &self.tool_wear,
        ];

        let mut values = [0.0; 6];
        let mut invalid = Vec::new();
        for ((slot, text), name) in values.iter_mut().zip(fields).zip(FEATURE_SCHEMA.numeric_names()) {
            let text = text.trim();
            if text.is_empty() {
                continue;
            }
            match text.parse::<f64>() {
                Ok(value) => *slot = value,
                Err(_) => invalid.push(format!("{} = \"{}\" is not a number", name, text)),
            }
        }
        (RawInput::from_values(values), invalid)
    }
}

/// Render the dashboard; every form field is optional and defaults to 0
pub async fn index(State(state): State<Arc<AppState>>, Query(form): Query<DashboardForm>) -> Html<String> {
    let (raw, invalid) = form.parse();
    let outcome = if invalid.is_empty() {
        state.pipeline.run_batch(std::slice::from_ref(&raw)).map_err(|err| {
            warn!("Dashboard prediction failed: {}", err);
            err.to_string()
        })
    } else {
        warn!("Dashboard input rejected: {}", invalid.join("; "));
        Err(format!("invalid input: {}", invalid.join("; ")))
    };
    Html(render_dashboard(&raw, outcome.as_ref().map_err(Clone::clone)))
}
