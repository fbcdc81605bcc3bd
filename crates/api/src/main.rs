//! MachineGuard - Main Entry Point

use anyhow::Context;
use api::{config::Settings, init_logging, pipeline::Pipeline, serve, AppState};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load settings")?;
    init_logging(&settings.logging).context("failed to initialize logging")?;

    info!("=== MachineGuard v{} ===", env!("CARGO_PKG_VERSION"));

    let metrics = if settings.metrics.enabled {
        Some(
            PrometheusBuilder::new()
                .install_recorder()
                .context("failed to install Prometheus recorder")?,
        )
    } else {
        None
    };

    // Artifacts must load before the listener binds
    let pipeline = Pipeline::load(&settings.artifacts).with_context(|| {
        format!(
            "failed to load artifacts ({}, {}, {})",
            settings.artifacts.scaler_path, settings.artifacts.screener_path, settings.artifacts.classifier_path
        )
    })?;

    let state = Arc::new(AppState::new(pipeline, metrics));
    serve(state, &settings.server.bind_addr).await?;

    Ok(())
}
