//! Application Settings
//!
//! Layered: built-in defaults, then an optional config file, then
//! `MACHINEGUARD__SECTION__KEY` environment variables.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Config file looked up when `MACHINEGUARD_CONFIG` is unset (any supported extension)
pub const DEFAULT_CONFIG_FILE: &str = "machineguard";

pub const DEFAULT_SCALER_PATH: &str = "artifacts/preprocess/scaler_single_class.json";
pub const DEFAULT_SCREENER_PATH: &str = "artifacts/model/single_class_model.json";
pub const DEFAULT_CLASSIFIER_PATH: &str = "artifacts/model/multi_class_model.json";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub artifacts: ArtifactSettings,
    pub logging: LoggingSettings,
    pub metrics: MetricsSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub bind_addr: String,
}

/// Locations of the three pretrained artifacts
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactSettings {
    pub scaler_path: String,
    pub screener_path: String,
    pub classifier_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// `trace`, `debug`, `info`, `warn` or `error`
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    pub enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                bind_addr: "0.0.0.0:8080".to_string(),
            },
            artifacts: ArtifactSettings {
                scaler_path: DEFAULT_SCALER_PATH.to_string(),
                screener_path: DEFAULT_SCREENER_PATH.to_string(),
                classifier_path: DEFAULT_CLASSIFIER_PATH.to_string(),
            },
            logging: LoggingSettings {
                level: "info".to_string(),
                json: false,
            },
            metrics: MetricsSettings { enabled: true },
        }
    }
}

impl Settings {
    /// Load from `MACHINEGUARD_CONFIG` (or the default file name) and the environment
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("MACHINEGUARD_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(&path)
    }

    /// Load with an explicit config file path; a missing file is not an error
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let defaults = Settings::default();
        Config::builder()
            .set_default("server.bind_addr", defaults.server.bind_addr)?
            .set_default("artifacts.scaler_path", defaults.artifacts.scaler_path)?
            .set_default("artifacts.screener_path", defaults.artifacts.screener_path)?
            .set_default("artifacts.classifier_path", defaults.artifacts.classifier_path)?
            .set_default("logging.level", defaults.logging.level)?
            .set_default("logging.json", defaults.logging.json)?
            .set_default("metrics.enabled", defaults.metrics.enabled)?
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("MACHINEGUARD").separator("__"))
            .build()?
            .try_deserialize()
    }
}
