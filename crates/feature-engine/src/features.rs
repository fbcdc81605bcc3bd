//! Feature Vector Assembly

use crate::input::RawInput;
use crate::schema::NUMERIC_WIDTH;
use serde::Serialize;
use std::f64::consts::PI;
use tracing::debug;

/// Guard added to torque before dividing by it
pub const EPSILON: f64 = 1e-5;

/// Raw readings plus the four engineered features.
///
/// Derived fields are private and only produced by [`compute_features`], so a
/// vector can never carry values computed from stale raw readings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector {
    #[serde(flatten)]
    raw: RawInput,
    #[serde(rename = "Temp_Delta")]
    temperature_delta: f64,
    #[serde(rename = "Power_[W]")]
    power: f64,
    #[serde(rename = "Wear_per_Torque")]
    wear_per_torque: f64,
    #[serde(rename = "Speed_Torque_Ratio")]
    speed_torque_ratio: f64,
}

impl FeatureVector {
    pub fn raw(&self) -> &RawInput {
        &self.raw
    }

    /// Process minus air temperature (K)
    pub fn temperature_delta(&self) -> f64 {
        self.temperature_delta
    }

    /// Mechanical power (W)
    pub fn power(&self) -> f64 {
        self.power
    }

    pub fn wear_per_torque(&self) -> f64 {
        self.wear_per_torque
    }

    pub fn speed_torque_ratio(&self) -> f64 {
        self.speed_torque_ratio
    }

    /// Numeric values in [`FEATURE_SCHEMA`](crate::FEATURE_SCHEMA) order
    pub fn to_array(&self) -> [f64; NUMERIC_WIDTH] {
        let [machine_type, air, process, speed, torque, wear] = self.raw.values();
        [
            machine_type,
            air,
            process,
            speed,
            torque,
            wear,
            self.temperature_delta,
            self.power,
            self.wear_per_torque,
            self.speed_torque_ratio,
        ]
    }
}

/// Derive engineered features from raw readings.
///
/// No range validation is performed. A torque near zero yields very large
/// but finite ratios.
pub fn compute_features(raw: &RawInput) -> FeatureVector {
    let guarded_torque = raw.torque + EPSILON;
    let features = FeatureVector {
        raw: *raw,
        temperature_delta: raw.process_temperature - raw.air_temperature,
        power: raw.torque * (raw.rotational_speed * 2.0 * PI / 60.0),
        wear_per_torque: raw.tool_wear / guarded_torque,
        speed_torque_ratio: raw.rotational_speed / guarded_torque,
    };

    debug!(
        "Engineered features: delta={:.3}, power={:.3}, wear/torque={:.3}, speed/torque={:.3}",
        features.temperature_delta,
        features.power,
        features.wear_per_torque,
        features.speed_torque_ratio
    );

    features
}
