//! Raw Sensor Input

use serde::{Deserialize, Serialize};

/// Six manually entered machine readings.
///
/// Field names on the wire match the column names the artifacts were fit
/// on. Missing fields default to `0.0`; no range checks are applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawInput {
    /// Machine type code (quality variant)
    #[serde(rename = "Type")]
    pub machine_type: f64,
    /// Air temperature (K)
    #[serde(rename = "Air_temperature_[K]")]
    pub air_temperature: f64,
    /// Process temperature (K)
    #[serde(rename = "Process_temperature_[K]")]
    pub process_temperature: f64,
    /// Rotational speed (rpm)
    #[serde(rename = "Rotational_speed_[rpm]")]
    pub rotational_speed: f64,
    /// Torque (Nm)
    #[serde(rename = "Torque_[Nm]")]
    pub torque: f64,
    /// Tool wear (min)
    #[serde(rename = "Tool_wear_[min]")]
    pub tool_wear: f64,
}

impl RawInput {
    /// Raw values in schema order
    pub fn values(&self) -> [f64; 6] {
        [
            self.machine_type,
            self.air_temperature,
            self.process_temperature,
            self.rotational_speed,
            self.torque,
            self.tool_wear,
        ]
    }

    /// Inverse of [`RawInput::values`]
    pub fn from_values(values: [f64; 6]) -> Self {
        let [machine_type, air_temperature, process_temperature, rotational_speed, torque, tool_wear] = values;
        Self {
            machine_type,
            air_temperature,
            process_temperature,
            rotational_speed,
            torque,
            tool_wear,
        }
    }
}
