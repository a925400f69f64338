// src/tuning/drone.rs

use serde::Serialize;

use crate::constants::CELL_VOLTAGE_NOMINAL;

/// Airframe geometry class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameType {
    #[default]
    X,
    H,
}

impl FrameType {
    pub fn from_name(name: &str) -> Option<FrameType> {
        match name.trim().to_lowercase().as_str() {
            "x" => Some(FrameType::X),
            "h" => Some(FrameType::H),
            _ => None,
        }
    }
}

/// Physical parameters of the craft, supplied by the caller. Defaults
/// describe a common 5-inch freestyle build.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DroneParameters {
    pub prop_size_inches: f64,
    pub weight_grams: f64,
    pub cell_count: u32,
    pub motor_kv: u32,
    pub frame_type: FrameType,
}

impl Default for DroneParameters {
    fn default() -> Self {
        DroneParameters {
            prop_size_inches: 5.0,
            weight_grams: 450.0,
            cell_count: 4,
            motor_kv: 1900,
            frame_type: FrameType::X,
        }
    }
}

impl DroneParameters {
    /// Nominal pack voltage from the cell count.
    pub fn battery_voltage(&self) -> f64 {
        self.cell_count as f64 * CELL_VOLTAGE_NOMINAL
    }
}


// src/tuning/drone.rs
