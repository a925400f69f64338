// src/data_input/sample_filter.rs
//
// Sample preparation: plausibility gating of raw rows and extraction of
// aligned per-signal channels. Rows failing the gate are dropped whole,
// never repaired, so every extracted channel stays index-aligned.

use log::{debug, info};

use crate::constants::{
    GYRO_PLAUSIBLE_LIMIT_DEG_S, MIN_VALID_ROWS, MOTOR_OUTPUT_MAX, MOTOR_OUTPUT_MIN,
};
use crate::data_input::log_data::{LogRowData, MOTOR_COUNT};
use crate::error::AnalysisError;

/// Aligned, immutable channel arrays extracted from accepted rows.
///
/// A `None` channel was absent from the log; a present channel has the
/// same length as `time`, with missing per-row values defaulted to 0
/// (documented lossy fallback, not an error).
#[derive(Debug, Clone)]
pub struct ChannelSet {
    pub time: Vec<f64>,
    pub gyro: [Option<Vec<f64>>; 3],
    pub setpoint: [Option<Vec<f64>>; 4],
    pub rc_command: [Option<Vec<f64>>; 4],
    pub p_term: [Option<Vec<f64>>; 3],
    pub i_term: [Option<Vec<f64>>; 3],
    pub d_term: [Option<Vec<f64>>; 3],
    pub f_term: [Option<Vec<f64>>; 3],
    pub motor: [Option<Vec<f64>>; MOTOR_COUNT],
    pub battery_voltage: Option<Vec<f64>>,
    pub battery_current: Option<Vec<f64>>,
}

impl ChannelSet {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// The commanded channel for an axis: `rcCommand` when logged,
    /// otherwise `setpoint` (same fallback chain direction as the
    /// unfiltered-gyro/debug chain in blackbox exports).
    pub fn command_channel(&self, axis: usize) -> Option<&[f64]> {
        self.rc_command[axis]
            .as_deref()
            .or(self.setpoint[axis].as_deref())
    }

    /// Throttle channel: rcCommand[3] when logged, else setpoint[3].
    pub fn throttle_channel(&self) -> Option<&[f64]> {
        self.command_channel(3)
    }
}

/// Validates rows and extracts one aligned channel per signal.
///
/// A row is accepted only when every gyro value present in it is under
/// `GYRO_PLAUSIBLE_LIMIT_DEG_S` in magnitude and every motor value
/// present lies in `[MOTOR_OUTPUT_MIN, MOTOR_OUTPUT_MAX]`. Absent
/// channels never reject a row; they stay absent in the output.
pub fn prepare_channels(rows: &[LogRowData]) -> Result<ChannelSet, AnalysisError> {
    let accepted: Vec<&LogRowData> = rows.iter().filter(|row| row_is_plausible(row)).collect();
    debug!("{} of {} rows passed the plausibility gate", accepted.len(), rows.len());

    if accepted.len() < MIN_VALID_ROWS {
        return Err(AnalysisError::InsufficientData {
            need: MIN_VALID_ROWS,
            got: accepted.len(),
        });
    }

    let time: Vec<f64> = accepted
        .iter()
        .map(|row| row.time_sec.unwrap_or(0.0))
        .collect();

    let gyro = std::array::from_fn(|axis| extract(&accepted, |row| row.gyro[axis]));
    let setpoint = std::array::from_fn(|ch| extract(&accepted, |row| row.setpoint[ch]));
    let rc_command = std::array::from_fn(|ch| extract(&accepted, |row| row.rc_command[ch]));
    let p_term = std::array::from_fn(|axis| extract(&accepted, |row| row.p_term[axis]));
    let i_term = std::array::from_fn(|axis| extract(&accepted, |row| row.i_term[axis]));
    let d_term = std::array::from_fn(|axis| extract(&accepted, |row| row.d_term[axis]));
    let f_term = std::array::from_fn(|axis| extract(&accepted, |row| row.f_term[axis]));
    let motor = std::array::from_fn(|m| extract(&accepted, |row| row.motor[m]));
    let battery_voltage = extract(&accepted, |row| row.battery_voltage);
    let battery_current = extract(&accepted, |row| row.battery_current);

    info!("Prepared {} aligned samples", accepted.len());

    Ok(ChannelSet {
        time,
        gyro,
        setpoint,
        rc_command,
        p_term,
        i_term,
        d_term,
        f_term,
        motor,
        battery_voltage,
        battery_current,
    })
}

fn row_is_plausible(row: &LogRowData) -> bool {
    for axis in 0..3 {
        if let Some(v) = row.gyro[axis] {
            if !v.is_finite() || v.abs() >= GYRO_PLAUSIBLE_LIMIT_DEG_S {
                return false;
            }
        }
    }
    for m in 0..MOTOR_COUNT {
        if let Some(v) = row.motor[m] {
            if !v.is_finite() || !(MOTOR_OUTPUT_MIN..=MOTOR_OUTPUT_MAX).contains(&v) {
                return false;
            }
        }
    }
    true
}

/// A channel is present when any accepted row carries a value for it.
/// Present channels fill per-row gaps with 0.
fn extract<F>(accepted: &[&LogRowData], field: F) -> Option<Vec<f64>>
where
    F: Fn(&LogRowData) -> Option<f64>,
{
    if !accepted.iter().any(|row| field(row).is_some()) {
        return None;
    }
    Some(accepted.iter().map(|row| field(row).unwrap_or(0.0)).collect())
}


// src/data_input/sample_filter.rs
