// src/tuning/report.rs
//
// Final aggregation: one report value for presentation layers plus the
// ordered configuration command list. Formatting only; malformed
// recommendations are rejected, never serialized.

use serde::Serialize;

use crate::axis_names::Axis;
use crate::constants::D_MIN_FACTOR;
use crate::data_analysis::critical_params::CriticalParameters;
use crate::data_analysis::flight_profile::FlightProfile;
use crate::data_analysis::harmonics::HarmonicAnalysis;
use crate::data_analysis::spectral::SpectralAnalysis;
use crate::data_analysis::step_response::ResponseOutcome;
use crate::data_input::header_metadata::FirmwareGeneration;
use crate::error::AnalysisError;
use crate::tuning::filter_engine::FilterRecommendation;
use crate::tuning::pid_engine::PidRecommendation;

/// THD of each PID term's spectrum at the gyro fundamental; secondary
/// oscillation diagnostics.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct PidTermDistortion {
    pub p_thd_percent: f64,
    pub i_thd_percent: f64,
    pub d_thd_percent: f64,
}

/// Everything measured for one control axis.
#[derive(Debug, Clone, Serialize)]
pub struct AxisAnalysis {
    pub axis: Axis,
    pub spectral: SpectralAnalysis,
    pub harmonics: HarmonicAnalysis,
    pub term_distortion: PidTermDistortion,
    pub response: ResponseOutcome,
    pub critical: CriticalParameters,
}

/// The complete analysis product consumed by presentation layers.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub sample_rate: f64,
    pub sample_count: usize,
    pub axes: Vec<AxisAnalysis>,
    pub profile: FlightProfile,
    pub pid: PidRecommendation,
    pub filters: FilterRecommendation,
    /// `"set <key> = <value>"` lines terminated by `"save"`.
    pub commands: Vec<String>,
}

/// Serializes the recommendations into the flat command list. The
/// textual contract is exact: `"set <key> = <value>"`, then `"save"`.
pub fn generate_commands(
    pid: &PidRecommendation,
    filters: &FilterRecommendation,
    generation: FirmwareGeneration,
) -> Result<Vec<String>, AnalysisError> {
    validate(pid, filters)?;

    let mut commands = Vec::new();
    let mut set = |key: String, value: i64| {
        commands.push(format!("set {} = {}", key, value));
    };

    for axis in Axis::ALL {
        let values = pid.axes[axis.index()];
        set(format!("p_{}", axis.key()), values.p as i64);
        set(format!("i_{}", axis.key()), values.i as i64);
        set(format!("d_{}", axis.key()), values.d as i64);
        if generation == FirmwareGeneration::Modern {
            let d_min = (values.d as f64 * D_MIN_FACTOR).round() as i64;
            set(format!("d_min_{}", axis.key()), d_min);
        }
        set(format!("f_{}", axis.key()), values.f as i64);
    }

    set("gyro_lowpass_hz".to_string(), filters.gyro_lowpass_hz as i64);
    if let Some(lpf2) = filters.gyro_lowpass2_hz {
        set("gyro_lowpass2_hz".to_string(), lpf2 as i64);
    }
    set("dterm_lowpass_hz".to_string(), filters.dterm_lowpass_hz as i64);
    set("dyn_notch_min_hz".to_string(), filters.dyn_notch.min_hz as i64);
    set("dyn_notch_max_hz".to_string(), filters.dyn_notch.max_hz as i64);
    set("dyn_notch_q".to_string(), filters.dyn_notch.q as i64);
    set("dyn_notch_count".to_string(), filters.dyn_notch.count as i64);

    if let Some(rpm) = &filters.rpm_filter {
        set("rpm_filter_harmonics".to_string(), rpm.harmonics as i64);
        set("rpm_filter_q".to_string(), rpm.q as i64);
        set("rpm_filter_min_hz".to_string(), rpm.min_hz as i64);
    }

    commands.push("save".to_string());
    Ok(commands)
}

/// Rejects recommendations that must never reach the command list.
fn validate(
    pid: &PidRecommendation,
    filters: &FilterRecommendation,
) -> Result<(), AnalysisError> {
    if !pid.master_multiplier.is_finite() {
        return Err(AnalysisError::MalformedRecommendation(
            "non-finite master multiplier".to_string(),
        ));
    }
    if filters.dyn_notch.min_hz > filters.dyn_notch.max_hz {
        return Err(AnalysisError::MalformedRecommendation(format!(
            "inverted dynamic notch band {}..{}",
            filters.dyn_notch.min_hz, filters.dyn_notch.max_hz
        )));
    }
    Ok(())
}


// src/tuning/report.rs
