// src/tuning/pid_engine.rs
//
// Ziegler-Nichols PID recommendation: a coefficient table keyed by
// controller archetype, sequential physical-parameter adjustments, and
// scaling into the controller's native integer ranges.

use log::warn;
use serde::Serialize;

use crate::axis_names::Axis;
use crate::constants::{
    D_SCALE_FACTOR, FEEDFORWARD_BASE, FEEDFORWARD_CINEMATIC_SCALE, FEEDFORWARD_MAX,
    FEEDFORWARD_PITCH_SCALE, FEEDFORWARD_RACING_SCALE, FEEDFORWARD_YAW_SCALE,
    HEAVY_WEIGHT_GRAMS, HIGH_KV_THRESHOLD, HIGH_VOLTAGE_THRESHOLD, H_FRAME_PITCH_SCALE,
    H_FRAME_ROLL_SCALE, I_SCALE_FACTOR, LARGE_PROP_INCHES, LIGHT_WEIGHT_GRAMS,
    MASTER_MULTIPLIER_MAX, MASTER_MULTIPLIER_MIN, PID_D_MAX, PID_D_MIN, PID_D_YAW_MAX,
    PID_D_YAW_MIN, PID_I_MAX, PID_I_MIN, PID_P_MAX, PID_P_MIN, P_SCALE_FACTOR,
    SAFE_DEFAULT_D, SAFE_DEFAULT_D_YAW, SAFE_DEFAULT_F, SAFE_DEFAULT_I, SAFE_DEFAULT_P,
    SMALL_PROP_INCHES, YAW_D_SCALE, YAW_I_SCALE, YAW_P_SCALE,
};
use crate::data_analysis::critical_params::{Confidence, CriticalParameters};
use crate::data_analysis::flight_profile::{FlightProfile, FlightStyle};
use crate::error::AnalysisError;
use crate::tuning::drone::{DroneParameters, FrameType};

/// Tuning archetype selecting a row of the coefficient table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ControllerType {
    P,
    Pi,
    Pd,
    ClassicPid,
    Racing,
    Freestyle,
    Cinematic,
}

/// One row of the Ziegler-Nichols table: `Kp = kp*Ku`,
/// `Ki = ki*Ku/Tu`, `Kd = kd*Ku*Tu`.
struct ZnCoefficients {
    kp: f64,
    ki: f64,
    kd: f64,
}

impl ControllerType {
    /// Resolves a user-supplied archetype name. An unrecognized name is
    /// fatal to the PID calculation and propagates.
    pub fn from_name(name: &str) -> Result<ControllerType, AnalysisError> {
        match name.trim().to_lowercase().as_str() {
            "p" => Ok(ControllerType::P),
            "pi" => Ok(ControllerType::Pi),
            "pd" => Ok(ControllerType::Pd),
            "pid" | "classic" => Ok(ControllerType::ClassicPid),
            "racing" => Ok(ControllerType::Racing),
            "freestyle" => Ok(ControllerType::Freestyle),
            "cinematic" => Ok(ControllerType::Cinematic),
            other => Err(AnalysisError::UnknownControllerType(other.to_string())),
        }
    }

    /// Archetype implied by the classified flight style.
    pub fn from_style(style: FlightStyle) -> ControllerType {
        match style {
            FlightStyle::Racing => ControllerType::Racing,
            FlightStyle::Freestyle => ControllerType::Freestyle,
            FlightStyle::Cinematic => ControllerType::Cinematic,
            FlightStyle::Mixed => ControllerType::ClassicPid,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ControllerType::P => "p",
            ControllerType::Pi => "pi",
            ControllerType::Pd => "pd",
            ControllerType::ClassicPid => "pid",
            ControllerType::Racing => "racing",
            ControllerType::Freestyle => "freestyle",
            ControllerType::Cinematic => "cinematic",
        }
    }

    fn coefficients(self) -> ZnCoefficients {
        match self {
            ControllerType::P => ZnCoefficients { kp: 0.5, ki: 0.0, kd: 0.0 },
            ControllerType::Pi => ZnCoefficients { kp: 0.45, ki: 0.54, kd: 0.0 },
            ControllerType::Pd => ZnCoefficients { kp: 0.8, ki: 0.0, kd: 0.1 },
            ControllerType::ClassicPid => ZnCoefficients { kp: 0.6, ki: 1.2, kd: 0.075 },
            // Multirotor-specific variants.
            ControllerType::Racing => ZnCoefficients { kp: 0.7, ki: 1.4, kd: 0.085 },
            ControllerType::Freestyle => ZnCoefficients { kp: 0.6, ki: 1.2, kd: 0.075 },
            ControllerType::Cinematic => ZnCoefficients { kp: 0.45, ki: 0.9, kd: 0.06 },
        }
    }
}

/// Scaled integer gains for one axis, within controller-native bounds.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AxisPidValues {
    pub p: i32,
    pub i: i32,
    pub d: i32,
    pub f: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PidRecommendation {
    pub controller: ControllerType,
    /// Indexed by `Axis::index()`.
    pub axes: [AxisPidValues; 3],
    pub master_multiplier: f64,
    pub notes: Vec<String>,
}

/// Derives per-axis P/I/D/F values from the estimated critical
/// parameters, the drone's physical parameters, and the flight profile.
///
/// Internal failures (non-finite intermediates) fall back to the safe
/// default gains for the affected axis instead of propagating.
pub fn recommend_pids(
    critical: &[CriticalParameters; 3],
    drone: &DroneParameters,
    profile: &FlightProfile,
    controller: ControllerType,
) -> PidRecommendation {
    let mut notes: Vec<String> = Vec::new();
    let master_multiplier = master_multiplier(drone);

    let axes = std::array::from_fn(|index| {
        let axis = Axis::from_index(index).unwrap_or(Axis::Roll);
        match axis_values(&critical[index], drone, profile, controller, axis, master_multiplier) {
            Some(values) => values,
            None => {
                warn!("{} gains fell back to safe defaults", axis.name());
                notes.push(format!(
                    "{}: estimator output unusable, safe default gains applied",
                    axis.name()
                ));
                safe_defaults(axis)
            }
        }
    });

    for (index, params) in critical.iter().enumerate() {
        if params.confidence == Confidence::Low {
            if let Some(axis) = Axis::from_index(index) {
                notes.push(format!(
                    "{}: low-confidence oscillation estimate, verify with a short test hover",
                    axis.name()
                ));
            }
        }
    }

    PidRecommendation {
        controller,
        axes,
        master_multiplier,
        notes,
    }
}

/// Safe per-axis defaults, documented constants.
pub fn safe_defaults(axis: Axis) -> AxisPidValues {
    AxisPidValues {
        p: SAFE_DEFAULT_P,
        i: SAFE_DEFAULT_I,
        d: if axis == Axis::Yaw { SAFE_DEFAULT_D_YAW } else { SAFE_DEFAULT_D },
        f: SAFE_DEFAULT_F,
    }
}

fn axis_values(
    params: &CriticalParameters,
    drone: &DroneParameters,
    profile: &FlightProfile,
    controller: ControllerType,
    axis: Axis,
    master_multiplier: f64,
) -> Option<AxisPidValues> {
    let ku = params.ultimate_gain;
    let tu = params.ultimate_period_s;
    if !ku.is_finite() || !tu.is_finite() || ku <= 0.0 || tu <= 0.0 {
        return None;
    }

    let coeffs = controller.coefficients();
    let mut kp = coeffs.kp * ku;
    let mut ki = coeffs.ki * ku / tu;
    let mut kd = coeffs.kd * ku * tu;

    // Adjustment multipliers, applied sequentially.
    if drone.prop_size_inches < SMALL_PROP_INCHES {
        kp *= 1.15;
        kd *= 1.10;
        ki *= 0.90;
    } else if drone.prop_size_inches > LARGE_PROP_INCHES {
        kp *= 0.85;
        ki *= 1.15;
        kd *= 0.90;
    }

    if drone.weight_grams < LIGHT_WEIGHT_GRAMS {
        kp *= 1.10;
        ki *= 0.90;
    } else if drone.weight_grams > HEAVY_WEIGHT_GRAMS {
        kp *= 0.90;
        ki *= 1.10;
        kd *= 0.90;
    }

    if drone.battery_voltage() > HIGH_VOLTAGE_THRESHOLD {
        kp *= 0.90;
    }

    if drone.motor_kv > HIGH_KV_THRESHOLD {
        kp *= 0.92;
        kd *= 1.08;
    }

    if drone.frame_type == FrameType::H {
        let frame_scale = match axis {
            Axis::Roll => H_FRAME_ROLL_SCALE,
            Axis::Pitch => H_FRAME_PITCH_SCALE,
            Axis::Yaw => 1.0,
        };
        kp *= frame_scale;
        ki *= frame_scale;
        kd *= frame_scale;
    }

    if axis == Axis::Yaw {
        kp *= YAW_P_SCALE;
        ki *= YAW_I_SCALE;
        kd *= YAW_D_SCALE;
    }

    kp *= master_multiplier;
    ki *= master_multiplier;
    kd *= master_multiplier;

    let f = feedforward(drone, profile, axis);

    if !kp.is_finite() || !ki.is_finite() || !kd.is_finite() {
        return None;
    }

    let (d_min, d_max) = if axis == Axis::Yaw {
        (PID_D_YAW_MIN, PID_D_YAW_MAX)
    } else {
        (PID_D_MIN, PID_D_MAX)
    };

    Some(AxisPidValues {
        p: scale_to_range(kp, P_SCALE_FACTOR, PID_P_MIN, PID_P_MAX),
        i: scale_to_range(ki, I_SCALE_FACTOR, PID_I_MIN, PID_I_MAX),
        d: scale_to_range(kd, D_SCALE_FACTOR, d_min, d_max),
        f,
    })
}

/// `round(clamp(value * scale))` into the native integer range.
fn scale_to_range(value: f64, scale: f64, min: i32, max: i32) -> i32 {
    let scaled = (value * scale).round();
    (scaled as i32).clamp(min, max)
}

/// Feedforward: base value modified by axis, flight style, prop size,
/// and weight; clamped to the configured maximum.
fn feedforward(drone: &DroneParameters, profile: &FlightProfile, axis: Axis) -> i32 {
    let mut ff = FEEDFORWARD_BASE;

    match axis {
        Axis::Yaw => ff *= FEEDFORWARD_YAW_SCALE,
        Axis::Pitch => ff *= FEEDFORWARD_PITCH_SCALE,
        Axis::Roll => {}
    }

    match profile.style {
        FlightStyle::Racing => ff *= FEEDFORWARD_RACING_SCALE,
        FlightStyle::Cinematic => ff *= FEEDFORWARD_CINEMATIC_SCALE,
        FlightStyle::Freestyle | FlightStyle::Mixed => {}
    }

    if drone.prop_size_inches < SMALL_PROP_INCHES {
        ff *= 1.10;
    } else if drone.prop_size_inches > LARGE_PROP_INCHES {
        ff *= 0.85;
    }
    if drone.weight_grams > HEAVY_WEIGHT_GRAMS {
        ff *= 0.90;
    }

    (ff.round() as i32).clamp(0, FEEDFORWARD_MAX)
}

/// One aggressiveness knob derived from weight, prop size, and motor
/// kV, applied uniformly as the final pass.
fn master_multiplier(drone: &DroneParameters) -> f64 {
    let mut m: f64 = 1.0;
    if drone.weight_grams < LIGHT_WEIGHT_GRAMS {
        m *= 1.10;
    } else if drone.weight_grams > HEAVY_WEIGHT_GRAMS {
        m *= 0.90;
    }
    if drone.prop_size_inches < SMALL_PROP_INCHES {
        m *= 1.05;
    } else if drone.prop_size_inches > LARGE_PROP_INCHES {
        m *= 0.90;
    }
    if drone.motor_kv > HIGH_KV_THRESHOLD {
        m *= 0.95;
    }
    m.clamp(MASTER_MULTIPLIER_MIN, MASTER_MULTIPLIER_MAX)
}


// src/tuning/pid_engine.rs
