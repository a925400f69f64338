// src/data_analysis/flight_profile.rs
//
// Piloting-style classification from RC command, gyro, and motor
// channels: aggressiveness, smoothness, throttle usage, motor usage.

use ndarray::Array1;
use ndarray_stats::interpolate::Linear;
use ndarray_stats::Quantile1dExt;
use noisy_float::types::n64;
use serde::Serialize;

use crate::constants::{
    AGGRESSIVENESS_EXTREME_WEIGHT, AGGRESSIVENESS_RATE_NORMALIZER,
    AGGRESSIVENESS_RATE_PERCENTILE, AGGRESSIVENESS_RATE_WEIGHT, EXTREME_COMMAND_FRACTION,
    HOVER_MID_BIN_FRACTION, MOTOR_BALANCE_STDDEV_NORMALIZER, MOTOR_USAGE_PERCENTILE,
    PUNCHOUT_TOP_BIN_FRACTION, RC_COMMAND_CENTER, RC_COMMAND_HALF_RANGE,
    SMOOTHNESS_RMS_NORMALIZER, STYLE_CINEMATIC_SMOOTHNESS, STYLE_FREESTYLE_AGGRESSIVENESS_HIGH,
    STYLE_FREESTYLE_AGGRESSIVENESS_LOW, STYLE_RACING_AGGRESSIVENESS, THROTTLE_HISTOGRAM_BINS,
    THROTTLE_MIN, THROTTLE_RANGE,
};
use crate::data_input::sample_filter::ChannelSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlightStyle {
    Racing,
    Freestyle,
    Cinematic,
    Mixed,
}

impl FlightStyle {
    pub fn name(&self) -> &'static str {
        match self {
            FlightStyle::Racing => "racing",
            FlightStyle::Freestyle => "freestyle",
            FlightStyle::Cinematic => "cinematic",
            FlightStyle::Mixed => "mixed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThrottleProfile {
    Punchouts,
    Hovering,
    Mixed,
}

impl ThrottleProfile {
    pub fn name(&self) -> &'static str {
        match self {
            ThrottleProfile::Punchouts => "punchouts",
            ThrottleProfile::Hovering => "hovering",
            ThrottleProfile::Mixed => "mixed",
        }
    }
}

/// Normalized motor output statistics.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MotorUsage {
    /// Mean of per-motor normalized means, [0, 1].
    pub average: f64,
    /// Highest per-motor normalized 95th percentile, [0, 1].
    pub peak: f64,
    /// `1 - stddev(raw motor means) / 100`, clamped to [0, 1].
    pub balance: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct FlightProfile {
    pub style: FlightStyle,
    pub aggressiveness: f64,
    pub smoothness: f64,
    pub throttle_profile: ThrottleProfile,
    pub motor_usage: MotorUsage,
}

/// Derives the flight profile from the prepared channels. Absent
/// channels contribute neutral values; this never fails.
pub fn classify(channels: &ChannelSet) -> FlightProfile {
    let commands: Vec<&[f64]> = (0..3)
        .filter_map(|axis| channels.command_channel(axis))
        .collect();
    let gyros: Vec<&[f64]> = channels
        .gyro
        .iter()
        .filter_map(|c| c.as_deref())
        .collect();
    let motors: Vec<&[f64]> = channels
        .motor
        .iter()
        .filter_map(|c| c.as_deref())
        .collect();

    let aggressiveness = aggressiveness(&commands);
    let smoothness = smoothness(&gyros);
    let throttle_profile = throttle_profile(channels.throttle_channel());
    let motor_usage = motor_usage(&motors);

    let style = decide_style(aggressiveness, smoothness, throttle_profile);

    FlightProfile {
        style,
        aggressiveness,
        smoothness,
        throttle_profile,
        motor_usage,
    }
}

/// First matching rule wins.
fn decide_style(
    aggressiveness: f64,
    smoothness: f64,
    throttle: ThrottleProfile,
) -> FlightStyle {
    if aggressiveness > STYLE_RACING_AGGRESSIVENESS && throttle == ThrottleProfile::Punchouts {
        FlightStyle::Racing
    } else if smoothness > STYLE_CINEMATIC_SMOOTHNESS && throttle == ThrottleProfile::Hovering {
        FlightStyle::Cinematic
    } else if aggressiveness > STYLE_FREESTYLE_AGGRESSIVENESS_LOW
        && aggressiveness < STYLE_FREESTYLE_AGGRESSIVENESS_HIGH
    {
        FlightStyle::Freestyle
    } else {
        FlightStyle::Mixed
    }
}

/// Weighted blend of the 90th-percentile stick rate (normalized by 100)
/// and the fraction of samples commanding more than 80% deflection.
fn aggressiveness(commands: &[&[f64]]) -> f64 {
    let mut rates: Vec<f64> = Vec::new();
    let mut extreme_count = 0usize;
    let mut total_count = 0usize;

    for channel in commands {
        for pair in channel.windows(2) {
            rates.push((pair[1] - pair[0]).abs());
        }
        for &v in channel.iter() {
            let deflection = (v - RC_COMMAND_CENTER) / RC_COMMAND_HALF_RANGE;
            if deflection.abs() > EXTREME_COMMAND_FRACTION {
                extreme_count += 1;
            }
            total_count += 1;
        }
    }

    if rates.is_empty() || total_count == 0 {
        return 0.0;
    }

    let rate_component =
        (percentile(&rates, AGGRESSIVENESS_RATE_PERCENTILE) / AGGRESSIVENESS_RATE_NORMALIZER)
            .min(1.0);
    let extreme_component = extreme_count as f64 / total_count as f64;

    (AGGRESSIVENESS_RATE_WEIGHT * rate_component
        + AGGRESSIVENESS_EXTREME_WEIGHT * extreme_component)
        .clamp(0.0, 1.0)
}

/// RMS of the second discrete derivative (an acceleration proxy) per
/// gyro axis, averaged, mapped to `1 - rms/50` and clamped.
fn smoothness(gyros: &[&[f64]]) -> f64 {
    let mut axis_rms: Vec<f64> = Vec::new();
    for channel in gyros {
        if channel.len() < 3 {
            continue;
        }
        let accel: Vec<f64> = channel
            .windows(3)
            .map(|w| w[2] - 2.0 * w[1] + w[0])
            .collect();
        let rms = (accel.iter().map(|a| a * a).sum::<f64>() / accel.len() as f64).sqrt();
        axis_rms.push(rms);
    }
    if axis_rms.is_empty() {
        return 0.0;
    }
    let avg_rms = axis_rms.iter().sum::<f64>() / axis_rms.len() as f64;
    (1.0 - avg_rms / SMOOTHNESS_RMS_NORMALIZER).clamp(0.0, 1.0)
}

/// 10-bin histogram of normalized throttle. Punchouts when the top two
/// bins dominate, hovering when the middle three do.
fn throttle_profile(throttle: Option<&[f64]>) -> ThrottleProfile {
    let throttle = match throttle {
        Some(t) if !t.is_empty() => t,
        _ => return ThrottleProfile::Mixed,
    };

    let mut bins = [0usize; THROTTLE_HISTOGRAM_BINS];
    for &v in throttle {
        let normalized = ((v - THROTTLE_MIN) / THROTTLE_RANGE).clamp(0.0, 1.0);
        let bin = ((normalized * THROTTLE_HISTOGRAM_BINS as f64) as usize)
            .min(THROTTLE_HISTOGRAM_BINS - 1);
        bins[bin] += 1;
    }

    let total = throttle.len() as f64;
    let top_two = (bins[8] + bins[9]) as f64 / total;
    let middle_three = (bins[4] + bins[5] + bins[6]) as f64 / total;

    if top_two > PUNCHOUT_TOP_BIN_FRACTION {
        ThrottleProfile::Punchouts
    } else if middle_three > HOVER_MID_BIN_FRACTION {
        ThrottleProfile::Hovering
    } else {
        ThrottleProfile::Mixed
    }
}

fn motor_usage(motors: &[&[f64]]) -> MotorUsage {
    if motors.is_empty() {
        return MotorUsage {
            average: 0.0,
            peak: 0.0,
            balance: 1.0,
        };
    }

    let normalize = |v: f64| ((v - THROTTLE_MIN) / THROTTLE_RANGE).clamp(0.0, 1.0);

    let mut raw_means: Vec<f64> = Vec::with_capacity(motors.len());
    let mut normalized_means: Vec<f64> = Vec::with_capacity(motors.len());
    let mut peak = 0.0f64;

    for channel in motors {
        if channel.is_empty() {
            continue;
        }
        let arr = Array1::from(channel.to_vec());
        let mean = arr.mean().unwrap_or(0.0);
        raw_means.push(mean);
        normalized_means.push(normalize(mean));

        let p95 = percentile(channel, MOTOR_USAGE_PERCENTILE);
        peak = peak.max(normalize(p95));
    }

    if raw_means.is_empty() {
        return MotorUsage {
            average: 0.0,
            peak: 0.0,
            balance: 1.0,
        };
    }

    let average = normalized_means.iter().sum::<f64>() / normalized_means.len() as f64;
    let means_arr = Array1::from(raw_means);
    let stddev = means_arr.std(0.0);
    let balance = (1.0 - stddev / MOTOR_BALANCE_STDDEV_NORMALIZER).clamp(0.0, 1.0);

    MotorUsage { average, peak, balance }
}

/// Linear-interpolated percentile; `q` in [0, 1]. Non-finite values are
/// excluded before ranking.
fn percentile(values: &[f64], q: f64) -> f64 {
    let finite: Vec<_> = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .map(n64)
        .collect();
    if finite.is_empty() {
        return 0.0;
    }
    let mut arr = Array1::from(finite);
    arr.quantile_mut(n64(q), &Linear)
        .map(|v| v.raw())
        .unwrap_or(0.0)
}


// src/data_analysis/flight_profile.rs
