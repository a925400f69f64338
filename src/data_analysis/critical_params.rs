// src/data_analysis/critical_params.rs
//
// Ziegler-Nichols-style estimation of the ultimate gain and period per
// axis from oscillatory transients in the command-tracking error.

use serde::Serialize;

use crate::constants::{
    DAMPING_HIGH_CONFIDENCE_MAX, DAMPING_LOW_CONFIDENCE_MIN, DEFAULT_ULTIMATE_GAIN,
    DEFAULT_ULTIMATE_PERIOD_S, MIN_PEAK_PAIRS_HIGH_CONFIDENCE, SEGMENT_MAX_SAMPLES,
    SEGMENT_OPEN_THRESHOLD, SEGMENT_STABLE_RUN, SEGMENT_STABLE_THRESHOLD, ULTIMATE_GAIN_MAX,
    ULTIMATE_GAIN_MIN, ULTIMATE_PERIOD_MAX_S, ULTIMATE_PERIOD_MIN_S,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn name(&self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

/// Estimated marginal-oscillation parameters for one axis.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CriticalParameters {
    pub ultimate_gain: f64,
    pub ultimate_period_s: f64,
    pub confidence: Confidence,
}

impl CriticalParameters {
    /// Fixed conservative defaults used when no usable transition
    /// segment exists. Returned instead of an error, always.
    pub fn conservative_default() -> Self {
        CriticalParameters {
            ultimate_gain: DEFAULT_ULTIMATE_GAIN,
            ultimate_period_s: DEFAULT_ULTIMATE_PERIOD_S,
            confidence: Confidence::Low,
        }
    }
}

struct Segment {
    start: usize,
    end: usize, // exclusive
}

/// Estimates `Ku`/`Tu` from error-signal ringing inside transition
/// segments. Never fails: degenerate input yields the conservative
/// defaults.
pub fn estimate_critical_parameters(
    command: &[f64],
    measured: &[f64],
    sample_rate: f64,
) -> CriticalParameters {
    if command.len() != measured.len() || command.len() < 3 || sample_rate <= 0.0 {
        return CriticalParameters::conservative_default();
    }

    let segments = find_transition_segments(command);
    if segments.is_empty() {
        return CriticalParameters::conservative_default();
    }

    let error: Vec<f64> = command
        .iter()
        .zip(measured.iter())
        .map(|(&c, &m)| c - m)
        .collect();

    let mut spacings: Vec<f64> = Vec::new();
    let mut amplitude_ratios: Vec<f64> = Vec::new();

    for segment in &segments {
        let extrema = find_error_extrema(&error[segment.start..segment.end]);
        for pair in extrema.windows(2) {
            spacings.push((pair[1].0 - pair[0].0) as f64);
        }
        // Alternating peaks (two apart) share a sign; their ratio is the
        // amplitude decay over one full cycle.
        for k in 0..extrema.len().saturating_sub(2) {
            let a0 = extrema[k].1.abs();
            let a1 = extrema[k + 2].1.abs();
            if a0 > 0.0 {
                amplitude_ratios.push(a1 / a0);
            }
        }
    }

    if spacings.is_empty() || amplitude_ratios.is_empty() {
        return CriticalParameters::conservative_default();
    }

    // Successive extrema alternate sign, so one full period spans two
    // spacings.
    let mean_spacing = spacings.iter().sum::<f64>() / spacings.len() as f64;
    let period_s = 2.0 * mean_spacing / sample_rate;

    let mean_ratio = amplitude_ratios.iter().sum::<f64>() / amplitude_ratios.len() as f64;
    let damping = damping_from_ratio(mean_ratio);

    let ultimate_gain = if damping >= 1.0 {
        ULTIMATE_GAIN_MAX
    } else {
        (1.0 / (1.0 - damping)).clamp(ULTIMATE_GAIN_MIN, ULTIMATE_GAIN_MAX)
    };
    let ultimate_period_s = period_s.clamp(ULTIMATE_PERIOD_MIN_S, ULTIMATE_PERIOD_MAX_S);

    let peak_pairs = amplitude_ratios.len();
    let confidence = if peak_pairs >= MIN_PEAK_PAIRS_HIGH_CONFIDENCE
        && damping < DAMPING_HIGH_CONFIDENCE_MAX
    {
        Confidence::High
    } else if peak_pairs < MIN_PEAK_PAIRS_HIGH_CONFIDENCE || damping > DAMPING_LOW_CONFIDENCE_MIN {
        Confidence::Low
    } else {
        Confidence::Medium
    };

    CriticalParameters {
        ultimate_gain,
        ultimate_period_s,
        confidence,
    }
}

/// `delta = -ln(mean amplitude ratio) / 2*pi`, clamped to [0, 1].
/// Growing oscillation (ratio >= 1) clamps to zero damping.
fn damping_from_ratio(mean_ratio: f64) -> f64 {
    if mean_ratio <= 0.0 {
        return 1.0;
    }
    (-mean_ratio.ln() / (2.0 * std::f64::consts::PI)).clamp(0.0, 1.0)
}

/// A transition segment opens on a command change above
/// `SEGMENT_OPEN_THRESHOLD` and is usable once the command holds stable
/// (deltas under `SEGMENT_STABLE_THRESHOLD`) for `SEGMENT_STABLE_RUN`
/// consecutive samples. Segments where the command never stabilizes are
/// discarded.
fn find_transition_segments(command: &[f64]) -> Vec<Segment> {
    let n = command.len();
    let mut segments = Vec::new();

    let mut i = 1;
    while i < n {
        if (command[i] - command[i - 1]).abs() > SEGMENT_OPEN_THRESHOLD {
            let limit = (i + SEGMENT_MAX_SAMPLES).min(n);
            let mut stable_run = 0usize;
            let mut stabilized = false;
            for j in i + 1..limit {
                if (command[j] - command[j - 1]).abs() < SEGMENT_STABLE_THRESHOLD {
                    stable_run += 1;
                    if stable_run >= SEGMENT_STABLE_RUN {
                        stabilized = true;
                    }
                } else {
                    stable_run = 0;
                }
            }
            if stabilized {
                segments.push(Segment { start: i, end: limit });
            }
            i = limit;
        } else {
            i += 1;
        }
    }
    segments
}

/// Local extrema (maxima and minima) of the error signal, as
/// `(index, value)` pairs in segment-local indices.
fn find_error_extrema(error: &[f64]) -> Vec<(usize, f64)> {
    let mut extrema = Vec::new();
    for k in 1..error.len().saturating_sub(1) {
        let is_max = error[k] > error[k - 1] && error[k] > error[k + 1];
        let is_min = error[k] < error[k - 1] && error[k] < error[k + 1];
        if is_max || is_min {
            extrema.push((k, error[k]));
        }
    }
    extrema
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f64 = 1000.0;

    /// Command step at `step_at`, measured rings around the new target
    /// as a decaying cosine with the given period and decay per cycle.
    fn ringing_log(
        n: usize,
        step_at: usize,
        period_samples: f64,
        decay_per_cycle: f64,
    ) -> (Vec<f64>, Vec<f64>) {
        let command: Vec<f64> = (0..n)
            .map(|i| if i < step_at { 0.0 } else { 200.0 })
            .collect();
        let measured: Vec<f64> = (0..n)
            .map(|i| {
                if i < step_at {
                    0.0
                } else {
                    let k = (i - step_at) as f64;
                    let cycles = k / period_samples;
                    let envelope = 50.0 * decay_per_cycle.powf(cycles);
                    200.0 - envelope * (2.0 * std::f64::consts::PI * cycles).cos()
                }
            })
            .collect();
        (command, measured)
    }

    #[test]
    fn test_defaults_when_no_transitions() {
        let flat = vec![0.0; 500];
        let params = estimate_critical_parameters(&flat, &flat, SAMPLE_RATE);
        assert_eq!(params.ultimate_gain, DEFAULT_ULTIMATE_GAIN);
        assert_eq!(params.ultimate_period_s, DEFAULT_ULTIMATE_PERIOD_S);
        assert_eq!(params.confidence, Confidence::Low);
    }

    #[test]
    fn test_defaults_on_length_mismatch() {
        let params = estimate_critical_parameters(&[0.0; 10], &[0.0; 8], SAMPLE_RATE);
        assert_eq!(params.confidence, Confidence::Low);
    }

    #[test]
    fn test_period_recovered_from_ringing() {
        // 25 ms oscillation period at 1 kHz = 25 samples per cycle.
        let (command, measured) = ringing_log(400, 20, 25.0, 0.5);
        let params = estimate_critical_parameters(&command, &measured, SAMPLE_RATE);
        assert!(
            (params.ultimate_period_s - 0.025).abs() < 0.005,
            "period {} s",
            params.ultimate_period_s
        );
    }

    #[test]
    fn test_heavy_decay_lowers_confidence() {
        // Near-total decay per cycle: ratio ~ 0.01, delta ~ 0.73.
        let (command, measured) = ringing_log(400, 20, 30.0, 0.01);
        let params = estimate_critical_parameters(&command, &measured, SAMPLE_RATE);
        assert_eq!(params.confidence, Confidence::Low);
    }

    #[test]
    fn test_sustained_ringing_is_high_confidence() {
        // Barely decaying oscillation: ratio ~ 0.9, delta ~ 0.017.
        let (command, measured) = ringing_log(600, 20, 25.0, 0.9);
        let params = estimate_critical_parameters(&command, &measured, SAMPLE_RATE);
        assert_eq!(params.confidence, Confidence::High);
    }

    #[test]
    fn test_outputs_always_within_clamps() {
        for decay in [0.05, 0.3, 0.6, 0.95] {
            for period in [5.0, 25.0, 180.0] {
                let (command, measured) = ringing_log(500, 20, period, decay);
                let params = estimate_critical_parameters(&command, &measured, SAMPLE_RATE);
                assert!(params.ultimate_gain >= ULTIMATE_GAIN_MIN);
                assert!(params.ultimate_gain <= ULTIMATE_GAIN_MAX);
                assert!(params.ultimate_period_s >= ULTIMATE_PERIOD_MIN_S);
                assert!(params.ultimate_period_s <= ULTIMATE_PERIOD_MAX_S);
            }
        }
    }

    #[test]
    fn test_segment_requires_stability() {
        // Command keeps sweeping with large deltas and never stabilizes.
        let command: Vec<f64> = (0..300).map(|i| (i as f64) * 40.0).collect();
        let segments = find_transition_segments(&command);
        assert!(segments.is_empty());
    }
}

// src/data_analysis/critical_params.rs
