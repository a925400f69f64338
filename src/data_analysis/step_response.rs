// src/data_analysis/step_response.rs
//
// Time-domain control quality: commanded-step detection, transient
// characterization (rise/overshoot/settling), whole-log error
// statistics, and PID-term contribution ratios.

use serde::Serialize;

use crate::constants::{
    MIN_RESPONSE_SAMPLES, RISE_HIGH_FRACTION, RISE_LOW_FRACTION, RISE_TIME_SETTLING_FALLBACK,
    SETTLING_BAND_FRACTION, SETTLING_HOLD_SAMPLES, STEP_DETECT_THRESHOLD, STEP_MIN_MAGNITUDE,
    TRANSIENT_MIN_POINTS, TRANSIENT_WINDOW_SAMPLES,
};

/// Fraction of total correction contributed by each PID term over the
/// transient window. Fractions sum to at most 1; all zero when the
/// terms were absent or silent.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct PidContribution {
    pub p: f64,
    pub i: f64,
    pub d: f64,
    pub f: f64,
}

/// Step-response and steady-state metrics for one control axis.
#[derive(Debug, Clone, Serialize)]
pub struct AxisResponseMetrics {
    pub rise_time_ms: f64,
    pub overshoot_percent: f64,
    pub settling_time_ms: f64,
    pub rms_error: f64,
    pub mean_error: f64,
    pub std_deviation: f64,
    pub pid_contribution: PidContribution,
}

/// Tagged outcome so callers cannot mistake an unmeasurable axis for a
/// perfectly-tuned one.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ResponseOutcome {
    Measured(AxisResponseMetrics),
    Unavailable { reason: String },
}

impl ResponseOutcome {
    pub fn metrics(&self) -> Option<&AxisResponseMetrics> {
        match self {
            ResponseOutcome::Measured(m) => Some(m),
            ResponseOutcome::Unavailable { .. } => None,
        }
    }
}

/// PID term channels for one axis; any may be absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct PidTermChannels<'a> {
    pub p: Option<&'a [f64]>,
    pub i: Option<&'a [f64]>,
    pub d: Option<&'a [f64]>,
    pub f: Option<&'a [f64]>,
}

struct DetectedStep {
    start_index: usize,
    end_index: usize, // exclusive
    start_value: f64,
    target: f64,
    magnitude: f64,
}

/// Characterizes the transient after the largest commanded step and the
/// steady-state error over the whole log.
///
/// `error_channel`, when logged, replaces `command - measured` in the
/// error statistics.
pub fn analyze_response(
    time: &[f64],
    command: &[f64],
    measured: &[f64],
    pid_terms: &PidTermChannels,
    error_channel: Option<&[f64]>,
) -> ResponseOutcome {
    let n = time.len();
    if n != command.len() || n != measured.len() {
        return ResponseOutcome::Unavailable {
            reason: "channel length mismatch".to_string(),
        };
    }
    if n < MIN_RESPONSE_SAMPLES {
        return ResponseOutcome::Unavailable {
            reason: format!("{} samples, need at least {}", n, MIN_RESPONSE_SAMPLES),
        };
    }

    let step = match select_step(command) {
        Some(step) => step,
        None => {
            return ResponseOutcome::Unavailable {
                reason: format!(
                    "no commanded step larger than {} units",
                    STEP_MIN_MAGNITUDE
                ),
            }
        }
    };

    let w_time = &time[step.start_index..step.end_index];
    let w_measured = &measured[step.start_index..step.end_index];

    let settling_time_s = settling_time(w_time, w_measured, step.target);
    let overshoot_percent = overshoot(w_measured, step.start_value, step.target);
    let rise_time_s = rise_time(w_time, w_measured, step.start_value, step.target)
        .unwrap_or(RISE_TIME_SETTLING_FALLBACK * settling_time_s);

    let (rms_error, mean_error, std_deviation) =
        error_statistics(command, measured, error_channel);

    let pid_contribution =
        pid_contribution(pid_terms, step.start_index, step.end_index);

    ResponseOutcome::Measured(AxisResponseMetrics {
        rise_time_ms: rise_time_s * 1000.0,
        overshoot_percent,
        settling_time_ms: settling_time_s * 1000.0,
        rms_error,
        mean_error,
        std_deviation,
        pid_contribution,
    })
}

/// Scans for step-like commanded changes and returns the one with the
/// largest magnitude. A window is kept only when it accumulates at
/// least `TRANSIENT_MIN_POINTS` samples before the log ends, and a step
/// below `STEP_MIN_MAGNITUDE` is too small to characterize.
fn select_step(command: &[f64]) -> Option<DetectedStep> {
    let n = command.len();
    let mut best: Option<DetectedStep> = None;

    let mut i = 1;
    while i < n {
        if (command[i] - command[i - 1]).abs() > STEP_DETECT_THRESHOLD {
            let end = (i + TRANSIENT_WINDOW_SAMPLES).min(n);
            if end - i >= TRANSIENT_MIN_POINTS {
                let start_value = command[i - 1];
                let target = command[end - 1];
                let magnitude = (target - start_value).abs();
                if magnitude >= STEP_MIN_MAGNITUDE
                    && best.as_ref().map_or(true, |b| magnitude > b.magnitude)
                {
                    best = Some(DetectedStep {
                        start_index: i,
                        end_index: end,
                        start_value,
                        target,
                        magnitude,
                    });
                }
            }
            // The transient belongs to this step; resume scanning after it.
            i = end;
        } else {
            i += 1;
        }
    }
    best
}

/// First time offset after which the response stays within 5% of the
/// target for the next `SETTLING_HOLD_SAMPLES` samples; the last
/// sample's time offset when it never settles (not an error).
fn settling_time(w_time: &[f64], w_measured: &[f64], target: f64) -> f64 {
    let len = w_measured.len();
    let tolerance = SETTLING_BAND_FRACTION * target.abs();
    for j in 0..len.saturating_sub(SETTLING_HOLD_SAMPLES) {
        let held = w_measured[j..j + SETTLING_HOLD_SAMPLES]
            .iter()
            .all(|&v| (v - target).abs() <= tolerance);
        if held {
            return w_time[j] - w_time[0];
        }
    }
    w_time[len - 1] - w_time[0]
}

/// `(peak - target) / (target - start) * 100`, where peak is the
/// measured value of maximum absolute deviation from the response's
/// initial value. The denominator is the commanded range.
fn overshoot(w_measured: &[f64], start_value: f64, target: f64) -> f64 {
    let range = target - start_value;
    if range == 0.0 || w_measured.is_empty() {
        return 0.0;
    }
    let reference = w_measured[0];
    let peak = w_measured
        .iter()
        .copied()
        .max_by(|a, b| {
            (a - reference)
                .abs()
                .partial_cmp(&(b - reference).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .unwrap_or(reference);
    (peak - target) / range * 100.0
}

/// Elapsed time between the response crossing 10% and 90% of the
/// commanded range. `None` when either crossing is missing; the caller
/// substitutes the settling-time fallback.
fn rise_time(w_time: &[f64], w_measured: &[f64], start_value: f64, target: f64) -> Option<f64> {
    let range = target - start_value;
    if range == 0.0 {
        return None;
    }
    let low = start_value + RISE_LOW_FRACTION * range;
    let high = start_value + RISE_HIGH_FRACTION * range;

    let crossed = |value: f64, threshold: f64| {
        if range > 0.0 {
            value >= threshold
        } else {
            value <= threshold
        }
    };

    let t_low = w_measured
        .iter()
        .position(|&v| crossed(v, low))
        .map(|k| w_time[k])?;
    let t_high = w_measured
        .iter()
        .position(|&v| crossed(v, high))
        .map(|k| w_time[k])?;

    if t_high >= t_low {
        Some(t_high - t_low)
    } else {
        None
    }
}

/// RMS / mean / standard deviation of the error signal over the whole
/// log (not just the transient).
fn error_statistics(
    command: &[f64],
    measured: &[f64],
    error_channel: Option<&[f64]>,
) -> (f64, f64, f64) {
    let errors: Vec<f64> = match error_channel {
        Some(errs) if errs.len() == command.len() => errs.to_vec(),
        _ => command
            .iter()
            .zip(measured.iter())
            .map(|(&c, &m)| c - m)
            .collect(),
    };
    if errors.is_empty() {
        return (0.0, 0.0, 0.0);
    }
    let n = errors.len() as f64;
    let mean = errors.iter().sum::<f64>() / n;
    let rms = (errors.iter().map(|e| e * e).sum::<f64>() / n).sqrt();
    let variance = errors.iter().map(|e| (e - mean).powi(2)).sum::<f64>() / n;
    (rms, mean, variance.sqrt())
}

/// Absolute P/I/D/F sums over the transient window, each as a fraction
/// of their combined total. All zero (not NaN) when the total is zero.
fn pid_contribution(terms: &PidTermChannels, start: usize, end: usize) -> PidContribution {
    let sum_abs = |channel: Option<&[f64]>| -> f64 {
        channel
            .map(|c| {
                let end = end.min(c.len());
                let start = start.min(end);
                c[start..end].iter().map(|v| v.abs()).sum()
            })
            .unwrap_or(0.0)
    };

    let p = sum_abs(terms.p);
    let i = sum_abs(terms.i);
    let d = sum_abs(terms.d);
    let f = sum_abs(terms.f);
    let total = p + i + d + f;
    if total == 0.0 {
        return PidContribution::default();
    }
    PidContribution {
        p: p / total,
        i: i / total,
        d: d / total,
        f: f / total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_PERIOD: f64 = 0.001;

    fn time_vec(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64 * SAMPLE_PERIOD).collect()
    }

    /// Command holds at 1500 then steps to 1800 at `step_at`.
    fn step_command(n: usize, step_at: usize) -> Vec<f64> {
        (0..n)
            .map(|i| if i < step_at { 1500.0 } else { 1800.0 })
            .collect()
    }

    #[test]
    fn test_too_few_samples_is_unavailable() {
        let n = 50;
        let outcome = analyze_response(
            &time_vec(n),
            &step_command(n, 10),
            &vec![0.0; n],
            &PidTermChannels::default(),
            None,
        );
        assert!(matches!(outcome, ResponseOutcome::Unavailable { .. }));
    }

    #[test]
    fn test_no_step_is_unavailable() {
        let n = 300;
        let outcome = analyze_response(
            &time_vec(n),
            &vec![1500.0; n],
            &vec![1500.0; n],
            &PidTermChannels::default(),
            None,
        );
        match outcome {
            ResponseOutcome::Unavailable { reason } => {
                assert!(reason.contains("no commanded step"));
            }
            other => panic!("expected Unavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_settling_time_at_known_sample() {
        // Response enters (and stays inside) the 5% band exactly at
        // sample 50 of the transient window.
        let n = 300;
        let step_at = 10;
        let command = step_command(n, step_at);
        let target = 1800.0;
        let measured: Vec<f64> = (0..n)
            .map(|i| {
                if i < step_at {
                    1500.0
                } else if i < step_at + 50 {
                    1500.0 + 200.0 * ((i - step_at) as f64 / 50.0)
                } else {
                    target
                }
            })
            .collect();

        let outcome = analyze_response(
            &time_vec(n),
            &command,
            &measured,
            &PidTermChannels::default(),
            None,
        );
        let metrics = outcome.metrics().expect("should measure");
        // Sample 50 into the window, 1 ms per sample.
        assert!(
            (metrics.settling_time_ms - 50.0).abs() < 2.0,
            "settling {} ms",
            metrics.settling_time_ms
        );
    }

    #[test]
    fn test_exponential_rise_time() {
        // gyro = 1800 * (1 - e^(-t/0.05)); rise 10->90% of the commanded
        // range is tau*ln(9) ~ 0.1099 s. Sampled at 250 Hz so the whole
        // transient fits inside the 100-sample capture window.
        let n = 1000;
        let step_at = 1;
        let tau = 0.05;
        let period = 0.004;
        let time: Vec<f64> = (0..n).map(|i| i as f64 * period).collect();
        let command = step_command(n, step_at);
        let measured: Vec<f64> = (0..n)
            .map(|i| {
                if i < step_at {
                    0.0
                } else {
                    let t = (i - step_at) as f64 * period;
                    1800.0 * (1.0 - (-t / tau).exp())
                }
            })
            .collect();

        let outcome = analyze_response(
            &time,
            &command,
            &measured,
            &PidTermChannels::default(),
            None,
        );
        let metrics = outcome.metrics().expect("should measure");
        let expected_ms = tau * (9.0f64).ln() * 1000.0;
        let tolerance = 0.10 * expected_ms;
        assert!(
            (metrics.rise_time_ms - expected_ms).abs() <= tolerance,
            "rise {} ms, expected ~{} ms",
            metrics.rise_time_ms,
            expected_ms
        );
        assert!(metrics.overshoot_percent.abs() < 2.0);
    }

    #[test]
    fn test_overshoot_percent() {
        let n = 300;
        let step_at = 10;
        let command = step_command(n, step_at);
        // Peaks at 1860 before settling at 1800: 20% of the 300 range.
        let measured: Vec<f64> = (0..n)
            .map(|i| {
                if i < step_at {
                    1500.0
                } else if i == step_at + 20 {
                    1860.0
                } else {
                    1800.0
                }
            })
            .collect();

        let outcome = analyze_response(
            &time_vec(n),
            &command,
            &measured,
            &PidTermChannels::default(),
            None,
        );
        let metrics = outcome.metrics().unwrap();
        assert!((metrics.overshoot_percent - 20.0).abs() < 0.5);
    }

    #[test]
    fn test_largest_step_wins() {
        let n = 600;
        let mut command = vec![1500.0; n];
        for item in command.iter_mut().take(300).skip(100) {
            *item = 1550.0; // 50-unit step
        }
        for item in command.iter_mut().skip(300) {
            *item = 1900.0; // 350-unit step from 1550
        }
        let step = select_step(&command).unwrap();
        assert_eq!(step.start_index, 300);
        assert!((step.magnitude - 350.0).abs() < 1e-9);
    }

    #[test]
    fn test_pid_contribution_zero_sum() {
        let c = pid_contribution(&PidTermChannels::default(), 0, 100);
        assert_eq!(c.p, 0.0);
        assert_eq!(c.i, 0.0);
        assert_eq!(c.d, 0.0);
        assert_eq!(c.f, 0.0);
    }

    #[test]
    fn test_pid_contribution_fractions() {
        let p = vec![2.0; 100];
        let i = vec![1.0; 100];
        let d = vec![1.0; 100];
        let terms = PidTermChannels {
            p: Some(&p),
            i: Some(&i),
            d: Some(&d),
            f: None,
        };
        let c = pid_contribution(&terms, 0, 100);
        assert!((c.p - 0.5).abs() < 1e-12);
        assert!((c.i - 0.25).abs() < 1e-12);
        assert!((c.d - 0.25).abs() < 1e-12);
        assert_eq!(c.f, 0.0);
        assert!((c.p + c.i + c.d + c.f - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_error_statistics_direct_channel_preferred() {
        let command = vec![10.0; 200];
        let measured = vec![0.0; 200];
        let errors = vec![3.0; 200];
        let (rms, mean, std) = error_statistics(&command, &measured, Some(&errors));
        assert!((rms - 3.0).abs() < 1e-12);
        assert!((mean - 3.0).abs() < 1e-12);
        assert!(std.abs() < 1e-12);
    }
}

// src/data_analysis/step_response.rs
