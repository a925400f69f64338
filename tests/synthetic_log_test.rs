// tests/synthetic_log_test.rs
//
// End-to-end pipeline runs over synthetic flight logs with known
// spectral and step-response content.

use bbtune::analysis::{run_analysis, AnalysisOptions};
use bbtune::axis_names::Axis;
use bbtune::data_input::log_data::LogRowData;
use bbtune::data_input::log_parser::{estimate_sample_rate, ParsedLog};
use bbtune::tuning::drone::DroneParameters;

/// Deterministic pseudo-noise in [-1, 1] (no RNG dependency so runs are
/// reproducible).
struct Lcg(u64);

impl Lcg {
    fn next_unit(&mut self) -> f64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((self.0 >> 33) as f64 / (1u64 << 31) as f64) * 2.0 - 1.0
    }
}

fn parsed_log(rows: Vec<LogRowData>) -> ParsedLog {
    let sample_rate = estimate_sample_rate(&rows);
    ParsedLog {
        rows,
        sample_rate,
        header_metadata: Vec::new(),
    }
}

/// 2000 samples at 1 kHz: roll gyro is an 80 Hz sine (amplitude 20)
/// plus low-level noise (amplitude 2); sticks are quiet.
fn noisy_sine_log() -> ParsedLog {
    let sample_rate = 1000.0;
    let mut noise = Lcg(0x5eed);
    let rows = (0..2000)
        .map(|i| {
            let t = i as f64 / sample_rate;
            let mut row = LogRowData::default();
            row.time_sec = Some(t);
            let tone = 20.0 * (2.0 * std::f64::consts::PI * 80.0 * t).sin();
            row.gyro = [
                Some(tone + 2.0 * noise.next_unit()),
                Some(2.0 * noise.next_unit()),
                Some(2.0 * noise.next_unit()),
            ];
            row.rc_command = [Some(1500.0), Some(1500.0), Some(1500.0), Some(1400.0)];
            row.motor = [Some(1500.0); 4];
            row
        })
        .collect();
    parsed_log(rows)
}

#[test]
fn test_sine_injection_dominant_frequency_within_5_hz() {
    let report = run_analysis(
        &noisy_sine_log(),
        &DroneParameters::default(),
        &AnalysisOptions::default(),
    )
    .unwrap();

    let roll = &report.axes[Axis::Roll.index()];
    assert!(
        (roll.spectral.dominant_frequency - 80.0).abs() <= 5.0,
        "dominant frequency {} Hz, expected ~80 Hz",
        roll.spectral.dominant_frequency
    );
}

#[test]
fn test_sine_injection_band_attribution() {
    let report = run_analysis(
        &noisy_sine_log(),
        &DroneParameters::default(),
        &AnalysisOptions::default(),
    )
    .unwrap();

    let roll = &report.axes[Axis::Roll.index()];
    let mid = roll
        .spectral
        .bands
        .iter()
        .find(|b| b.name == "Mechanical Mid")
        .unwrap();
    let prop_wash = roll
        .spectral
        .bands
        .iter()
        .find(|b| b.name == "Prop Wash")
        .unwrap();
    assert!(
        mid.severity > prop_wash.severity,
        "Mechanical Mid severity {} not above Prop Wash severity {}",
        mid.severity,
        prop_wash.severity
    );
}

#[test]
fn test_sine_injection_notch_band_contains_injected_frequency() {
    let report = run_analysis(
        &noisy_sine_log(),
        &DroneParameters::default(),
        &AnalysisOptions::default(),
    )
    .unwrap();

    let notch = &report.filters.dyn_notch;
    assert!(
        notch.min_hz <= 80 && notch.max_hz >= 80,
        "notch band {}..{} Hz does not contain 80 Hz",
        notch.min_hz,
        notch.max_hz
    );
}

/// 2000 samples at 250 Hz: roll command steps 1500 -> 1800 and holds;
/// roll gyro follows a clean first-order response with tau = 50 ms.
fn step_response_log() -> ParsedLog {
    let period = 0.004;
    let step_at = 10usize;
    let tau = 0.05;
    let rows = (0..2000)
        .map(|i| {
            let mut row = LogRowData::default();
            row.time_sec = Some(i as f64 * period);
            let command = if i < step_at { 1500.0 } else { 1800.0 };
            let gyro = if i < step_at {
                0.0
            } else {
                let t = (i - step_at) as f64 * period;
                1800.0 * (1.0 - (-t / tau).exp())
            };
            row.rc_command = [Some(command), Some(1500.0), Some(1500.0), Some(1400.0)];
            row.gyro = [Some(gyro), Some(0.0), Some(0.0)];
            row.motor = [Some(1500.0); 4];
            row
        })
        .collect();
    parsed_log(rows)
}

#[test]
fn test_step_response_rise_time_and_overshoot() {
    let report = run_analysis(
        &step_response_log(),
        &DroneParameters::default(),
        &AnalysisOptions::default(),
    )
    .unwrap();

    let roll = &report.axes[Axis::Roll.index()];
    let metrics = roll
        .response
        .metrics()
        .expect("step response should be measurable");

    // Rise 10% -> 90% of an exponential is tau * ln(9) ~ 109.9 ms.
    let expected_ms = 0.05 * (9.0f64).ln() * 1000.0;
    let tolerance = 0.10 * expected_ms;
    assert!(
        (metrics.rise_time_ms - expected_ms).abs() <= tolerance,
        "rise time {:.1} ms, expected ~{:.1} ms",
        metrics.rise_time_ms,
        expected_ms
    );

    assert!(
        metrics.overshoot_percent.abs() < 2.0,
        "overshoot {:.2}%, expected ~0%",
        metrics.overshoot_percent
    );
}

#[test]
fn test_report_always_carries_full_command_list() {
    // Even a degraded log (quiet sticks, no measurable steps) must
    // produce a complete command list, not a partial one.
    let report = run_analysis(
        &noisy_sine_log(),
        &DroneParameters::default(),
        &AnalysisOptions::default(),
    )
    .unwrap();

    assert_eq!(report.commands.last().unwrap(), "save");
    for axis_key in ["roll", "pitch", "yaw"] {
        for term in ["p", "i", "d", "f"] {
            let key = format!("set {}_{} = ", term, axis_key);
            assert!(
                report.commands.iter().any(|c| c.starts_with(&key)),
                "missing command for {}{}",
                term,
                axis_key
            );
        }
    }
    assert!(report
        .commands
        .iter()
        .any(|c| c.starts_with("set gyro_lowpass_hz = ")));
}
