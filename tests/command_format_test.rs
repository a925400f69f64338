// tests/command_format_test.rs
//
// The textual command contract: "set <key> = <value>" lines terminated
// by "save", stable across firmware generations and telemetry flags.

use bbtune::analysis::{run_analysis, AnalysisOptions};
use bbtune::data_input::header_metadata::FirmwareGeneration;
use bbtune::data_input::log_data::LogRowData;
use bbtune::data_input::log_parser::{estimate_sample_rate, ParsedLog};
use bbtune::tuning::drone::DroneParameters;

fn basic_log(header_metadata: Vec<(String, String)>) -> ParsedLog {
    let rows: Vec<LogRowData> = (0..600)
        .map(|i| {
            let mut row = LogRowData::default();
            row.time_sec = Some(i as f64 * 0.001);
            row.gyro = [Some(3.0), Some(-2.0), Some(1.0)];
            row.rc_command = [Some(1500.0), Some(1500.0), Some(1500.0), Some(1450.0)];
            row.motor = [Some(1480.0); 4];
            row
        })
        .collect();
    let sample_rate = estimate_sample_rate(&rows);
    ParsedLog { rows, sample_rate, header_metadata }
}

fn meta(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[test]
fn test_every_command_matches_contract() {
    let report = run_analysis(
        &basic_log(Vec::new()),
        &DroneParameters::default(),
        &AnalysisOptions::default(),
    )
    .unwrap();

    let (last, body) = report.commands.split_last().unwrap();
    assert_eq!(last, "save");
    for command in body {
        let rest = command.strip_prefix("set ").expect("must start with 'set '");
        let mut parts = rest.split(" = ");
        let key = parts.next().unwrap();
        let value = parts.next().expect("must contain ' = '");
        assert!(parts.next().is_none());
        assert!(!key.is_empty() && !key.contains(' '));
        assert!(value.parse::<i64>().is_ok(), "non-integer value in {:?}", command);
    }
}

#[test]
fn test_legacy_and_modern_generations_differ_only_in_new_keys() {
    let modern = run_analysis(
        &basic_log(Vec::new()),
        &DroneParameters::default(),
        &AnalysisOptions { firmware_generation: FirmwareGeneration::Modern, ..Default::default() },
    )
    .unwrap();
    let legacy = run_analysis(
        &basic_log(Vec::new()),
        &DroneParameters::default(),
        &AnalysisOptions { firmware_generation: FirmwareGeneration::Legacy, ..Default::default() },
    )
    .unwrap();

    assert!(modern.commands.iter().any(|c| c.contains("d_min_roll")));
    assert!(modern.commands.iter().any(|c| c.contains("gyro_lowpass2_hz")));
    assert!(!legacy.commands.iter().any(|c| c.contains("d_min")));
    assert!(!legacy.commands.iter().any(|c| c.contains("gyro_lowpass2_hz")));

    // Shared keys appear in both generations.
    let legacy_keys: Vec<&str> = legacy
        .commands
        .iter()
        .filter_map(|c| c.strip_prefix("set "))
        .filter_map(|c| c.split(" = ").next())
        .collect();
    for key in legacy_keys {
        assert!(
            modern.commands.iter().any(|c| c.contains(key)),
            "modern output lost key {}",
            key
        );
    }
}

#[test]
fn test_bidir_telemetry_header_enables_rpm_filter_commands() {
    let with_bidir = run_analysis(
        &basic_log(meta(&[("dshot_bidir", "1"), ("motor_poles", "14")])),
        &DroneParameters::default(),
        &AnalysisOptions::default(),
    )
    .unwrap();
    assert!(with_bidir.filters.rpm_filter.is_some());
    assert!(with_bidir
        .commands
        .iter()
        .any(|c| c.starts_with("set rpm_filter_harmonics = ")));

    let without = run_analysis(
        &basic_log(Vec::new()),
        &DroneParameters::default(),
        &AnalysisOptions::default(),
    )
    .unwrap();
    assert!(without.filters.rpm_filter.is_none());
    assert!(!without.commands.iter().any(|c| c.contains("rpm_filter")));
}

#[test]
fn test_looptime_header_sets_sample_rate() {
    let report = run_analysis(
        &basic_log(meta(&[("looptime", "500")])),
        &DroneParameters::default(),
        &AnalysisOptions::default(),
    )
    .unwrap();
    // 1e6 / 500 us = 2000 Hz, preferred over the timestamp estimate.
    assert!((report.sample_rate - 2000.0).abs() < 1e-6);
}

#[test]
fn test_controller_override_changes_recommendation() {
    let racing = run_analysis(
        &basic_log(Vec::new()),
        &DroneParameters::default(),
        &AnalysisOptions { controller: Some("racing".to_string()), ..Default::default() },
    )
    .unwrap();
    let cinematic = run_analysis(
        &basic_log(Vec::new()),
        &DroneParameters::default(),
        &AnalysisOptions { controller: Some("cinematic".to_string()), ..Default::default() },
    )
    .unwrap();
    assert_eq!(racing.pid.controller.name(), "racing");
    assert_eq!(cinematic.pid.controller.name(), "cinematic");
    // Racing tunes harder than cinematic for the same log.
    assert!(racing.pid.axes[0].f > cinematic.pid.axes[0].f);
}
