// src/analysis.rs
//
// Pipeline orchestration: channels -> per-axis analyses -> profile ->
// recommendation engines -> report. Per-axis failures degrade to
// zero-valued or unavailable results; only structurally fatal
// conditions (no valid samples, unknown controller type) abort.

use log::{info, warn};

use crate::axis_names::Axis;
use crate::constants::MIN_FFT_SAMPLES;
use crate::data_analysis::critical_params::{self, CriticalParameters};
use crate::data_analysis::fft_utils::SpectrumPlanner;
use crate::data_analysis::flight_profile;
use crate::data_analysis::harmonics::{self, HarmonicAnalysis};
use crate::data_analysis::spectral::{self, SpectralAnalysis};
use crate::data_analysis::step_response::{self, PidTermChannels, ResponseOutcome};
use crate::data_input::header_metadata::{self, FirmwareGeneration};
use crate::data_input::log_parser::ParsedLog;
use crate::data_input::sample_filter::{self, ChannelSet};
use crate::error::AnalysisError;
use crate::tuning::drone::DroneParameters;
use crate::tuning::filter_engine;
use crate::tuning::pid_engine::{self, ControllerType};
use crate::tuning::report::{self, AnalysisReport, AxisAnalysis, PidTermDistortion};

/// Caller-tunable knobs for one analysis run.
#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    /// Tuning archetype override; classified flight style decides when
    /// unset. Unknown names are fatal.
    pub controller: Option<String>,
    pub firmware_generation: FirmwareGeneration,
    /// Explicit sample rate; header loop time or timestamp deltas are
    /// used when unset.
    pub sample_rate: Option<f64>,
}

/// Runs the full analysis pipeline over a parsed log.
pub fn run_analysis(
    parsed: &ParsedLog,
    drone: &DroneParameters,
    options: &AnalysisOptions,
) -> Result<AnalysisReport, AnalysisError> {
    let meta = header_metadata::parse_header_metadata(&parsed.header_metadata);

    let sample_rate = options
        .sample_rate
        .or(meta.loop_sample_rate)
        .or(parsed.sample_rate)
        .ok_or(AnalysisError::InsufficientData { need: 2, got: parsed.rows.len().min(1) })?;

    let channels = sample_filter::prepare_channels(&parsed.rows)?;
    info!(
        "Analyzing {} samples at {:.0} Hz",
        channels.len(),
        sample_rate
    );

    let mut planner = SpectrumPlanner::new();

    let axes: Vec<AxisAnalysis> = Axis::ALL
        .iter()
        .map(|&axis| analyze_axis(axis, &channels, sample_rate, &mut planner))
        .collect();

    let profile = flight_profile::classify(&channels);
    info!(
        "Flight profile: {} (aggressiveness {:.2}, smoothness {:.2})",
        profile.style.name(),
        profile.aggressiveness,
        profile.smoothness
    );

    let controller = match &options.controller {
        Some(name) => ControllerType::from_name(name)?,
        None => ControllerType::from_style(profile.style),
    };

    let critical: [CriticalParameters; 3] =
        std::array::from_fn(|index| axes[index].critical);
    let pid = pid_engine::recommend_pids(&critical, drone, &profile, controller);

    let spectral: [SpectralAnalysis; 3] =
        std::array::from_fn(|index| axes[index].spectral.clone());
    let filters = filter_engine::recommend_filters(
        &spectral,
        &profile,
        options.firmware_generation,
        meta.bidir_telemetry,
    );

    let commands = report::generate_commands(&pid, &filters, options.firmware_generation)?;

    Ok(AnalysisReport {
        sample_rate,
        sample_count: channels.len(),
        axes,
        profile,
        pid,
        filters,
        commands,
    })
}

/// All per-axis analyses. Missing channels degrade this axis only.
fn analyze_axis(
    axis: Axis,
    channels: &ChannelSet,
    sample_rate: f64,
    planner: &mut SpectrumPlanner,
) -> AxisAnalysis {
    let index = axis.index();

    let (spectral_result, harmonic_result, term_distortion) = match &channels.gyro[index] {
        Some(gyro) => {
            let spectral_result = spectral::analyze(planner, gyro, sample_rate);
            let harmonic_result = harmonics::analyze_harmonics(&spectral_result.spectrum);
            let term_distortion = term_distortion(
                channels,
                index,
                harmonic_result.fundamental_bin,
                sample_rate,
                planner,
            );
            (spectral_result, harmonic_result, term_distortion)
        }
        None => {
            warn!("{}: gyro channel absent, spectral analysis skipped", axis.name());
            (
                SpectralAnalysis::zero(),
                HarmonicAnalysis::zero(),
                PidTermDistortion::default(),
            )
        }
    };

    let (response, critical) = match (channels.command_channel(index), &channels.gyro[index]) {
        (Some(command), Some(gyro)) => {
            let terms = PidTermChannels {
                p: channels.p_term[index].as_deref(),
                i: channels.i_term[index].as_deref(),
                d: channels.d_term[index].as_deref(),
                f: channels.f_term[index].as_deref(),
            };
            let response =
                step_response::analyze_response(&channels.time, command, gyro, &terms, None);
            let critical =
                critical_params::estimate_critical_parameters(command, gyro, sample_rate);
            (response, critical)
        }
        _ => {
            warn!(
                "{}: command or gyro channel absent, response analysis skipped",
                axis.name()
            );
            (
                ResponseOutcome::Unavailable {
                    reason: "command or gyro channel absent".to_string(),
                },
                CriticalParameters::conservative_default(),
            )
        }
    };

    AxisAnalysis {
        axis,
        spectral: spectral_result,
        harmonics: harmonic_result,
        term_distortion,
        response,
        critical,
    }
}

/// Per-term THD at the gyro's fundamental bin. Terms that are absent or
/// too short contribute zero.
fn term_distortion(
    channels: &ChannelSet,
    index: usize,
    fundamental_bin: usize,
    sample_rate: f64,
    planner: &mut SpectrumPlanner,
) -> PidTermDistortion {
    if fundamental_bin == 0 {
        return PidTermDistortion::default();
    }

    let mut thd_of = |channel: &Option<Vec<f64>>| -> f64 {
        match channel {
            Some(data) if data.len() >= MIN_FFT_SAMPLES => {
                let spectrum = planner.magnitude_spectrum(data, sample_rate);
                harmonics::thd_at_bin(&spectrum, fundamental_bin)
            }
            _ => 0.0,
        }
    };

    PidTermDistortion {
        p_thd_percent: thd_of(&channels.p_term[index]),
        i_thd_percent: thd_of(&channels.i_term[index]),
        d_thd_percent: thd_of(&channels.d_term[index]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_input::log_data::LogRowData;

    fn parsed_log(rows: Vec<LogRowData>) -> ParsedLog {
        let sample_rate = crate::data_input::log_parser::estimate_sample_rate(&rows);
        ParsedLog { rows, sample_rate, header_metadata: Vec::new() }
    }

    fn flight_rows(n: usize) -> Vec<LogRowData> {
        (0..n)
            .map(|i| {
                let mut row = LogRowData::default();
                row.time_sec = Some(i as f64 * 0.001);
                row.gyro = [Some(1.0), Some(-0.5), Some(0.2)];
                row.rc_command = [Some(1500.0), Some(1500.0), Some(1500.0), Some(1400.0)];
                row.motor = [Some(1450.0); 4];
                row
            })
            .collect()
    }

    #[test]
    fn test_pipeline_produces_complete_report_from_quiet_log() {
        let parsed = parsed_log(flight_rows(500));
        let report = run_analysis(
            &parsed,
            &DroneParameters::default(),
            &AnalysisOptions::default(),
        )
        .unwrap();

        assert_eq!(report.axes.len(), 3);
        assert_eq!(report.sample_count, 500);
        assert_eq!(report.commands.last().unwrap(), "save");
        // Quiet sticks: no step to characterize, degraded but present.
        assert!(report.axes.iter().all(|a| a.response.metrics().is_none()));
    }

    #[test]
    fn test_pipeline_fails_without_samples() {
        let parsed = parsed_log(flight_rows(4));
        let result = run_analysis(
            &parsed,
            &DroneParameters::default(),
            &AnalysisOptions::default(),
        );
        assert!(matches!(
            result,
            Err(AnalysisError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_unknown_controller_override_is_fatal() {
        let parsed = parsed_log(flight_rows(500));
        let options = AnalysisOptions {
            controller: Some("fuzzy".to_string()),
            ..Default::default()
        };
        let result = run_analysis(&parsed, &DroneParameters::default(), &options);
        assert!(matches!(
            result,
            Err(AnalysisError::UnknownControllerType(_))
        ));
    }

    #[test]
    fn test_missing_axis_channel_degrades_only_that_axis() {
        let mut rows = flight_rows(500);
        for row in rows.iter_mut() {
            row.gyro[2] = None; // yaw gyro never logged
        }
        let parsed = parsed_log(rows);
        let report = run_analysis(
            &parsed,
            &DroneParameters::default(),
            &AnalysisOptions::default(),
        )
        .unwrap();

        let yaw = &report.axes[Axis::Yaw.index()];
        assert!(yaw.spectral.peaks.is_empty());
        assert_eq!(yaw.spectral.noise_level, 0.0);
        // Roll still analyzed.
        let roll = &report.axes[Axis::Roll.index()];
        assert!(!roll.spectral.spectrum.is_empty());
        // The report still carries commands.
        assert!(!report.commands.is_empty());
    }
}

// src/analysis.rs
