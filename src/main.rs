// src/main.rs

use clap::Parser;
use std::error::Error;
use std::path::PathBuf;

use bbtune::analysis::{run_analysis, AnalysisOptions};
use bbtune::data_input::header_metadata::FirmwareGeneration;
use bbtune::data_input::log_parser::parse_log_file;
use bbtune::tuning::drone::{DroneParameters, FrameType};
use bbtune::tuning::report::AnalysisReport;

/// Analyzes a blackbox CSV log and prints PID and filter tuning
/// recommendations plus the CLI commands to apply them.
#[derive(Parser, Debug)]
#[command(name = "bbtune", version = bbtune::crate_version(), about)]
struct Cli {
    /// Blackbox CSV log file.
    log_file: PathBuf,

    /// Propeller size in inches.
    #[arg(long, default_value_t = 5.0)]
    prop_size: f64,

    /// All-up weight in grams.
    #[arg(long, default_value_t = 450.0)]
    weight: f64,

    /// Battery cell count.
    #[arg(long, default_value_t = 4)]
    cells: u32,

    /// Motor kV rating.
    #[arg(long, default_value_t = 1900)]
    kv: u32,

    /// Frame type: x or h.
    #[arg(long, default_value = "x")]
    frame: String,

    /// Tuning archetype override (p, pi, pd, pid, racing, freestyle,
    /// cinematic). Classified from the log when omitted.
    #[arg(long)]
    controller: Option<String>,

    /// Target older firmware without secondary low-pass and D-min.
    #[arg(long)]
    legacy: bool,

    /// Override the sample rate in Hz.
    #[arg(long)]
    sample_rate: Option<f64>,

    /// Emit the full report as JSON instead of text.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let frame_type = FrameType::from_name(&cli.frame)
        .ok_or_else(|| format!("unknown frame type '{}', expected x or h", cli.frame))?;

    let drone = DroneParameters {
        prop_size_inches: cli.prop_size,
        weight_grams: cli.weight,
        cell_count: cli.cells,
        motor_kv: cli.kv,
        frame_type,
    };

    let options = AnalysisOptions {
        controller: cli.controller.clone(),
        firmware_generation: if cli.legacy {
            FirmwareGeneration::Legacy
        } else {
            FirmwareGeneration::Modern
        },
        sample_rate: cli.sample_rate,
    };

    let parsed = parse_log_file(&cli.log_file)?;
    let report = run_analysis(&parsed, &drone, &options)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn print_report(report: &AnalysisReport) {
    println!("Samples analyzed: {} at {:.0} Hz", report.sample_count, report.sample_rate);
    println!(
        "Flight profile: {} (aggressiveness {:.2}, smoothness {:.2}, throttle {})",
        report.profile.style.name(),
        report.profile.aggressiveness,
        report.profile.smoothness,
        report.profile.throttle_profile.name()
    );
    println!(
        "Motor usage: average {:.2}, peak {:.2}, balance {:.2}",
        report.profile.motor_usage.average,
        report.profile.motor_usage.peak,
        report.profile.motor_usage.balance
    );

    for axis in &report.axes {
        println!("\n--- {} ---", axis.axis.name());
        if axis.spectral.dominant_frequency > 0.0 {
            println!(
                "  Dominant noise: {:.1} Hz (noise level {:.2})",
                axis.spectral.dominant_frequency, axis.spectral.noise_level
            );
        } else {
            println!("  No significant noise peaks.");
        }
        for band in &axis.spectral.bands {
            if band.severity > 0.0 {
                println!(
                    "  {} ({:.0}-{:.0} Hz): severity {:.1}",
                    band.name, band.min_hz, band.max_hz, band.severity
                );
            }
        }
        println!(
            "  Stability score: {:.0} (THD {:.1}%{})",
            axis.harmonics.stability_score,
            axis.harmonics.thd_percent,
            if axis.harmonics.oscillating { ", oscillating" } else { "" }
        );
        match axis.response.metrics() {
            Some(metrics) => println!(
                "  Step response: rise {:.1} ms, overshoot {:.1}%, settling {:.1} ms",
                metrics.rise_time_ms, metrics.overshoot_percent, metrics.settling_time_ms
            ),
            None => println!("  Step response: not measurable from this log."),
        }
        println!(
            "  Ku {:.1}, Tu {:.3} s ({} confidence)",
            axis.critical.ultimate_gain,
            axis.critical.ultimate_period_s,
            axis.critical.confidence.name()
        );
    }

    println!("\nRecommended PID values ({}):", report.pid.controller.name());
    for axis in &report.axes {
        let values = report.pid.axes[axis.axis.index()];
        println!(
            "  {:<5} P {:>3}  I {:>3}  D {:>3}  F {:>3}",
            axis.axis.name(),
            values.p,
            values.i,
            values.d,
            values.f
        );
    }

    println!("\nRecommended filters:");
    println!("  gyro lowpass  {} Hz", report.filters.gyro_lowpass_hz);
    if let Some(lpf2) = report.filters.gyro_lowpass2_hz {
        println!("  gyro lowpass2 {} Hz", lpf2);
    }
    println!("  dterm lowpass {} Hz", report.filters.dterm_lowpass_hz);
    println!(
        "  dyn notch     {}-{} Hz (q {}, count {})",
        report.filters.dyn_notch.min_hz,
        report.filters.dyn_notch.max_hz,
        report.filters.dyn_notch.q,
        report.filters.dyn_notch.count
    );

    let notes: Vec<&String> = report
        .pid
        .notes
        .iter()
        .chain(report.filters.notes.iter())
        .collect();
    if !notes.is_empty() {
        println!("\nNotes:");
        for note in notes {
            println!("  - {}", note);
        }
    }

    println!("\nCommands:");
    for command in &report.commands {
        println!("{}", command);
    }
}

// src/main.rs
