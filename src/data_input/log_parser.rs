// src/data_input/log_parser.rs

use csv::ReaderBuilder;
use log::{debug, info, warn};
use std::error::Error;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::data_input::log_data::{LogRowData, MOTOR_COUNT};

/// Everything extracted from one log file: parsed rows, the estimated
/// sample rate (mean positive time delta), and the pre-header metadata
/// key-value pairs.
#[derive(Debug, Default)]
pub struct ParsedLog {
    pub rows: Vec<LogRowData>,
    pub sample_rate: Option<f64>,
    pub header_metadata: Vec<(String, String)>,
}

// Column order of `TARGET_HEADERS`; keep the two in sync.
const IDX_TIME: usize = 0;
const IDX_P: usize = 1; // 1..=3
const IDX_I: usize = 4; // 4..=6
const IDX_D: usize = 7; // 7..=9
const IDX_F: usize = 10; // 10..=12
const IDX_SETPOINT: usize = 13; // 13..=16 (setpoint[3] is throttle)
const IDX_RC_COMMAND: usize = 17; // 17..=20 (rcCommand[3] is throttle)
const IDX_GYRO: usize = 21; // 21..=23
const IDX_MOTOR: usize = 24; // 24..=27
const IDX_VBAT: usize = 28;
const IDX_AMPERAGE: usize = 29;

const TARGET_HEADERS: [&str; 30] = [
    "time (us)",
    "axisP[0]", "axisP[1]", "axisP[2]",
    "axisI[0]", "axisI[1]", "axisI[2]",
    "axisD[0]", "axisD[1]", "axisD[2]",
    "axisF[0]", "axisF[1]", "axisF[2]",
    "setpoint[0]", "setpoint[1]", "setpoint[2]", "setpoint[3]",
    "rcCommand[0]", "rcCommand[1]", "rcCommand[2]", "rcCommand[3]",
    "gyroADC[0]", "gyroADC[1]", "gyroADC[2]",
    "motor[0]", "motor[1]", "motor[2]", "motor[3]",
    "vbatLatest (V)",
    "amperageLatest (A)",
];

/// Parses a blackbox CSV export: pre-header metadata block, column header
/// row, then data rows. Rows with a missing or unparseable timestamp are
/// skipped; every other field is optional per row.
pub fn parse_log_file(input_file_path: &Path) -> Result<ParsedLog, Box<dyn Error>> {
    let mut metadata: Vec<(String, String)> = Vec::new();
    let mut csv_lines: Vec<String> = Vec::new();
    let mut found_csv_headers = false;

    // First pass: separate the metadata block from the CSV body.
    {
        let file = File::open(input_file_path)?;
        let reader = BufReader::new(file);

        for line_result in reader.lines() {
            let line = line_result?;
            let trimmed_line = line.trim();

            if trimmed_line.is_empty() {
                continue;
            }

            if !found_csv_headers
                && trimmed_line.contains("time")
                && (trimmed_line.contains("gyroADC") || trimmed_line.contains("axisP"))
            {
                found_csv_headers = true;
                csv_lines.push(line);
                continue;
            }

            if found_csv_headers {
                csv_lines.push(line);
            } else {
                // Metadata lines are themselves tiny CSV records: "key","value"
                let mut rdr = ReaderBuilder::new()
                    .has_headers(false)
                    .from_reader(trimmed_line.as_bytes());
                if let Some(Ok(record)) = rdr.records().next() {
                    if record.len() >= 2 {
                        let key = record.get(0).unwrap_or("").trim().trim_matches('"').to_string();
                        let value = record.get(1).unwrap_or("").trim().trim_matches('"').to_string();
                        if !key.is_empty() {
                            metadata.push((key, value));
                        }
                    }
                }
            }
        }
    }

    if !found_csv_headers {
        return Err("Could not find CSV headers in the file".into());
    }
    info!("Extracted {} metadata entries", metadata.len());

    let csv_content = csv_lines.join("\n");

    // Map each known header name to its column index, once.
    let header_indices: Vec<Option<usize>>;
    {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(csv_content.as_bytes());
        let header_record = reader.headers()?.clone();

        header_indices = TARGET_HEADERS
            .iter()
            .enumerate()
            .map(|(i, &target_header)| {
                if i == IDX_TIME {
                    // Both "time (us)" and bare "time" appear in the wild.
                    header_record
                        .iter()
                        .position(|h| h.trim() == "time (us)" || h.trim() == "time")
                } else {
                    header_record.iter().position(|h| h.trim() == target_header)
                }
            })
            .collect();

        for (i, name) in TARGET_HEADERS.iter().enumerate() {
            debug!(
                "header '{}': {}",
                name,
                if header_indices[i].is_some() { "found" } else { "not found" }
            );
        }

        if header_indices[IDX_TIME].is_none() {
            return Err("Missing essential 'time' header. Aborting.".into());
        }
        if (0..3).all(|axis| header_indices[IDX_GYRO + axis].is_none()) {
            return Err("No gyroADC[0-2] headers found; nothing to analyze.".into());
        }
    }

    // Second pass: read the data rows.
    let mut rows: Vec<LogRowData> = Vec::new();
    {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(csv_content.as_bytes());

        for (row_index, result) in reader.records().enumerate() {
            match result {
                Ok(record) => {
                    let parse_f64_by_target_idx = |target_idx: usize| -> Option<f64> {
                        header_indices
                            .get(target_idx)
                            .and_then(|opt_csv_idx| opt_csv_idx.as_ref())
                            .and_then(|&csv_idx| record.get(csv_idx))
                            .and_then(|val_str| val_str.parse::<f64>().ok())
                    };

                    let mut row = LogRowData::default();

                    match parse_f64_by_target_idx(IDX_TIME) {
                        Some(t_us) => row.time_sec = Some(t_us / 1_000_000.0),
                        None => {
                            warn!("Skipping row {}: missing or invalid 'time (us)'", row_index + 1);
                            continue;
                        }
                    }

                    for axis in 0..3 {
                        row.p_term[axis] = parse_f64_by_target_idx(IDX_P + axis);
                        row.i_term[axis] = parse_f64_by_target_idx(IDX_I + axis);
                        row.d_term[axis] = parse_f64_by_target_idx(IDX_D + axis);
                        row.f_term[axis] = parse_f64_by_target_idx(IDX_F + axis);
                        row.gyro[axis] = parse_f64_by_target_idx(IDX_GYRO + axis);
                    }

                    for channel in 0..4 {
                        row.setpoint[channel] = parse_f64_by_target_idx(IDX_SETPOINT + channel);
                        row.rc_command[channel] = parse_f64_by_target_idx(IDX_RC_COMMAND + channel);
                    }

                    for motor in 0..MOTOR_COUNT {
                        row.motor[motor] = parse_f64_by_target_idx(IDX_MOTOR + motor);
                    }

                    row.battery_voltage = parse_f64_by_target_idx(IDX_VBAT);
                    row.battery_current = parse_f64_by_target_idx(IDX_AMPERAGE);

                    rows.push(row);
                }
                Err(e) => {
                    warn!("Skipping row {}: CSV read error: {}", row_index + 1, e);
                }
            }
        }
    }
    info!("Finished reading {} data rows.", rows.len());

    let sample_rate = estimate_sample_rate(&rows);
    match sample_rate {
        Some(sr) => info!("Estimated sample rate: {:.2} Hz", sr),
        None => warn!("Could not determine sample rate (need >= 2 distinct timestamps)."),
    }

    Ok(ParsedLog { rows, sample_rate, header_metadata: metadata })
}

/// Mean positive time delta across the log, inverted. Used when the
/// header metadata does not supply a loop time.
pub fn estimate_sample_rate(rows: &[LogRowData]) -> Option<f64> {
    let mut total_delta = 0.0;
    let mut count = 0u64;
    let mut prev_time: Option<f64> = None;
    for row in rows {
        if let Some(current_time) = row.time_sec {
            if let Some(pt) = prev_time {
                let delta = current_time - pt;
                if delta > 1e-9 {
                    total_delta += delta;
                    count += 1;
                }
            }
            prev_time = Some(current_time);
        }
    }
    if count == 0 {
        return None;
    }
    Some(count as f64 / total_delta)
}


// src/data_input/log_parser.rs
