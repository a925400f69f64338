// src/data_input/header_metadata.rs

use std::collections::HashMap;

/// Firmware family detection for terminology and command output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FirmwareType {
    Betaflight,
    EmuFlight,
    Inav,
    #[default]
    Unknown,
}

/// Output-format generation of the target firmware. Legacy targets have
/// no secondary low-pass stage and no D-min keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FirmwareGeneration {
    Legacy,
    #[default]
    Modern,
}

/// Currently-configured gains for a single axis, parsed from the
/// comma-separated `"P,I,D[,F]"` header strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct AxisGains {
    pub p: Option<u32>,
    pub i: Option<u32>,
    pub d: Option<u32>,
    pub d_max: Option<u32>,
    pub ff: Option<u32>,
}

/// Currently-configured filter settings, used for round-trip comparison
/// and advisory notes.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrentFilters {
    pub gyro_lowpass_hz: Option<u32>,
    pub dterm_lowpass_hz: Option<u32>,
    pub dyn_notch_min_hz: Option<u32>,
    pub dyn_notch_max_hz: Option<u32>,
}

/// Everything the tuning pipeline consumes from the log's header block.
#[derive(Debug, Clone, Default)]
pub struct HeaderMetadata {
    pub firmware_type: FirmwareType,
    pub current_gains: [AxisGains; 3], // [Roll, Pitch, Yaw]
    pub current_filters: CurrentFilters,
    /// Sample rate derived from `looptime` (us): 1e6 / looptime.
    pub loop_sample_rate: Option<f64>,
    pub motor_poles: Option<u32>,
    pub bidir_telemetry: bool,
}

/// Parse the key-value pairs collected before the CSV column headers.
pub fn parse_header_metadata(pairs: &[(String, String)]) -> HeaderMetadata {
    let mut meta = HeaderMetadata::default();
    if pairs.is_empty() {
        return meta;
    }

    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_lowercase(), v.to_lowercase()))
        .collect();

    meta.firmware_type = detect_firmware_type(&map);

    if let Some(s) = map.get("rollpid") {
        meta.current_gains[0] = parse_axis_gains(s);
    }
    if let Some(s) = map.get("pitchpid") {
        meta.current_gains[1] = parse_axis_gains(s);
    }
    if let Some(s) = map.get("yawpid") {
        meta.current_gains[2] = parse_axis_gains(s);
    }

    // Betaflight style: ff_weight with roll,pitch,yaw values.
    if let Some(s) = map.get("ff_weight") {
        let values = parse_comma_separated_values(s);
        for (axis, &v) in values.iter().take(3).enumerate() {
            if v > 0 {
                meta.current_gains[axis].ff = Some(v);
            }
        }
    }

    if let Some(s) = map.get("looptime") {
        if let Ok(looptime_us) = s.trim().parse::<f64>() {
            if looptime_us > 0.0 {
                meta.loop_sample_rate = Some(1e6 / looptime_us);
            }
        }
    }

    if let Some(s) = map.get("motor_poles") {
        meta.motor_poles = s.trim().parse::<u32>().ok();
    }

    // Bidirectional DShot telemetry enables RPM filtering.
    if let Some(s) = map.get("dshot_bidir").or_else(|| map.get("motor_rpm_telemetry")) {
        meta.bidir_telemetry = matches!(s.trim(), "1" | "on" | "true" | "yes");
    }

    meta.current_filters = CurrentFilters {
        gyro_lowpass_hz: parse_u32_field(&map, "gyro_lowpass_hz"),
        dterm_lowpass_hz: parse_u32_field(&map, "dterm_lowpass_hz")
            .or_else(|| parse_u32_field(&map, "dterm_lpf_hz")),
        dyn_notch_min_hz: parse_u32_field(&map, "dyn_notch_min_hz"),
        dyn_notch_max_hz: parse_u32_field(&map, "dyn_notch_max_hz"),
    };

    meta
}

fn parse_u32_field(map: &HashMap<String, String>, key: &str) -> Option<u32> {
    map.get(key).and_then(|s| s.trim().parse::<u32>().ok())
}

fn detect_firmware_type(map: &HashMap<String, String>) -> FirmwareType {
    for key in ["firmware revision", "firmware type"] {
        if let Some(value) = map.get(key) {
            if value.contains("emuflight") {
                return FirmwareType::EmuFlight;
            }
            if value.contains("betaflight") {
                return FirmwareType::Betaflight;
            }
            if value.contains("inav") {
                return FirmwareType::Inav;
            }
        }
    }
    if map.contains_key("df_yaw") {
        return FirmwareType::EmuFlight;
    }
    if map.contains_key("ff_weight") {
        return FirmwareType::Betaflight;
    }
    FirmwareType::Unknown
}

/// Parse gains from `"31,56,21"` (basic), `"45,80,40,120"` (with FF), or
/// `"57,66,58,58,206"` (P,I,D,D-Max,FF).
fn parse_axis_gains(gains_str: &str) -> AxisGains {
    let values = parse_comma_separated_values(gains_str);

    let mut gains = AxisGains {
        p: values.first().copied(),
        i: values.get(1).copied(),
        d: values.get(2).copied(),
        ..Default::default()
    };

    match values.len() {
        4 => {
            if values[3] > 0 {
                gains.ff = Some(values[3]);
            }
        }
        5 => {
            gains.d_max = Some(values[3]);
            if values[4] > 0 {
                gains.ff = Some(values[4]);
            }
        }
        _ => {}
    }

    gains
}

fn parse_comma_separated_values(value_str: &str) -> Vec<u32> {
    value_str
        .split(',')
        .filter_map(|s| s.trim().parse::<u32>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_betaflight_gain_parsing() {
        let meta = parse_header_metadata(&pairs(&[
            ("firmware revision", "Betaflight 4.4.2"),
            ("rollPID", "31,56,21"),
            ("pitchPID", "32,58,23"),
            ("yawPID", "31,56,0"),
            ("ff_weight", "84,87,84"),
        ]));

        assert_eq!(meta.firmware_type, FirmwareType::Betaflight);
        assert_eq!(meta.current_gains[0].p, Some(31));
        assert_eq!(meta.current_gains[0].ff, Some(84));
        assert_eq!(meta.current_gains[1].d, Some(23));
        assert_eq!(meta.current_gains[2].d, Some(0));
    }

    #[test]
    fn test_five_value_gain_parsing() {
        let meta = parse_header_metadata(&pairs(&[("rollPID", "57,66,58,58,206")]));
        assert_eq!(meta.current_gains[0].p, Some(57));
        assert_eq!(meta.current_gains[0].d_max, Some(58));
        assert_eq!(meta.current_gains[0].ff, Some(206));
    }

    #[test]
    fn test_looptime_to_sample_rate() {
        let meta = parse_header_metadata(&pairs(&[("looptime", "125")]));
        let sr = meta.loop_sample_rate.unwrap();
        assert!((sr - 8000.0).abs() < 1e-6);
    }

    #[test]
    fn test_bidir_and_poles() {
        let meta = parse_header_metadata(&pairs(&[
            ("dshot_bidir", "1"),
            ("motor_poles", "14"),
        ]));
        assert!(meta.bidir_telemetry);
        assert_eq!(meta.motor_poles, Some(14));
    }

    #[test]
    fn test_current_filters() {
        let meta = parse_header_metadata(&pairs(&[
            ("gyro_lowpass_hz", "100"),
            ("dterm_lpf_hz", "90"),
            ("dyn_notch_min_hz", "90"),
            ("dyn_notch_max_hz", "350"),
        ]));
        assert_eq!(meta.current_filters.gyro_lowpass_hz, Some(100));
        assert_eq!(meta.current_filters.dterm_lowpass_hz, Some(90));
        assert_eq!(meta.current_filters.dyn_notch_max_hz, Some(350));
    }

    #[test]
    fn test_empty_metadata() {
        let meta = parse_header_metadata(&[]);
        assert_eq!(meta.firmware_type, FirmwareType::Unknown);
        assert_eq!(meta.current_gains[0].p, None);
        assert!(!meta.bidir_telemetry);
    }
}

// src/data_input/header_metadata.rs
