// src/constants.rs
//
// Heuristic thresholds and limits for the analysis pipeline. These encode
// empirically tuned behavior; changing them changes recommendations.

// --- Sample preparation ---
pub const GYRO_PLAUSIBLE_LIMIT_DEG_S: f64 = 3000.0;
pub const MOTOR_OUTPUT_MIN: f64 = 900.0;
pub const MOTOR_OUTPUT_MAX: f64 = 2100.0;
pub const MIN_VALID_ROWS: usize = 10;

// --- Spectral analysis ---
pub const MIN_FFT_SAMPLES: usize = 32;
// A bin is a peak candidate only when it exceeds its neighbors and this
// multiple of the spectrum's mean magnitude.
pub const PEAK_MEAN_RATIO: f64 = 3.0;
// Peaks below this frequency are airframe translation / DC, not noise.
pub const SPECTRUM_NOISE_FLOOR_HZ: f64 = 10.0;
pub const MAX_REPORTED_PEAKS: usize = 25;
pub const NOISE_LEVEL_BAND_LOW_HZ: f64 = 20.0;
pub const NOISE_LEVEL_BAND_HIGH_HZ: f64 = 500.0;
pub const NOISE_LEVEL_SCALE: f64 = 100.0;
pub const BAND_SEVERITY_AVG_WEIGHT: f64 = 10.0;
pub const BAND_SEVERITY_PEAK_WEIGHT: f64 = 5.0;

// --- Step response analysis ---
// Commanded-value change between consecutive samples that opens a step.
pub const STEP_DETECT_THRESHOLD: f64 = 30.0;
// Steps smaller than this are too small to characterize reliably.
pub const STEP_MIN_MAGNITUDE: f64 = 5.0;
pub const TRANSIENT_WINDOW_SAMPLES: usize = 100;
pub const TRANSIENT_MIN_POINTS: usize = 20;
pub const MIN_RESPONSE_SAMPLES: usize = 100;
pub const SETTLING_BAND_FRACTION: f64 = 0.05;
pub const SETTLING_HOLD_SAMPLES: usize = 10;
pub const RISE_LOW_FRACTION: f64 = 0.1;
pub const RISE_HIGH_FRACTION: f64 = 0.9;
// When a 10%/90% crossing is missing, rise time approximates to this
// fraction of settling time. PID recommendations key off rise time, so
// this fallback is load-bearing.
pub const RISE_TIME_SETTLING_FALLBACK: f64 = 0.6;

// --- Harmonic distortion ---
pub const THD_OSCILLATION_THRESHOLD_PERCENT: f64 = 30.0;

// --- Flight profile classification ---
pub const AGGRESSIVENESS_RATE_WEIGHT: f64 = 0.7;
pub const AGGRESSIVENESS_EXTREME_WEIGHT: f64 = 0.3;
pub const AGGRESSIVENESS_RATE_PERCENTILE: f64 = 0.90;
pub const AGGRESSIVENESS_RATE_NORMALIZER: f64 = 100.0;
pub const RC_COMMAND_CENTER: f64 = 1500.0;
pub const RC_COMMAND_HALF_RANGE: f64 = 500.0;
pub const EXTREME_COMMAND_FRACTION: f64 = 0.8;
pub const SMOOTHNESS_RMS_NORMALIZER: f64 = 50.0;
pub const THROTTLE_HISTOGRAM_BINS: usize = 10;
pub const THROTTLE_MIN: f64 = 1000.0;
pub const THROTTLE_RANGE: f64 = 1000.0;
pub const PUNCHOUT_TOP_BIN_FRACTION: f64 = 0.4;
pub const HOVER_MID_BIN_FRACTION: f64 = 0.5;
pub const MOTOR_USAGE_PERCENTILE: f64 = 0.95;
pub const MOTOR_BALANCE_STDDEV_NORMALIZER: f64 = 100.0;
pub const STYLE_RACING_AGGRESSIVENESS: f64 = 0.7;
pub const STYLE_CINEMATIC_SMOOTHNESS: f64 = 0.7;
pub const STYLE_FREESTYLE_AGGRESSIVENESS_LOW: f64 = 0.4;
pub const STYLE_FREESTYLE_AGGRESSIVENESS_HIGH: f64 = 0.8;

// --- Critical-parameter estimation ---
// Command change that opens a transition segment, and the smaller change
// below which the command counts as stable again.
pub const SEGMENT_OPEN_THRESHOLD: f64 = 30.0;
pub const SEGMENT_STABLE_THRESHOLD: f64 = 5.0;
pub const SEGMENT_STABLE_RUN: usize = 5;
pub const SEGMENT_MAX_SAMPLES: usize = 400;
pub const MIN_PEAK_PAIRS_HIGH_CONFIDENCE: usize = 3;
pub const DAMPING_HIGH_CONFIDENCE_MAX: f64 = 0.3;
pub const DAMPING_LOW_CONFIDENCE_MIN: f64 = 0.7;
pub const ULTIMATE_GAIN_MIN: f64 = 40.0;
pub const ULTIMATE_GAIN_MAX: f64 = 120.0;
pub const ULTIMATE_PERIOD_MIN_S: f64 = 0.01;
pub const ULTIMATE_PERIOD_MAX_S: f64 = 0.1;
pub const DEFAULT_ULTIMATE_GAIN: f64 = 60.0;
pub const DEFAULT_ULTIMATE_PERIOD_S: f64 = 0.025;

// --- PID recommendation ---
pub const PID_P_MIN: i32 = 20;
pub const PID_P_MAX: i32 = 80;
pub const PID_I_MIN: i32 = 30;
pub const PID_I_MAX: i32 = 120;
pub const PID_D_MIN: i32 = 10;
pub const PID_D_MAX: i32 = 50;
pub const PID_D_YAW_MIN: i32 = 0;
pub const PID_D_YAW_MAX: i32 = 20;
// Native-range scale factors applied before rounding and clamping.
pub const P_SCALE_FACTOR: f64 = 1.0;
pub const I_SCALE_FACTOR: f64 = 0.05;
pub const D_SCALE_FACTOR: f64 = 50.0;
pub const YAW_P_SCALE: f64 = 0.8;
pub const YAW_I_SCALE: f64 = 1.2;
pub const YAW_D_SCALE: f64 = 0.5;
pub const SMALL_PROP_INCHES: f64 = 3.0;
pub const LARGE_PROP_INCHES: f64 = 7.0;
pub const LIGHT_WEIGHT_GRAMS: f64 = 250.0;
pub const HEAVY_WEIGHT_GRAMS: f64 = 600.0;
pub const CELL_VOLTAGE_NOMINAL: f64 = 3.7;
pub const HIGH_VOLTAGE_THRESHOLD: f64 = 21.0;
pub const HIGH_KV_THRESHOLD: u32 = 2500;
pub const FEEDFORWARD_BASE: f64 = 100.0;
pub const FEEDFORWARD_MAX: i32 = 250;
pub const FEEDFORWARD_YAW_SCALE: f64 = 0.5;
pub const FEEDFORWARD_PITCH_SCALE: f64 = 1.1;
pub const FEEDFORWARD_RACING_SCALE: f64 = 1.3;
pub const FEEDFORWARD_CINEMATIC_SCALE: f64 = 0.7;
pub const MASTER_MULTIPLIER_MIN: f64 = 0.5;
pub const MASTER_MULTIPLIER_MAX: f64 = 1.5;
// H frames flex differently on the two cross arms; roll and pitch get
// de-coupled scaling while X frames scale uniformly.
pub const H_FRAME_ROLL_SCALE: f64 = 1.10;
pub const H_FRAME_PITCH_SCALE: f64 = 0.92;
// D-min emitted for modern firmware targets as a fraction of D.
pub const D_MIN_FACTOR: f64 = 0.6;
// Safe fallbacks when the estimator output cannot be used.
pub const SAFE_DEFAULT_P: i32 = 45;
pub const SAFE_DEFAULT_I: i32 = 80;
pub const SAFE_DEFAULT_D: i32 = 30;
pub const SAFE_DEFAULT_D_YAW: i32 = 0;
pub const SAFE_DEFAULT_F: i32 = 100;

// --- Filter recommendation ---
pub const GYRO_LPF_FREQ_FACTOR: f64 = 0.9;
pub const GYRO_LPF_MIN_HZ: f64 = 70.0;
pub const GYRO_LPF_MAX_HZ: f64 = 150.0;
pub const DTERM_LPF_GYRO_FACTOR: f64 = 0.85;
pub const DTERM_LPF_MIN_HZ: f64 = 60.0;
pub const DTERM_LPF_MAX_HZ: f64 = 120.0;
pub const DYN_NOTCH_MIN_FLOOR_HZ: f64 = 80.0;
pub const DYN_NOTCH_MAX_CEILING_HZ: f64 = 600.0;
pub const DYN_NOTCH_LOW_FACTOR: f64 = 0.7;
pub const DYN_NOTCH_HIGH_FACTOR: f64 = 1.5;
pub const DYN_NOTCH_PEAK_SEPARATION_HZ: f64 = 100.0;
pub const DYN_NOTCH_BRACKET_MARGIN_HZ: f64 = 30.0;
pub const DYN_NOTCH_DEFAULT_Q: u32 = 300;
pub const DYN_NOTCH_DEFAULT_COUNT: u32 = 3;
pub const RPM_FILTER_HARMONICS: u32 = 3;
pub const RPM_FILTER_Q: u32 = 500;
pub const RPM_FILTER_MIN_HZ: u32 = 100;
pub const FILTER_RACING_MULTIPLIER: f64 = 1.2;
pub const FILTER_CINEMATIC_MULTIPLIER: f64 = 0.85;
// Bands at or above this severity contribute an advisory note.
pub const BAND_NOTE_SEVERITY_THRESHOLD: f64 = 3.0;
// Fallback cutoff seed when no significant spectral peak exists.
pub const DEFAULT_NOISE_FREQUENCY_HZ: f64 = 120.0;

// src/constants.rs
