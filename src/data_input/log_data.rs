// src/data_input/log_data.rs

pub const MOTOR_COUNT: usize = 4;

/// Structure to hold data parsed from a single row of the CSV log.
/// Uses `Option<f64>` to handle potentially missing or unparseable values.
#[derive(Debug, Default, Clone)]
pub struct LogRowData {
    pub time_sec: Option<f64>,          // Timestamp (in seconds).
    pub p_term: [Option<f64>; 3],       // Proportional term [Roll, Pitch, Yaw].
    pub i_term: [Option<f64>; 3],       // Integral term [Roll, Pitch, Yaw].
    pub d_term: [Option<f64>; 3],       // Derivative term [Roll, Pitch, Yaw].
    pub f_term: [Option<f64>; 3],       // Feedforward term [Roll, Pitch, Yaw].
    pub setpoint: [Option<f64>; 4],     // Target rate [Roll, Pitch, Yaw, Throttle].
    pub rc_command: [Option<f64>; 4],   // Stick position [Roll, Pitch, Yaw, Throttle]. Fallback: setpoint.
    pub gyro: [Option<f64>; 3],         // Gyroscope readings (filtered) [Roll, Pitch, Yaw].
    pub motor: [Option<f64>; MOTOR_COUNT], // Motor outputs in native PWM-like units.
    pub battery_voltage: Option<f64>,   // Pack voltage (V).
    pub battery_current: Option<f64>,   // Pack current draw (A).
}

// src/data_input/log_data.rs
