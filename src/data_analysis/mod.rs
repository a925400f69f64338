// src/data_analysis/mod.rs

pub mod critical_params;
pub mod fft_utils;
pub mod flight_profile;
pub mod harmonics;
pub mod spectral;
pub mod step_response;

// src/data_analysis/mod.rs
