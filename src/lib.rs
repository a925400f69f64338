// src/lib.rs - Library interface for the analysis engine

pub mod analysis;
pub mod axis_names;
pub mod constants;
pub mod data_analysis;
pub mod data_input;
pub mod error;
pub mod tuning;

pub fn crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// src/lib.rs
