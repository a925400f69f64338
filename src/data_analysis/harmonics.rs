// src/data_analysis/harmonics.rs
//
// Total-harmonic-distortion estimation over a magnitude spectrum, used
// as an inverse proxy for control-loop stability.

use serde::Serialize;

use crate::constants::THD_OSCILLATION_THRESHOLD_PERCENT;

/// Harmonic content of one channel's spectrum.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct HarmonicAnalysis {
    /// Frequency of the fundamental (largest non-DC bin); 0 when the
    /// spectrum is empty or silent.
    pub fundamental_hz: f64,
    /// Bin index of the fundamental; 0 when none was found.
    pub fundamental_bin: usize,
    pub thd_percent: f64,
    /// `100 - min(100, thd)`.
    pub stability_score: f64,
    /// Sustained-oscillation flag, fixed 30% threshold.
    pub oscillating: bool,
}

impl HarmonicAnalysis {
    /// Neutral result for silent or absent spectra.
    pub fn zero() -> Self {
        HarmonicAnalysis {
            fundamental_hz: 0.0,
            fundamental_bin: 0,
            thd_percent: 0.0,
            stability_score: 100.0,
            oscillating: false,
        }
    }
}

/// Locates the fundamental and sums harmonic power at integer multiples
/// of its bin index up to the spectrum's end.
///
/// Degenerate spectra (empty, all-zero, zero fundamental) yield the
/// neutral result; this never fails.
pub fn analyze_harmonics(spectrum: &[(f64, f64)]) -> HarmonicAnalysis {
    let fundamental_bin = match fundamental_bin(spectrum) {
        Some(bin) => bin,
        None => return HarmonicAnalysis::zero(),
    };
    let fundamental_magnitude = spectrum[fundamental_bin].1;
    if fundamental_magnitude <= 0.0 {
        return HarmonicAnalysis::zero();
    }

    let thd_percent = thd_at_bin(spectrum, fundamental_bin);

    HarmonicAnalysis {
        fundamental_hz: spectrum[fundamental_bin].0,
        fundamental_bin,
        thd_percent,
        stability_score: 100.0 - thd_percent.min(100.0),
        oscillating: thd_percent > THD_OSCILLATION_THRESHOLD_PERCENT,
    }
}

/// THD of a spectrum at an externally chosen fundamental bin. Used for
/// the per-PID-term diagnostics, which reuse the gyro's fundamental.
/// Returns 0 when the magnitude at that bin is zero.
pub fn thd_at_bin(spectrum: &[(f64, f64)], fundamental_bin: usize) -> f64 {
    if fundamental_bin == 0 || fundamental_bin >= spectrum.len() {
        return 0.0;
    }
    let fundamental_magnitude = spectrum[fundamental_bin].1;
    if fundamental_magnitude <= 0.0 {
        return 0.0;
    }

    let mut harmonic_power = 0.0;
    let mut k = 2;
    while k * fundamental_bin < spectrum.len() {
        let magnitude = spectrum[k * fundamental_bin].1;
        harmonic_power += magnitude * magnitude;
        k += 1;
    }

    harmonic_power.sqrt() / fundamental_magnitude * 100.0
}

/// Largest-magnitude bin excluding DC (index 0).
fn fundamental_bin(spectrum: &[(f64, f64)]) -> Option<usize> {
    if spectrum.len() < 2 {
        return None;
    }
    let mut best_bin = 0usize;
    let mut best_magnitude = 0.0f64;
    for (bin, &(_, magnitude)) in spectrum.iter().enumerate().skip(1) {
        if magnitude > best_magnitude {
            best_magnitude = magnitude;
            best_bin = bin;
        }
    }
    if best_bin == 0 {
        None
    } else {
        Some(best_bin)
    }
}


// src/data_analysis/harmonics.rs
