// src/data_analysis/fft_utils.rs

use num_complex::Complex64;
use realfft::RealFftPlanner;

/// Computes one-sided magnitude spectra with plans reused across calls.
///
/// `RealFftPlanner` caches each forward plan (twiddle tables and scratch
/// strategy) per length, so analyzing roll, pitch, and yaw channels of
/// equal length pays the planning cost once.
pub struct SpectrumPlanner {
    planner: RealFftPlanner<f64>,
}

impl SpectrumPlanner {
    pub fn new() -> Self {
        SpectrumPlanner {
            planner: RealFftPlanner::new(),
        }
    }

    /// Magnitude spectrum of a real signal: zero-pad to the next power of
    /// two, apply a Hann window across the padded buffer, run the real
    /// FFT, and keep the first N/2 bin magnitudes normalized by N/2.
    ///
    /// Returns `(frequency_hz, magnitude)` pairs. Deterministic for
    /// identical input and sample rate. Empty input yields an empty
    /// spectrum.
    pub fn magnitude_spectrum(&mut self, signal: &[f64], sample_rate: f64) -> Vec<(f64, f64)> {
        if signal.is_empty() || sample_rate <= 0.0 {
            return Vec::new();
        }

        let padded_n = signal.len().next_power_of_two();
        let mut input = vec![0.0f64; padded_n];
        input[..signal.len()].copy_from_slice(signal);

        let window = hann_window(padded_n);
        for (v, w) in input.iter_mut().zip(window.iter()) {
            *v *= w;
        }

        let plan = self.planner.plan_fft_forward(padded_n);
        let mut output: Vec<Complex64> = plan.make_output_vec();
        if plan.process(&mut input, &mut output).is_err() {
            log::warn!("FFT forward processing failed; returning empty spectrum.");
            return Vec::new();
        }

        let half_n = padded_n / 2;
        let bin_width = sample_rate / padded_n as f64;
        let norm = half_n as f64;
        output
            .iter()
            .take(half_n)
            .enumerate()
            .map(|(i, c)| (i as f64 * bin_width, c.norm() / norm))
            .collect()
    }
}

impl Default for SpectrumPlanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Hann window: `0.5 * (1 - cos(2*pi*i / (N-1)))`.
pub fn hann_window(n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![1.0];
    }
    (0..n)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f64::consts::PI * i as f64 / (n as f64 - 1.0)).cos()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hann_window_endpoints() {
        let w = hann_window(64);
        assert!(w[0].abs() < 1e-12);
        assert!(w[63].abs() < 1e-12);
        assert!((w[32] - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_spectrum_length_and_bin_width() {
        let mut planner = SpectrumPlanner::new();
        let signal = vec![0.0; 100]; // pads to 128
        let spectrum = planner.magnitude_spectrum(&signal, 1000.0);
        assert_eq!(spectrum.len(), 64);
        let bin_width = spectrum[1].0 - spectrum[0].0;
        assert!((bin_width - 1000.0 / 128.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_signal_yields_empty_spectrum() {
        let mut planner = SpectrumPlanner::new();
        assert!(planner.magnitude_spectrum(&[], 1000.0).is_empty());
    }

    #[test]
    fn test_spectrum_is_deterministic() {
        let signal: Vec<f64> = (0..256)
            .map(|i| (2.0 * std::f64::consts::PI * 50.0 * i as f64 / 1000.0).sin())
            .collect();
        let mut planner = SpectrumPlanner::new();
        let a = planner.magnitude_spectrum(&signal, 1000.0);
        let b = planner.magnitude_spectrum(&signal, 1000.0);
        assert_eq!(a, b);
    }
}

// src/data_analysis/fft_utils.rs
