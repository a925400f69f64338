// src/data_analysis/spectral.rs
//
// Frequency-domain noise characterization: magnitude spectrum, peak
// detection, named band aggregation, and a scalar noise level.

use serde::Serialize;

use crate::constants::{
    BAND_SEVERITY_AVG_WEIGHT, BAND_SEVERITY_PEAK_WEIGHT, MAX_REPORTED_PEAKS, MIN_FFT_SAMPLES,
    NOISE_LEVEL_BAND_HIGH_HZ, NOISE_LEVEL_BAND_LOW_HZ, NOISE_LEVEL_SCALE, PEAK_MEAN_RATIO,
    SPECTRUM_NOISE_FLOOR_HZ,
};
use crate::data_analysis::fft_utils::SpectrumPlanner;

/// One detected spectral peak.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpectralPeak {
    pub frequency: f64,
    pub amplitude: f64,
}

/// Static definition of a known noise band.
pub struct BandDefinition {
    pub name: &'static str,
    pub min_hz: f64,
    pub max_hz: f64,
    pub probable_cause: &'static str,
}

/// Catalog of known multirotor noise sources, 5-500 Hz. Membership is
/// half-open `[min_hz, max_hz)` so a bin on a boundary belongs to
/// exactly one band.
pub const FREQUENCY_BANDS: [BandDefinition; 5] = [
    BandDefinition {
        name: "Prop Wash",
        min_hz: 5.0,
        max_hz: 30.0,
        probable_cause: "Propeller turbulence during direction changes",
    },
    BandDefinition {
        name: "Frame Resonance",
        min_hz: 30.0,
        max_hz: 80.0,
        probable_cause: "Frame flex or loose hardware",
    },
    BandDefinition {
        name: "Mechanical Mid",
        min_hz: 80.0,
        max_hz: 200.0,
        probable_cause: "Motor vibration or damaged propellers",
    },
    BandDefinition {
        name: "Mechanical High",
        min_hz: 200.0,
        max_hz: 400.0,
        probable_cause: "Bearing wear or motor imbalance",
    },
    BandDefinition {
        name: "Electrical",
        min_hz: 400.0,
        max_hz: 500.0,
        probable_cause: "Electrical noise or gyro aliasing",
    },
];

/// Per-band aggregation of spectral energy.
#[derive(Debug, Clone, Serialize)]
pub struct FrequencyBand {
    pub name: &'static str,
    pub min_hz: f64,
    pub max_hz: f64,
    pub probable_cause: &'static str,
    /// `10*avg + 5*peak`; unbounded, capped at display time if at all.
    pub severity: f64,
    pub average_amplitude: f64,
    pub peak_amplitude: f64,
    pub peaks: Vec<SpectralPeak>,
}

/// Full spectral characterization of one channel.
#[derive(Debug, Clone, Serialize)]
pub struct SpectralAnalysis {
    /// Detected peaks, descending amplitude.
    pub peaks: Vec<SpectralPeak>,
    /// Frequency of the strongest peak; 0 when no peak was found.
    pub dominant_frequency: f64,
    pub bands: Vec<FrequencyBand>,
    /// Mean magnitude in the 20-500 Hz range, scaled x100.
    pub noise_level: f64,
    /// `(frequency_hz, magnitude)` pairs; not serialized (bulk data).
    #[serde(skip)]
    pub spectrum: Vec<(f64, f64)>,
}

impl SpectralAnalysis {
    /// The "no data" result: all zeros, empty peak list, zero-valued
    /// bands. Returned for short channels; callers must treat it as
    /// absence of data, not as a measurement.
    pub fn zero() -> Self {
        SpectralAnalysis {
            peaks: Vec::new(),
            dominant_frequency: 0.0,
            bands: FREQUENCY_BANDS
                .iter()
                .map(|def| FrequencyBand {
                    name: def.name,
                    min_hz: def.min_hz,
                    max_hz: def.max_hz,
                    probable_cause: def.probable_cause,
                    severity: 0.0,
                    average_amplitude: 0.0,
                    peak_amplitude: 0.0,
                    peaks: Vec::new(),
                })
                .collect(),
            noise_level: 0.0,
            spectrum: Vec::new(),
        }
    }
}

/// Analyzes one channel. Channels shorter than `MIN_FFT_SAMPLES` return
/// the zero-valued result, never an error.
pub fn analyze(
    planner: &mut SpectrumPlanner,
    signal: &[f64],
    sample_rate: f64,
) -> SpectralAnalysis {
    analyze_with_limit(planner, signal, sample_rate, MAX_REPORTED_PEAKS)
}

/// As `analyze`, with an explicit cap on the number of returned peaks.
pub fn analyze_with_limit(
    planner: &mut SpectrumPlanner,
    signal: &[f64],
    sample_rate: f64,
    max_peaks: usize,
) -> SpectralAnalysis {
    if signal.len() < MIN_FFT_SAMPLES || sample_rate <= 0.0 {
        return SpectralAnalysis::zero();
    }

    let spectrum = planner.magnitude_spectrum(signal, sample_rate);
    if spectrum.is_empty() {
        return SpectralAnalysis::zero();
    }

    let peaks = find_peaks(&spectrum, max_peaks);
    let dominant_frequency = peaks.first().map_or(0.0, |p| p.frequency);
    let bands = aggregate_bands(&spectrum, &peaks);
    let noise_level = noise_level(&spectrum);

    SpectralAnalysis {
        peaks,
        dominant_frequency,
        bands,
        noise_level,
        spectrum,
    }
}

/// A bin is a peak when it exceeds both neighbors and `PEAK_MEAN_RATIO`
/// times the spectrum's mean magnitude. Bins under the noise floor
/// frequency are translation/DC content, not noise, and are discarded.
/// Result is sorted by descending amplitude and capped at `max_peaks`.
fn find_peaks(spectrum: &[(f64, f64)], max_peaks: usize) -> Vec<SpectralPeak> {
    if spectrum.len() < 3 {
        return Vec::new();
    }

    let mean_magnitude =
        spectrum.iter().map(|&(_, m)| m).sum::<f64>() / spectrum.len() as f64;
    let threshold = PEAK_MEAN_RATIO * mean_magnitude;

    let mut peaks: Vec<SpectralPeak> = Vec::new();
    for j in 1..spectrum.len() - 1 {
        let (freq, amp) = spectrum[j];
        if freq < SPECTRUM_NOISE_FLOOR_HZ {
            continue;
        }
        if amp > spectrum[j - 1].1 && amp > spectrum[j + 1].1 && amp > threshold {
            peaks.push(SpectralPeak { frequency: freq, amplitude: amp });
        }
    }

    peaks.sort_by(|a, b| {
        b.amplitude
            .partial_cmp(&a.amplitude)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    peaks.truncate(max_peaks);
    peaks
}

fn aggregate_bands(spectrum: &[(f64, f64)], peaks: &[SpectralPeak]) -> Vec<FrequencyBand> {
    FREQUENCY_BANDS
        .iter()
        .map(|def| {
            let mut sum = 0.0;
            let mut count = 0usize;
            let mut peak_amplitude = 0.0f64;
            for &(freq, mag) in spectrum {
                if freq >= def.min_hz && freq < def.max_hz {
                    sum += mag;
                    count += 1;
                    peak_amplitude = peak_amplitude.max(mag);
                }
            }
            let average_amplitude = if count > 0 { sum / count as f64 } else { 0.0 };
            let severity = BAND_SEVERITY_AVG_WEIGHT * average_amplitude
                + BAND_SEVERITY_PEAK_WEIGHT * peak_amplitude;
            let band_peaks = peaks
                .iter()
                .filter(|p| p.frequency >= def.min_hz && p.frequency < def.max_hz)
                .copied()
                .collect();

            FrequencyBand {
                name: def.name,
                min_hz: def.min_hz,
                max_hz: def.max_hz,
                probable_cause: def.probable_cause,
                severity,
                average_amplitude,
                peak_amplitude,
                peaks: band_peaks,
            }
        })
        .collect()
}

fn noise_level(spectrum: &[(f64, f64)]) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for &(freq, mag) in spectrum {
        if (NOISE_LEVEL_BAND_LOW_HZ..=NOISE_LEVEL_BAND_HIGH_HZ).contains(&freq) {
            sum += mag;
            count += 1;
        }
    }
    if count == 0 {
        return 0.0;
    }
    NOISE_LEVEL_SCALE * sum / count as f64
}


// src/data_analysis/spectral.rs
