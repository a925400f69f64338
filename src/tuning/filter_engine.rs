// src/tuning/filter_engine.rs
//
// Filter recommendation: gyro and D-term low-pass cutoffs from the
// lowest significant noise frequency, and a dynamic-notch band tracking
// the dominant peak(s).

use serde::Serialize;

use crate::constants::{
    BAND_NOTE_SEVERITY_THRESHOLD, DEFAULT_NOISE_FREQUENCY_HZ, DTERM_LPF_GYRO_FACTOR,
    DTERM_LPF_MAX_HZ, DTERM_LPF_MIN_HZ, DYN_NOTCH_BRACKET_MARGIN_HZ, DYN_NOTCH_DEFAULT_COUNT,
    DYN_NOTCH_DEFAULT_Q, DYN_NOTCH_HIGH_FACTOR, DYN_NOTCH_LOW_FACTOR, DYN_NOTCH_MAX_CEILING_HZ,
    DYN_NOTCH_MIN_FLOOR_HZ, DYN_NOTCH_PEAK_SEPARATION_HZ, FILTER_CINEMATIC_MULTIPLIER,
    FILTER_RACING_MULTIPLIER, GYRO_LPF_FREQ_FACTOR, GYRO_LPF_MAX_HZ, GYRO_LPF_MIN_HZ,
    RPM_FILTER_HARMONICS, RPM_FILTER_MIN_HZ, RPM_FILTER_Q,
};
use crate::data_analysis::flight_profile::{FlightProfile, FlightStyle};
use crate::data_analysis::spectral::{SpectralAnalysis, SpectralPeak};
use crate::data_input::header_metadata::FirmwareGeneration;

// Secondary gyro low-pass sits at twice the primary cutoff on modern
// firmware targets.
const GYRO_LPF2_FACTOR: f64 = 2.0;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct DynNotch {
    pub min_hz: u32,
    pub max_hz: u32,
    pub q: u32,
    pub count: u32,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct RpmFilter {
    pub harmonics: u32,
    pub q: u32,
    pub min_hz: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterRecommendation {
    pub gyro_lowpass_hz: u32,
    /// Secondary low-pass stage; absent on legacy firmware targets.
    pub gyro_lowpass2_hz: Option<u32>,
    pub dterm_lowpass_hz: u32,
    pub dyn_notch: DynNotch,
    /// Present only when bidirectional telemetry is available.
    pub rpm_filter: Option<RpmFilter>,
    pub notes: Vec<String>,
}

/// Derives filter settings from the per-axis spectral analyses and the
/// flight profile. Depends only on the measured spectrum, so re-running
/// on unchanged input reproduces the same recommendation.
pub fn recommend_filters(
    spectral: &[SpectralAnalysis; 3],
    profile: &FlightProfile,
    generation: FirmwareGeneration,
    bidir_telemetry: bool,
) -> FilterRecommendation {
    // Merge peaks across axes, strongest first.
    let mut peaks: Vec<SpectralPeak> = spectral
        .iter()
        .flat_map(|analysis| analysis.peaks.iter().copied())
        .collect();
    peaks.sort_by(|a, b| {
        b.amplitude
            .partial_cmp(&a.amplitude)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let lowest_noise_hz = peaks
        .iter()
        .map(|p| p.frequency)
        .fold(f64::INFINITY, f64::min);
    let lowest_noise_hz = if lowest_noise_hz.is_finite() {
        lowest_noise_hz
    } else {
        DEFAULT_NOISE_FREQUENCY_HZ
    };

    let style_multiplier = match profile.style {
        FlightStyle::Racing => FILTER_RACING_MULTIPLIER,
        FlightStyle::Cinematic => FILTER_CINEMATIC_MULTIPLIER,
        FlightStyle::Freestyle | FlightStyle::Mixed => 1.0,
    };

    let gyro_cutoff = (GYRO_LPF_FREQ_FACTOR * lowest_noise_hz)
        .clamp(GYRO_LPF_MIN_HZ, GYRO_LPF_MAX_HZ);
    let gyro_cutoff = (gyro_cutoff * style_multiplier).clamp(GYRO_LPF_MIN_HZ, GYRO_LPF_MAX_HZ);

    let dterm_cutoff =
        (DTERM_LPF_GYRO_FACTOR * gyro_cutoff).clamp(DTERM_LPF_MIN_HZ, DTERM_LPF_MAX_HZ);
    let dterm_cutoff =
        (dterm_cutoff * style_multiplier).clamp(DTERM_LPF_MIN_HZ, DTERM_LPF_MAX_HZ);

    let dyn_notch = dynamic_notch(&peaks);

    let gyro_lowpass2_hz = match generation {
        FirmwareGeneration::Modern => Some((gyro_cutoff * GYRO_LPF2_FACTOR).round() as u32),
        FirmwareGeneration::Legacy => None,
    };

    let rpm_filter = if bidir_telemetry {
        Some(RpmFilter {
            harmonics: RPM_FILTER_HARMONICS,
            q: RPM_FILTER_Q,
            min_hz: RPM_FILTER_MIN_HZ,
        })
    } else {
        None
    };

    let notes = advisory_notes(spectral, rpm_filter.is_some());

    FilterRecommendation {
        gyro_lowpass_hz: gyro_cutoff.round() as u32,
        gyro_lowpass2_hz,
        dterm_lowpass_hz: dterm_cutoff.round() as u32,
        dyn_notch,
        rpm_filter,
        notes,
    }
}

/// Band around the dominant frequency; widened to bracket a second
/// well-separated peak with a fixed margin.
fn dynamic_notch(peaks: &[SpectralPeak]) -> DynNotch {
    let dominant = peaks.first().map_or(DEFAULT_NOISE_FREQUENCY_HZ, |p| p.frequency);

    let separated = peaks.iter().skip(1).find(|p| {
        (p.frequency - dominant).abs() > DYN_NOTCH_PEAK_SEPARATION_HZ
    });

    let (min_hz, max_hz) = match separated {
        Some(second) => {
            let low = dominant.min(second.frequency) - DYN_NOTCH_BRACKET_MARGIN_HZ;
            let high = dominant.max(second.frequency) + DYN_NOTCH_BRACKET_MARGIN_HZ;
            (
                low.max(DYN_NOTCH_MIN_FLOOR_HZ),
                high.min(DYN_NOTCH_MAX_CEILING_HZ),
            )
        }
        None => (
            (dominant * DYN_NOTCH_LOW_FACTOR).max(DYN_NOTCH_MIN_FLOOR_HZ),
            (dominant * DYN_NOTCH_HIGH_FACTOR).min(DYN_NOTCH_MAX_CEILING_HZ),
        ),
    };

    DynNotch {
        min_hz: min_hz.round() as u32,
        max_hz: max_hz.round().max(min_hz.round()) as u32,
        q: DYN_NOTCH_DEFAULT_Q,
        count: DYN_NOTCH_DEFAULT_COUNT,
    }
}

/// Fixed-format advisory notes attributing severe bands to their
/// probable causes.
fn advisory_notes(spectral: &[SpectralAnalysis; 3], rpm_filter_active: bool) -> Vec<String> {
    let mut notes = Vec::new();

    for band_index in 0..spectral[0].bands.len() {
        let worst = spectral
            .iter()
            .map(|analysis| &analysis.bands[band_index])
            .max_by(|a, b| {
                a.severity
                    .partial_cmp(&b.severity)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        if let Some(band) = worst {
            if band.severity >= BAND_NOTE_SEVERITY_THRESHOLD {
                notes.push(format!(
                    "{} ({:.0}-{:.0} Hz): severity {:.1}, {}",
                    band.name, band.min_hz, band.max_hz, band.severity, band.probable_cause
                ));
            }
        }
    }

    if rpm_filter_active {
        notes.push(
            "RPM filtering available: notch filters will track motor frequency directly"
                .to_string(),
        );
    }

    notes
}


// src/tuning/filter_engine.rs
