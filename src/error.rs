// src/error.rs

use thiserror::Error;

/// Failures the analysis pipeline can surface to callers.
///
/// Per-axis and per-channel problems never reach this type: components
/// degrade to zero-valued or `Unavailable` results instead. Only
/// structurally fatal conditions propagate.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Fewer samples than the component minimum. Fatal only at sample
    /// preparation; FFT and response analysis degrade instead.
    #[error("insufficient data: {got} valid samples, need at least {need}")]
    InsufficientData { need: usize, got: usize },

    /// Zero variance, zero fundamental magnitude, or a would-be division
    /// by zero. Absorbed inside components as a neutral value; kept in
    /// the taxonomy for internal signalling.
    #[error("degenerate signal: {0}")]
    DegenerateSignal(&'static str),

    /// A tuning archetype the coefficient table does not know. Fatal to
    /// the PID calculation.
    #[error("unknown controller type: {0:?}")]
    UnknownControllerType(String),

    /// A recommendation that failed validation before command
    /// serialization (missing axis, non-finite value).
    #[error("malformed recommendation: {0}")]
    MalformedRecommendation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = AnalysisError::InsufficientData { need: 10, got: 3 };
        assert_eq!(
            e.to_string(),
            "insufficient data: 3 valid samples, need at least 10"
        );

        let e = AnalysisError::UnknownControllerType("pidd2".to_string());
        assert!(e.to_string().contains("pidd2"));
    }
}

// src/error.rs
