//! Per-stage estimation records

use iv_core::Stage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// First-stage F below which instruments are conventionally considered weak
pub const DEFAULT_WEAK_INSTRUMENT_THRESHOLD: f64 = 10.0;

/// Causal estimate and inferential statistics for one stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimationResult {
    pub stage: Stage,
    /// Coefficient on the predicted treatment in the second stage (the LATE)
    pub estimate: f64,
    /// Second-stage standard error of the estimate
    pub std_error: f64,
    /// Two-sided p-value of the estimate
    pub p_value: f64,
    /// Second-stage R²
    pub r_squared: f64,
    /// First-stage overall F-statistic
    pub f_stat: f64,
    /// p-value of the first-stage overall F-statistic
    pub f_p_value: f64,
    /// Rows used in both regressions
    pub n_obs: usize,
    pub first_stage_r_squared: f64,
    /// Joint F-statistic of the excluded instruments in the first stage
    pub first_stage_partial_f: f64,
}

impl EstimationResult {
    /// `(estimate - std_error, estimate + std_error)`, the span drawn as an error bar
    pub fn confidence_bounds(&self) -> (f64, f64) {
        (self.estimate - self.std_error, self.estimate + self.std_error)
    }

    /// Advisory raised when the first-stage F falls below `threshold`
    ///
    /// A NaN F-statistic is also reported, since it means instrument strength
    /// could not be assessed.
    pub fn weak_instrument(&self, threshold: f64) -> Option<WeakInstrumentWarning> {
        if self.f_stat >= threshold {
            None
        } else {
            Some(WeakInstrumentWarning {
                stage: self.stage,
                f_stat: self.f_stat,
                threshold,
            })
        }
    }
}

/// A stage whose first stage is too weak for reliable 2SLS inference
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeakInstrumentWarning {
    pub stage: Stage,
    pub f_stat: f64,
    pub threshold: f64,
}

impl fmt::Display for WeakInstrumentWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stage {}: weak instruments (first-stage F = {:.2} < {:.1}); the 2SLS estimate may be badly biased",
            self.stage, self.f_stat, self.threshold
        )
    }
}

/// Full regression summaries of one stage's two fitted models
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageReport {
    pub first_stage_summary: String,
    pub second_stage_summary: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(f_stat: f64) -> EstimationResult {
        EstimationResult {
            stage: 3,
            estimate: 1.5,
            std_error: 0.25,
            p_value: 0.01,
            r_squared: 0.4,
            f_stat,
            f_p_value: 0.001,
            n_obs: 50,
            first_stage_r_squared: 0.3,
            first_stage_partial_f: f_stat,
        }
    }

    #[test]
    fn test_confidence_bounds() {
        assert_eq!(result(20.0).confidence_bounds(), (1.25, 1.75));
    }

    #[test]
    fn test_weak_instrument_threshold() {
        assert!(result(20.0).weak_instrument(10.0).is_none());
        assert!(result(10.0).weak_instrument(10.0).is_none());

        let warning = result(4.2).weak_instrument(10.0).unwrap();
        assert_eq!(warning.stage, 3);
        assert!(warning.to_string().starts_with("Stage 3: weak instruments"));
        assert!(warning.to_string().contains("4.20 < 10.0"));

        assert!(result(f64::NAN).weak_instrument(10.0).is_some());
    }

    #[test]
    fn test_result_serializes_to_json() {
        let json = serde_json::to_string(&result(12.0)).unwrap();
        assert!(json.contains("\"stage\":3"));
        let back: EstimationResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result(12.0));
    }
}
