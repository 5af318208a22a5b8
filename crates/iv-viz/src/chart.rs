//! Chart model of per-stage causal effects
//!
//! [`ChartData`] holds everything a renderer needs (one error bar per stage,
//! the legend labels, the title and the variable annotation) so the drawing
//! backend never has to interpret estimation results itself.

use iv_core::{Stage, VariableSpec};
use iv_estimate::EstimationResult;

pub const X_LABEL: &str = "Round";
pub const Y_LABEL: &str = "Causal Effect (LATE)";

/// Controls listed per annotation line
const CONTROLS_PER_LINE: usize = 4;
/// Indent aligning wrapped controls with the first one
const CONTINUATION_INDENT: &str = "            ";

/// Error bar for one stage
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorBarPoint {
    pub stage: Stage,
    pub estimate: f64,
    /// `estimate - std_error`
    pub lower: f64,
    /// `estimate + std_error`
    pub upper: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<ErrorBarPoint>,
    pub annotation: String,
}

impl ChartData {
    pub fn from_results(results: &[EstimationResult], spec: &VariableSpec) -> Self {
        let points = results
            .iter()
            .map(|result| {
                let (lower, upper) = result.confidence_bounds();
                ErrorBarPoint {
                    stage: result.stage,
                    estimate: result.estimate,
                    lower,
                    upper,
                    label: legend_label(result),
                }
            })
            .collect();

        Self {
            title: chart_title(&spec.outcome_var).to_string(),
            x_label: X_LABEL.to_string(),
            y_label: Y_LABEL.to_string(),
            points,
            annotation: annotation_text(spec),
        }
    }

    /// Stage axis range with half a round of padding on each side
    pub fn x_range(&self) -> (f64, f64) {
        let stages = self.points.iter().map(|p| p.stage as f64);
        let min = stages.clone().fold(f64::INFINITY, f64::min);
        let max = stages.fold(f64::NEG_INFINITY, f64::max);
        if min.is_finite() && max.is_finite() {
            (min - 0.5, max + 0.5)
        } else {
            (0.0, 1.0)
        }
    }

    /// Effect axis range covering every error bar and zero
    pub fn y_range(&self) -> (f64, f64) {
        let bounds = self
            .points
            .iter()
            .flat_map(|p| [p.lower, p.upper, p.estimate])
            .filter(|v| v.is_finite());
        let (min, max) = bounds.fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
        if max - min <= f64::EPSILON {
            return (-1.0, 1.0);
        }
        let pad = 0.1 * (max - min);
        (min - pad, max + pad)
    }
}

/// `"Round {stage}: p-value: {p:.2}, F-stat: {F:.1}, R^2: {r2:.2}"`
pub fn legend_label(result: &EstimationResult) -> String {
    format!(
        "Round {}: p-value: {:.2}, F-stat: {:.1}, R^2: {:.2}",
        result.stage, result.p_value, result.f_stat, result.r_squared
    )
}

pub fn chart_title(outcome_var: &str) -> &'static str {
    match outcome_var {
        "team_rank_diff" => "Causal Effect of Advancing per Round on League Standing",
        "next_team_points" => "Causal Effect of Advancing per Round on Next Fixture Performance",
        _ => "Causal Effect of Advancing per Round on Performance",
    }
}

/// Controls joined four per line, continuation lines indented under the first
pub fn format_controls(controls: &[String]) -> String {
    controls
        .chunks(CONTROLS_PER_LINE)
        .map(|chunk| chunk.join(", "))
        .collect::<Vec<_>>()
        .join(&format!("\n{CONTINUATION_INDENT}"))
}

pub fn annotation_text(spec: &VariableSpec) -> String {
    format!(
        "Outcome:    {}\nTreatment:  {}\nInstruments: {}\nControls:   {}",
        spec.outcome_var,
        spec.treatment_var,
        spec.instrument_vars.join(", "),
        format_controls(&spec.control_vars)
    )
}
