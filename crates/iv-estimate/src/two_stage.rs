//! Single-stage two-stage least squares
//!
//! The first stage regresses the treatment on a constant, the excluded
//! instruments and the controls. Its fitted values replace the treatment in
//! the second stage, a regression of the outcome on a constant, the predicted
//! treatment and the same controls. The coefficient on the predicted
//! treatment is the local average treatment effect.
//!
//! Standard errors are those of the second-stage OLS fit. They ignore the
//! estimation noise of the first stage, matching the conventional manual
//! two-step computation this estimator reproduces.

use crate::{EstimationResult, StageEstimator, StageReport};
use iv_core::{Dataset, Design, Error, NamedColumn, Result, Stage, VariableSpec};
use iv_ols::{nested_f_test, DesignMatrix, Ols, OlsFit, RankPolicy};
use tracing::{debug, info};

/// Label of the treatment equation in errors and summaries
pub const FIRST_STAGE: &str = "first stage";
/// Label of the outcome equation in errors and summaries
pub const SECOND_STAGE: &str = "second stage";

/// 2SLS estimator for the rows of a single stage
#[derive(Debug, Clone, Copy, Default)]
pub struct TwoStageLeastSquares {
    rank_policy: RankPolicy,
}

/// Both fitted models of a 2SLS estimation
#[derive(Debug, Clone)]
pub struct TwoStageFit {
    pub first_stage: OlsFit,
    pub second_stage: OlsFit,
    /// Name of the predicted-treatment regressor, `"{treatment}_hat"`
    pub predicted_treatment: String,
    /// Joint F-statistic of the excluded instruments, NaN if not identified
    pub partial_f: f64,
}

impl TwoStageLeastSquares {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rank handling applied to both regressions
    pub fn with_rank_policy(mut self, rank_policy: RankPolicy) -> Self {
        self.rank_policy = rank_policy;
        self
    }

    /// Fit both stages on `rows`
    ///
    /// Every referenced column must be present and complete; rows are never
    /// dropped or imputed here.
    pub fn fit(&self, rows: &Dataset, spec: &VariableSpec) -> Result<TwoStageFit> {
        let design = Design::resolve(rows, spec)?;
        let n = design.n_rows();

        let controls = distinct(&design.controls);
        let exogenous = distinct(
            &design
                .instruments
                .iter()
                .chain(&design.controls)
                .copied()
                .collect::<Vec<_>>(),
        );
        let first_params = exogenous.len() + 1;

        let min_rows = design.min_rows();
        if n < min_rows {
            return Err(Error::degenerate(
                FIRST_STAGE,
                n,
                first_params,
                format!("at least {min_rows} complete rows are required"),
            ));
        }
        if has_zero_variance(design.treatment.values) {
            return Err(Error::degenerate(
                FIRST_STAGE,
                n,
                first_params,
                format!(
                    "treatment `{}` has zero variance, so its prediction is collinear with the intercept",
                    design.treatment.name
                ),
            ));
        }
        let excluded: Vec<&str> = design
            .instruments
            .iter()
            .map(|c| c.name)
            .filter(|name| !controls.iter().any(|c| c.name == *name))
            .collect();
        if excluded.is_empty() {
            return Err(Error::degenerate(
                SECOND_STAGE,
                n,
                controls.len() + 2,
                "every instrument is also a control, so the treatment is not identified",
            ));
        }

        let ols = Ols::new().with_rank_policy(self.rank_policy);

        let mut first_design = DesignMatrix::with_intercept(n);
        for column in &exogenous {
            first_design.push_column(column.name, column.values)?;
        }
        let first_stage = ols.clone().labelled(FIRST_STAGE).fit(
            design.treatment.name,
            design.treatment.values,
            &first_design,
        )?;

        let predicted_treatment = format!("{}_hat", design.treatment.name);
        let mut second_design = DesignMatrix::with_intercept(n)
            .with_column(predicted_treatment.as_str(), &first_stage.fitted)?;
        for column in &controls {
            second_design.push_column(column.name, column.values)?;
        }
        let second_stage = ols.clone().labelled(SECOND_STAGE).fit(
            design.outcome.name,
            design.outcome.values,
            &second_design,
        )?;

        let partial_f = excluded_instrument_f(&ols, &design, &controls, &first_stage)?;
        debug!(
            "2SLS on {n} rows: excluded instruments [{}], partial F = {partial_f:.3}",
            excluded.join(", ")
        );

        Ok(TwoStageFit {
            first_stage,
            second_stage,
            predicted_treatment,
            partial_f,
        })
    }

    /// Estimate the causal effect for one stage's rows
    pub fn estimate(&self, stage: Stage, rows: &Dataset, spec: &VariableSpec) -> Result<EstimationResult> {
        self.estimate_stage(stage, rows, spec).map(|(result, _)| result)
    }
}

impl StageEstimator for TwoStageLeastSquares {
    fn estimate_stage(
        &self,
        stage: Stage,
        rows: &Dataset,
        spec: &VariableSpec,
    ) -> Result<(EstimationResult, StageReport)> {
        let fit = self.fit(rows, spec)?;
        let result = fit.to_result(stage)?;
        let report = fit.report();
        if spec.display.wants_summary() {
            info!("Stage {stage} {FIRST_STAGE}:\n{}", report.first_stage_summary);
            info!("Stage {stage} {SECOND_STAGE}:\n{}", report.second_stage_summary);
        }
        Ok((result, report))
    }
}

impl TwoStageFit {
    /// Collapse the fitted models into the per-stage record
    pub fn to_result(&self, stage: Stage) -> Result<EstimationResult> {
        let effect = self
            .second_stage
            .coefficient(&self.predicted_treatment)
            .ok_or_else(|| {
                Error::Computation(format!(
                    "{SECOND_STAGE} has no coefficient `{}`",
                    self.predicted_treatment
                ))
            })?;

        Ok(EstimationResult {
            stage,
            estimate: effect.coef,
            std_error: effect.std_err,
            p_value: effect.p_value,
            r_squared: self.second_stage.r_squared,
            f_stat: self.first_stage.f_stat,
            f_p_value: self.first_stage.f_p_value,
            n_obs: self.second_stage.n_obs,
            first_stage_r_squared: self.first_stage.r_squared,
            first_stage_partial_f: self.partial_f,
        })
    }

    pub fn report(&self) -> StageReport {
        StageReport {
            first_stage_summary: self.first_stage.summary(),
            second_stage_summary: self.second_stage.summary(),
        }
    }
}

/// F-test of the excluded instruments against a first stage without them
fn excluded_instrument_f(
    ols: &Ols,
    design: &Design<'_>,
    controls: &[NamedColumn<'_>],
    first_stage: &OlsFit,
) -> Result<f64> {
    let mut restricted_design = DesignMatrix::with_intercept(design.n_rows());
    for column in controls {
        restricted_design.push_column(column.name, column.values)?;
    }
    let restricted = ols.clone().labelled("restricted first stage").fit(
        design.treatment.name,
        design.treatment.values,
        &restricted_design,
    )?;
    if first_stage.rank <= restricted.rank {
        return Ok(f64::NAN);
    }
    Ok(nested_f_test(&restricted, first_stage)?.f_stat)
}

fn distinct<'a>(columns: &[NamedColumn<'a>]) -> Vec<NamedColumn<'a>> {
    let mut out: Vec<NamedColumn<'a>> = Vec::with_capacity(columns.len());
    for column in columns {
        if !out.iter().any(|c| c.name == column.name) {
            out.push(*column);
        }
    }
    out
}

fn has_zero_variance(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn binary_instrument_data(beta: f64) -> Dataset {
        let z = vec![0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0];
        let y: Vec<f64> = z.iter().map(|d| beta * d).collect();
        Dataset::new(vec![1; 10])
            .with_column("z", z.clone())
            .unwrap()
            .with_column("advanced", z)
            .unwrap()
            .with_column("points", y)
            .unwrap()
    }

    #[test]
    fn test_instrument_determining_treatment_recovers_beta() {
        let data = binary_instrument_data(2.5);
        let spec = VariableSpec::new("points", "advanced", ["z"]);
        let fit = TwoStageLeastSquares::new().fit(&data, &spec).unwrap();

        assert_eq!(fit.predicted_treatment, "advanced_hat");
        assert_eq!(
            fit.second_stage.names,
            vec!["const".to_string(), "advanced_hat".to_string()]
        );
        let result = fit.to_result(1).unwrap();
        assert_abs_diff_eq!(result.estimate, 2.5, epsilon = 1e-6);
        assert_abs_diff_eq!(result.first_stage_r_squared, 1.0, epsilon = 1e-9);
        assert_eq!(result.n_obs, 10);
    }

    #[test]
    fn test_zero_variance_treatment_is_degenerate() {
        let data = Dataset::new(vec![1; 6])
            .with_column("d", vec![1.0; 6])
            .unwrap()
            .with_column("z", vec![0.2, 0.4, 0.1, 0.9, 0.5, 0.3])
            .unwrap()
            .with_column("y", vec![1.0, 2.0, 1.5, 3.0, 2.0, 1.0])
            .unwrap();
        let spec = VariableSpec::new("y", "d", ["z"]);
        let err = TwoStageLeastSquares::new().fit(&data, &spec).unwrap_err();
        assert!(err.is_degenerate());
        assert!(err.to_string().contains("zero variance"));
    }

    #[test]
    fn test_too_few_rows_is_degenerate() {
        let data = Dataset::new(vec![4; 3])
            .with_column("d", vec![0.0, 1.0, 1.0])
            .unwrap()
            .with_column("z", vec![1.0, 2.0, 3.0])
            .unwrap()
            .with_column("c", vec![5.0, 3.0, 4.0])
            .unwrap()
            .with_column("y", vec![1.0, 2.0, 2.5])
            .unwrap();
        let spec = VariableSpec::new("y", "d", ["z"]).with_controls(["c"]);
        let err = TwoStageLeastSquares::new().estimate(4, &data, &spec).unwrap_err();
        assert!(err.is_degenerate());
        assert!(err.to_string().contains("at least 4 complete rows"), "{err}");
    }

    #[test]
    fn test_partial_f_equals_overall_f_without_controls() {
        let z = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let d = [0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0];
        let y = [0.5, 0.2, 2.1, 0.4, 2.6, 2.2, 0.9, 2.4];
        let data = Dataset::new(vec![2; 8])
            .with_column("z", z.to_vec())
            .unwrap()
            .with_column("d", d.to_vec())
            .unwrap()
            .with_column("y", y.to_vec())
            .unwrap();
        let spec = VariableSpec::new("y", "d", ["z"]);
        let result = TwoStageLeastSquares::new().estimate(2, &data, &spec).unwrap();
        assert_abs_diff_eq!(result.first_stage_partial_f, result.f_stat, epsilon = 1e-9);
        assert!(result.std_error > 0.0);
        let (lo, hi) = result.confidence_bounds();
        assert!(lo < result.estimate && result.estimate < hi);
    }

    #[test]
    fn test_instrument_repeated_as_control_is_not_identified() {
        let data = binary_instrument_data(1.0)
            .with_column("w", vec![0.3, 0.1, 0.7, 0.2, 0.9, 0.4, 0.6, 0.8, 0.5, 0.0])
            .unwrap();
        let spec = VariableSpec::new("points", "advanced", ["z"]).with_controls(["z", "w"]);
        let err = TwoStageLeastSquares::new().fit(&data, &spec).unwrap_err();
        assert!(err.is_degenerate());
        assert!(err.to_string().contains("not identified"));
    }

    #[test]
    fn test_missing_inputs_are_reported_not_coerced() {
        let mut data = binary_instrument_data(1.0);
        data.insert_column("points", {
            let mut y = vec![1.0; 10];
            y[3] = f64::NAN;
            y
        })
        .unwrap();
        let spec = VariableSpec::new("points", "advanced", ["z"]);
        assert!(matches!(
            TwoStageLeastSquares::new().fit(&data, &spec),
            Err(Error::MissingValues { count: 1, .. })
        ));

        let spec = VariableSpec::new("points", "advanced", ["opponent_division"]);
        assert!(TwoStageLeastSquares::new()
            .fit(&binary_instrument_data(1.0), &spec)
            .unwrap_err()
            .is_missing_column());
    }

    #[test]
    fn test_report_contains_both_models() {
        let data = binary_instrument_data(1.0)
            .with_column("w", vec![0.3, 0.1, 0.7, 0.2, 0.9, 0.4, 0.6, 0.8, 0.5, 0.0])
            .unwrap();
        let data = {
            let mut data = data;
            let y: Vec<f64> = (0..10).map(|i| (i % 3) as f64 + 0.5 * (i % 2) as f64).collect();
            data.insert_column("points", y).unwrap();
            data
        };
        let spec = VariableSpec::new("points", "advanced", ["z"]).with_controls(["w"]);
        let report = TwoStageLeastSquares::new().fit(&data, &spec).unwrap().report();
        assert!(report.first_stage_summary.contains("first stage"));
        assert!(report.first_stage_summary.contains("advanced"));
        assert!(report.second_stage_summary.contains("advanced_hat"));
        assert!(report.second_stage_summary.contains("points"));
    }
}
