//! Per-stage orchestration of the 2SLS estimator
//!
//! Rows are partitioned by their stage key, every stage is estimated from its
//! own rows only, and results come back in ascending stage order whether the
//! stages ran sequentially or on the rayon pool.

use crate::result::DEFAULT_WEAK_INSTRUMENT_THRESHOLD;
use crate::{EstimationResult, StageEstimator, StageReport, TwoStageLeastSquares, WeakInstrumentWarning};
use iv_core::{Dataset, DatasetProvider, Error, Result, Stage, VariableSpec};
use iv_ols::RankPolicy;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

/// What to do when one stage cannot be estimated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop at the first failing stage and return its error
    #[default]
    Abort,
    /// Record the failing stage and carry on with the others
    Skip,
}

/// How the independent per-stage fits are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Execution {
    #[default]
    Sequential,
    /// Run stages on the rayon pool; sequential unless built with `parallel`
    Parallel,
}

/// A stage left out of the results under [`FailurePolicy::Skip`]
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedStage {
    pub stage: Stage,
    pub reason: String,
}

/// Output of a staged run
#[derive(Debug, Clone, Default)]
pub struct StagedAnalysis {
    /// One result per estimated stage, ascending by stage
    pub results: Vec<EstimationResult>,
    pub reports: BTreeMap<Stage, StageReport>,
    pub skipped: Vec<SkippedStage>,
    pub warnings: Vec<WeakInstrumentWarning>,
}

impl StagedAnalysis {
    pub fn stages(&self) -> Vec<Stage> {
        self.results.iter().map(|r| r.stage).collect()
    }

    pub fn result(&self, stage: Stage) -> Option<&EstimationResult> {
        self.results.iter().find(|r| r.stage == stage)
    }
}

/// Runs an estimator independently over every stage of a dataset
#[derive(Debug, Clone)]
pub struct StagedAnalyzer<E = TwoStageLeastSquares> {
    estimator: E,
    policy: FailurePolicy,
    execution: Execution,
    weak_instrument_threshold: f64,
}

impl Default for StagedAnalyzer {
    fn default() -> Self {
        Self::with_estimator(TwoStageLeastSquares::new())
    }
}

impl StagedAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rank handling for both regressions of every stage
    pub fn with_rank_policy(mut self, rank_policy: RankPolicy) -> Self {
        self.estimator = self.estimator.with_rank_policy(rank_policy);
        self
    }
}

impl<E: StageEstimator> StagedAnalyzer<E> {
    pub fn with_estimator(estimator: E) -> Self {
        Self {
            estimator,
            policy: FailurePolicy::default(),
            execution: Execution::default(),
            weak_instrument_threshold: DEFAULT_WEAK_INSTRUMENT_THRESHOLD,
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_execution(mut self, execution: Execution) -> Self {
        self.execution = execution;
        self
    }

    pub fn with_weak_instrument_threshold(mut self, threshold: f64) -> Self {
        self.weak_instrument_threshold = threshold;
        self
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn estimator(&self) -> &E {
        &self.estimator
    }

    /// Estimate every stage of `data`
    #[instrument(skip(self, data, spec), fields(rows = data.len(), policy = ?self.policy))]
    pub fn run(&self, data: &Dataset, spec: &VariableSpec) -> Result<StagedAnalysis> {
        if data.is_empty() {
            return Err(Error::InsufficientData {
                expected: 1,
                actual: 0,
            });
        }
        spec.validate()?;

        let stages = data.distinct_stages();
        info!("Estimating {} stage(s): {:?}", stages.len(), stages);

        let outcomes = match self.execution {
            Execution::Sequential => self.run_sequential(&stages, data, spec),
            Execution::Parallel => self.run_parallel(&stages, data, spec),
        };

        let mut analysis = StagedAnalysis::default();
        for (stage, outcome) in outcomes {
            match outcome {
                Ok((result, report)) => {
                    if let Some(warning) = result.weak_instrument(self.weak_instrument_threshold) {
                        warn!("{warning}");
                        analysis.warnings.push(warning);
                    }
                    debug!(
                        "Stage {stage}: estimate {:.4} (se {:.4}, p {:.4})",
                        result.estimate, result.std_error, result.p_value
                    );
                    analysis.reports.insert(stage, report);
                    analysis.results.push(result);
                }
                Err(err) => match self.policy {
                    FailurePolicy::Abort => return Err(err.in_stage(stage)),
                    FailurePolicy::Skip => {
                        warn!("Skipping stage {stage}: {err}");
                        analysis.skipped.push(SkippedStage {
                            stage,
                            reason: err.to_string(),
                        });
                    }
                },
            }
        }

        info!(
            "Estimated {} stage(s), skipped {}",
            analysis.results.len(),
            analysis.skipped.len()
        );
        Ok(analysis)
    }

    /// Load a dataset from `provider` and estimate every stage
    pub fn run_provider<P>(&self, provider: &P, spec: &VariableSpec) -> Result<StagedAnalysis>
    where
        P: DatasetProvider + ?Sized,
    {
        let data = provider.load()?;
        self.run(&data, spec)
    }

    fn estimate_one(
        &self,
        stage: Stage,
        data: &Dataset,
        spec: &VariableSpec,
    ) -> Result<(EstimationResult, StageReport)> {
        let rows = data.filter_stage(stage);
        debug!("Stage {stage}: {} row(s)", rows.len());
        self.estimator.estimate_stage(stage, &rows, spec)
    }

    fn run_sequential(
        &self,
        stages: &[Stage],
        data: &Dataset,
        spec: &VariableSpec,
    ) -> Vec<(Stage, Result<(EstimationResult, StageReport)>)> {
        let mut outcomes = Vec::with_capacity(stages.len());
        for &stage in stages {
            let outcome = self.estimate_one(stage, data, spec);
            let failed = outcome.is_err();
            outcomes.push((stage, outcome));
            if failed && self.policy == FailurePolicy::Abort {
                break;
            }
        }
        outcomes
    }

    #[cfg(feature = "parallel")]
    fn run_parallel(
        &self,
        stages: &[Stage],
        data: &Dataset,
        spec: &VariableSpec,
    ) -> Vec<(Stage, Result<(EstimationResult, StageReport)>)> {
        use rayon::prelude::*;

        stages
            .par_iter()
            .map(|&stage| (stage, self.estimate_one(stage, data, spec)))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn run_parallel(
        &self,
        stages: &[Stage],
        data: &Dataset,
        spec: &VariableSpec,
    ) -> Vec<(Stage, Result<(EstimationResult, StageReport)>)> {
        debug!("Built without the `parallel` feature; running stages sequentially");
        self.run_sequential(stages, data, spec)
    }
}

/// Estimate every stage with the default 2SLS estimator, aborting on failure
pub fn analyze_by_stage(
    data: &Dataset,
    spec: &VariableSpec,
) -> Result<(Vec<EstimationResult>, BTreeMap<Stage, StageReport>)> {
    let analysis = StagedAnalyzer::new().run(data, spec)?;
    Ok((analysis.results, analysis.reports))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fails on one stage, otherwise reports the row count as the estimate
    struct FailOn(Stage);

    impl StageEstimator for FailOn {
        fn estimate_stage(
            &self,
            stage: Stage,
            rows: &Dataset,
            _spec: &VariableSpec,
        ) -> Result<(EstimationResult, StageReport)> {
            if stage == self.0 {
                return Err(Error::degenerate("first stage", rows.len(), 3, "too few rows"));
            }
            let result = EstimationResult {
                stage,
                estimate: rows.len() as f64,
                std_error: 0.1,
                p_value: 0.5,
                r_squared: 0.2,
                f_stat: if stage == 1 { 2.0 } else { 50.0 },
                f_p_value: 0.1,
                n_obs: rows.len(),
                first_stage_r_squared: 0.1,
                first_stage_partial_f: 2.0,
            };
            let report = StageReport {
                first_stage_summary: format!("first {stage}"),
                second_stage_summary: format!("second {stage}"),
            };
            Ok((result, report))
        }
    }

    fn data() -> Dataset {
        Dataset::new(vec![3, 1, 2, 3, 1, 3])
            .with_column("y", vec![0.0; 6])
            .unwrap()
    }

    fn spec() -> VariableSpec {
        VariableSpec::new("y", "d", ["z"])
    }

    #[test]
    fn test_results_in_ascending_stage_order() {
        let analysis = StagedAnalyzer::with_estimator(FailOn(99))
            .run(&data(), &spec())
            .unwrap();
        assert_eq!(analysis.stages(), vec![1, 2, 3]);
        assert_eq!(analysis.result(3).unwrap().estimate, 3.0);
        assert_eq!(analysis.result(2).unwrap().n_obs, 1);
        assert_eq!(analysis.reports[&2].second_stage_summary, "second 2");
        assert!(analysis.skipped.is_empty());
    }

    #[test]
    fn test_abort_policy_wraps_stage() {
        let err = StagedAnalyzer::with_estimator(FailOn(2))
            .run(&data(), &spec())
            .unwrap_err();
        assert_eq!(err.stage(), Some(2));
        assert!(err.is_degenerate());
        assert!(err.to_string().starts_with("Stage 2: Degenerate design in first stage"));
    }

    #[test]
    fn test_skip_policy_records_failure() {
        let analysis = StagedAnalyzer::with_estimator(FailOn(2))
            .with_policy(FailurePolicy::Skip)
            .run(&data(), &spec())
            .unwrap();
        assert_eq!(analysis.stages(), vec![1, 3]);
        assert_eq!(analysis.skipped.len(), 1);
        assert_eq!(analysis.skipped[0].stage, 2);
        assert!(analysis.skipped[0].reason.contains("too few rows"));
        assert!(!analysis.reports.contains_key(&2));
    }

    #[test]
    fn test_weak_instrument_warnings_collected() {
        let analysis = StagedAnalyzer::with_estimator(FailOn(99))
            .run(&data(), &spec())
            .unwrap();
        assert_eq!(analysis.warnings.len(), 1);
        assert_eq!(analysis.warnings[0].stage, 1);

        let relaxed = StagedAnalyzer::with_estimator(FailOn(99))
            .with_weak_instrument_threshold(1.0)
            .run(&data(), &spec())
            .unwrap();
        assert!(relaxed.warnings.is_empty());
    }

    #[test]
    fn test_empty_dataset_is_insufficient() {
        let empty = Dataset::new(Vec::new());
        assert!(matches!(
            StagedAnalyzer::new().run(&empty, &spec()),
            Err(Error::InsufficientData { actual: 0, .. })
        ));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let sequential = StagedAnalyzer::with_estimator(FailOn(2))
            .with_policy(FailurePolicy::Skip)
            .run(&data(), &spec())
            .unwrap();
        let parallel = StagedAnalyzer::with_estimator(FailOn(2))
            .with_policy(FailurePolicy::Skip)
            .with_execution(Execution::Parallel)
            .run(&data(), &spec())
            .unwrap();
        assert_eq!(sequential.results, parallel.results);
        assert_eq!(sequential.skipped, parallel.skipped);
        assert_eq!(sequential.reports, parallel.reports);
    }

    #[test]
    fn test_provider_closure() {
        let provider = || -> Result<Dataset> { Ok(data()) };
        let analysis = StagedAnalyzer::with_estimator(FailOn(99))
            .run_provider(&provider, &spec())
            .unwrap();
        assert_eq!(analysis.results.len(), 3);
    }
}
