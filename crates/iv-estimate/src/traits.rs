//! Estimator seam used by the staged orchestrator

use crate::{EstimationResult, StageReport};
use iv_core::{Dataset, Result, Stage, VariableSpec};

/// Estimates one stage from the rows belonging to it
///
/// Implementations must be pure functions of their inputs so the
/// orchestrator may run stages in any order or concurrently.
pub trait StageEstimator: Sync {
    /// Estimate `stage` from `rows`, returning the result and both model summaries
    fn estimate_stage(
        &self,
        stage: Stage,
        rows: &Dataset,
        spec: &VariableSpec,
    ) -> Result<(EstimationResult, StageReport)>;
}
