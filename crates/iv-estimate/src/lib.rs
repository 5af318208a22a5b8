//! Staged two-stage least squares
//!
//! - [`TwoStageLeastSquares`]: the single-stage 2SLS estimator, returning an
//!   [`EstimationResult`] or the full [`TwoStageFit`]
//! - [`StagedAnalyzer`]: partitions a dataset by stage and estimates each stage
//!   independently, with a configurable [`FailurePolicy`] and optional rayon
//!   parallelism (feature `parallel`)
//! - [`analyze_by_stage`]: the default sequential, abort-on-failure run
//!
//! # Identification
//!
//! Each instrument is assumed to move the outcome only through the treatment.
//! The data cannot confirm that exclusion restriction and nothing in this
//! crate tests it. What is surfaced is instrument *strength*: the first-stage
//! F-statistic, the partial F of the excluded instruments, and a
//! [`WeakInstrumentWarning`] when the first-stage F is below a threshold.
//!
//! # Example
//!
//! ```rust
//! use iv_core::{Dataset, VariableSpec};
//! use iv_estimate::analyze_by_stage;
//!
//! let z = vec![0.0, 1.0, 0.0, 1.0, 1.0, 0.0];
//! let y: Vec<f64> = z.iter().map(|d| 2.0 * d).collect();
//! let data = Dataset::new(vec![1, 1, 1, 2, 2, 2])
//!     .with_column("z", z.clone())?
//!     .with_column("d", vec![0.0, 1.0, 0.0, 1.0, 1.0, 0.0])?
//!     .with_column("y", y)?;
//!
//! let spec = VariableSpec::new("y", "d", ["z"]);
//! let (results, _reports) = analyze_by_stage(&data, &spec)?;
//! assert_eq!(results.len(), 2);
//! assert!((results[0].estimate - 2.0).abs() < 1e-6);
//! # Ok::<(), iv_core::Error>(())
//! ```

pub mod result;
pub mod staged;
pub mod traits;
pub mod two_stage;

pub use result::{EstimationResult, StageReport, WeakInstrumentWarning, DEFAULT_WEAK_INSTRUMENT_THRESHOLD};
pub use staged::{
    analyze_by_stage, Execution, FailurePolicy, SkippedStage, StagedAnalysis, StagedAnalyzer,
};
pub use traits::StageEstimator;
pub use two_stage::{TwoStageFit, TwoStageLeastSquares, FIRST_STAGE, SECOND_STAGE};
