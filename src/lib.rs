//! Staged instrumental-variable analysis of cup competitions
//!
//! Estimates the causal effect of advancing past a cup round on a team's
//! later standing or performance. Raw comparisons are confounded by team
//! quality, so each round is analysed with two-stage least squares, using
//! opponent strength as the instrument for the "advanced" treatment.
//!
//! This crate re-exports the workspace:
//!
//! - [`core`]: datasets, variable specifications, errors
//! - [`ols`]: least squares with classical inference
//! - [`estimate`]: the single-stage estimator and the staged orchestrator
//! - [`polars`]: CSV loading and DataFrame conversion
//! - [`viz`]: summary tables and causal-effect charts
//!
//! # Example
//!
//! ```rust
//! use staged_iv::prelude::*;
//!
//! let z = vec![0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 0.0, 1.0];
//! let y: Vec<f64> = z.iter().map(|d| 1.5 * d + 0.5).collect();
//! let data = Dataset::new(vec![1, 1, 1, 1, 2, 2, 2, 2])
//!     .with_column("opponent_division", z.clone())?
//!     .with_column("team_win", z)?
//!     .with_column("next_team_points", y)?;
//!
//! let spec = VariableSpec::new("next_team_points", "team_win", ["opponent_division"]);
//! let analysis = StagedAnalyzer::new().run(&data, &spec)?;
//! println!("{}", summarize(&analysis.results));
//! # Ok::<(), staged_iv::core::Error>(())
//! ```

pub use iv_core as core;
pub use iv_estimate as estimate;
pub use iv_ols as ols;
pub use iv_polars as polars;
pub use iv_viz as viz;

pub mod prelude {
    pub use iv_core::{Dataset, DatasetProvider, DisplayMode, Imputation, Stage, VariableSpec};
    pub use iv_estimate::{
        analyze_by_stage, EstimationResult, Execution, FailurePolicy, StageReport, StagedAnalysis,
        StagedAnalyzer, TwoStageLeastSquares, WeakInstrumentWarning,
    };
    pub use iv_ols::RankPolicy;
    pub use iv_polars::{CsvDatasetProvider, IvAnalysisExt};
    pub use iv_viz::{render_if_requested, summarize, ChartData, ResultTable};
}
