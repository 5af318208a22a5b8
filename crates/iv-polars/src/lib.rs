//! Polars integration for staged instrumental-variable analysis
//!
//! Loads processed cup-fixture CSV files, converts the columns a
//! [`VariableSpec`](iv_core::VariableSpec) references into a typed
//! [`Dataset`](iv_core::Dataset), and tabulates per-stage results back into a
//! `DataFrame`.
//!
//! # Example
//!
//! ```rust,no_run
//! use iv_core::{Imputation, VariableSpec};
//! use iv_estimate::StagedAnalyzer;
//! use iv_polars::{results_to_dataframe, CsvDatasetProvider};
//!
//! let spec = VariableSpec::new(
//!     "next_team_points",
//!     "team_win",
//!     ["opponent_league_rank_prev", "opponent_division"],
//! )
//! .with_controls(["team_rank_prev", "team_size", "distance"]);
//!
//! let provider = CsvDatasetProvider::for_cup(".", "combined", "combined_cup", &spec)
//!     .with_imputation(Imputation::opponent_rank())
//!     .dropping_missing(["distance"]);
//!
//! let analysis = StagedAnalyzer::new().run_provider(&provider, &spec)?;
//! println!("{}", results_to_dataframe(&analysis.results)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod convert;
mod error;
mod ext;
mod io;

pub use convert::{
    column_to_f64, dataframe_to_dataset, nan_counts, results_to_dataframe, RESULT_COLUMNS,
    STAGE_COLUMN,
};
pub use error::{Error, Result};
pub use ext::IvAnalysisExt;
pub use io::{load_processed_csv, processed_data_path, write_processed_csv, CsvDatasetProvider};

#[cfg(any(test, feature = "test-utils"))]
pub mod test_data;
