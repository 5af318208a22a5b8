//! Core types for staged instrumental-variable analysis
//!
//! This crate provides the foundation shared by the estimation, Polars and
//! presentation crates:
//!
//! - [`Dataset`]: a columnar table of numeric columns keyed by a stage
//!   (competition round), with explicit missing-value transforms
//! - [`VariableSpec`]: the logical roles (outcome, treatment, instruments,
//!   controls) and the [`DisplayMode`] of a run
//! - [`Design`]: roles resolved to validated column slices
//! - [`Error`]: the error taxonomy used across the workspace
//!
//! # Example
//!
//! ```rust
//! use iv_core::{Dataset, Imputation, VariableSpec};
//!
//! let mut data = Dataset::new(vec![1, 1, 2])
//!     .with_column("opponent_league_rank_prev", vec![3.0, f64::NAN, 12.0])?;
//! let filled = data.impute(&Imputation::opponent_rank())?;
//! assert_eq!(filled, 1);
//!
//! let spec = VariableSpec::new("next_team_points", "team_win", ["opponent_league_rank_prev"]);
//! spec.validate()?;
//! # Ok::<(), iv_core::Error>(())
//! ```

pub mod config;
pub mod dataset;
pub mod design;
pub mod error;
pub mod traits;

/// Key partitioning rows into independently analysed groups (e.g. round number)
pub type Stage = i64;

pub use config::{DisplayMode, VariableSpec};
pub use dataset::{is_missing, Dataset, Imputation};
pub use design::{Design, NamedColumn};
pub use error::{Error, Result};
pub use traits::DatasetProvider;
