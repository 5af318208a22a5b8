//! Ordinary least squares for the two-stage estimator
//!
//! Every regression in the workspace goes through [`Ols::fit`]: a named
//! [`DesignMatrix`] (optionally headed by a `const` column) is regressed on a
//! dependent slice and the result is an [`OlsFit`] carrying coefficients,
//! classical standard errors, t-tests, the overall F-test and the usual
//! information criteria. [`nested_f_test`] compares a restricted model with a
//! model that nests it, which is how the excluded-instrument F statistic of a
//! first stage is obtained.
//!
//! # Example
//!
//! ```rust
//! use iv_ols::{DesignMatrix, Ols};
//!
//! let design = DesignMatrix::with_intercept(5).with_column("x", &[1.0, 2.0, 3.0, 4.0, 5.0])?;
//! let fit = Ols::new().fit("y", &[2.0, 4.0, 5.0, 4.0, 5.0], &design)?;
//! assert!((fit.params[1] - 0.6).abs() < 1e-10);
//! println!("{}", fit.summary());
//! # Ok::<(), iv_core::Error>(())
//! ```

mod design_matrix;
mod fit;
mod summary;

pub use design_matrix::{DesignMatrix, CONST_NAME};
pub use fit::{nested_f_test, CoefficientStats, FTest, Ols, OlsFit, RankPolicy};
