//! Ordinary least squares with classical (homoskedastic) inference
//!
//! The system is solved through a singular value decomposition of the design
//! matrix. Numerical rank uses the usual tolerance
//! `s_max * max(n, p) * eps`, so exactly collinear regressors are detected
//! rather than producing arbitrary coefficients.

use crate::DesignMatrix;
use iv_core::{is_missing, Error, Result};
use nalgebra::{DMatrix, DVector};
use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};
use tracing::debug;

/// Handling of a design matrix without full column rank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankPolicy {
    /// Fail with [`Error::DegenerateDesign`]
    #[default]
    Reject,
    /// Use the minimum-norm (pseudo-inverse) solution
    MinimumNorm,
}

/// Inference for a single coefficient
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientStats {
    pub name: String,
    pub coef: f64,
    pub std_err: f64,
    pub t_value: f64,
    pub p_value: f64,
    /// Lower bound of the 95% confidence interval
    pub ci_lower: f64,
    /// Upper bound of the 95% confidence interval
    pub ci_upper: f64,
}

/// A fitted OLS model
#[derive(Debug, Clone)]
pub struct OlsFit {
    /// Label used in reports and errors
    pub equation: String,
    /// Name of the dependent variable
    pub dependent: String,
    pub names: Vec<String>,
    pub params: Vec<f64>,
    pub std_errors: Vec<f64>,
    pub t_values: Vec<f64>,
    pub p_values: Vec<f64>,
    pub conf_int: Vec<(f64, f64)>,
    pub n_obs: usize,
    pub rank: usize,
    pub df_model: f64,
    pub df_resid: f64,
    pub has_intercept: bool,
    pub rss: f64,
    pub tss: f64,
    pub r_squared: f64,
    pub adj_r_squared: f64,
    pub f_stat: f64,
    pub f_p_value: f64,
    pub log_likelihood: f64,
    pub aic: f64,
    pub bic: f64,
    pub fitted: Vec<f64>,
    pub residuals: Vec<f64>,
}

/// OLS estimator
#[derive(Debug, Clone, Default)]
pub struct Ols {
    rank_policy: RankPolicy,
    label: Option<String>,
}

impl Ols {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rank_policy(mut self, rank_policy: RankPolicy) -> Self {
        self.rank_policy = rank_policy;
        self
    }

    /// Name the equation in errors and summaries (e.g. "first stage")
    pub fn labelled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Regress `y` (named `dependent`) on the columns of `design`
    pub fn fit(&self, dependent: &str, y: &[f64], design: &DesignMatrix) -> Result<OlsFit> {
        let equation = self
            .label
            .clone()
            .unwrap_or_else(|| format!("OLS of `{dependent}`"));
        let n = design.n_rows();
        let p = design.n_params();

        if y.len() != n {
            return Err(Error::size_mismatch(n, y.len(), &format!("dependent `{dependent}`")));
        }
        if p == 0 {
            return Err(Error::InvalidInput(format!(
                "{equation} has no regressors"
            )));
        }
        let missing = y.iter().filter(|v| is_missing(**v)).count();
        if missing > 0 {
            return Err(Error::MissingValues {
                column: dependent.to_string(),
                count: missing,
            });
        }
        if n <= p {
            return Err(Error::degenerate(
                equation,
                n,
                p,
                format!("at least {} rows are required to estimate {p} parameters", p + 1),
            ));
        }

        let x = design.to_matrix();
        let y_vec = DVector::from_column_slice(y);
        let svd = x.clone().svd(true, true);

        let s_max = svd.singular_values.iter().copied().fold(0.0_f64, f64::max);
        let tol = s_max * n.max(p) as f64 * f64::EPSILON;
        let rank = svd.singular_values.iter().filter(|&&s| s > tol).count();

        let v_t = svd
            .v_t
            .as_ref()
            .ok_or_else(|| Error::Computation("SVD did not produce right singular vectors".into()))?;

        if rank == 0 || (rank < p && self.rank_policy == RankPolicy::Reject) {
            let collinear = collinear_columns(design.names(), &svd.singular_values, v_t, tol);
            return Err(Error::degenerate(
                equation,
                n,
                p,
                format!(
                    "design matrix is rank-deficient (rank {rank} < {p}); collinear columns: {}",
                    collinear.join(", ")
                ),
            ));
        }

        let beta = svd
            .solve(&y_vec, tol)
            .map_err(|e| Error::Computation(format!("{equation}: {e}")))?;

        // (X'X)^+ = V diag(1/s^2) V'
        let mut xtx_pinv = DMatrix::<f64>::zeros(p, p);
        for (k, &s) in svd.singular_values.iter().enumerate() {
            if s > tol {
                let inv = 1.0 / (s * s);
                for i in 0..p {
                    for j in 0..p {
                        xtx_pinv[(i, j)] += v_t[(k, i)] * v_t[(k, j)] * inv;
                    }
                }
            }
        }

        let fitted_vec = &x * &beta;
        let resid_vec = &y_vec - &fitted_vec;
        let rss: f64 = resid_vec.iter().map(|r| r * r).sum();

        let has_intercept = design.has_intercept();
        let k_constant = usize::from(has_intercept);
        let tss: f64 = if has_intercept {
            let mean = y.iter().sum::<f64>() / n as f64;
            y.iter().map(|&v| (v - mean).powi(2)).sum()
        } else {
            y.iter().map(|&v| v * v).sum()
        };

        let df_resid = (n - rank) as f64;
        let df_model = (rank - k_constant.min(rank)) as f64;
        let sigma2 = rss / df_resid;

        let t_dist = StudentsT::new(0.0, 1.0, df_resid)
            .map_err(|e| Error::Computation(format!("Failed to create t-distribution: {e}")))?;
        let t_crit = t_dist.inverse_cdf(0.975);

        let params: Vec<f64> = beta.iter().copied().collect();
        let std_errors: Vec<f64> = (0..p)
            .map(|j| (sigma2 * xtx_pinv[(j, j)]).max(0.0).sqrt())
            .collect();
        let t_values: Vec<f64> = params
            .iter()
            .zip(&std_errors)
            .map(|(b, se)| b / se)
            .collect();
        let p_values: Vec<f64> = t_values.iter().map(|&t| two_sided_p(&t_dist, t)).collect();
        let conf_int: Vec<(f64, f64)> = params
            .iter()
            .zip(&std_errors)
            .map(|(b, se)| (b - t_crit * se, b + t_crit * se))
            .collect();

        let r_squared = if tss > 0.0 { 1.0 - rss / tss } else { f64::NAN };
        let adj_r_squared = 1.0 - (n - k_constant) as f64 / df_resid * (1.0 - r_squared);

        let (f_stat, f_p_value) = if df_model > 0.0 {
            let f = ((tss - rss) / df_model) / (rss / df_resid);
            (f, f_survival(f, df_model, df_resid)?)
        } else {
            (f64::NAN, f64::NAN)
        };

        let n_f = n as f64;
        let log_likelihood =
            -n_f / 2.0 * ((2.0 * std::f64::consts::PI).ln() + (rss / n_f).ln() + 1.0);
        let k = rank as f64;
        let aic = -2.0 * log_likelihood + 2.0 * k;
        let bic = -2.0 * log_likelihood + n_f.ln() * k;

        debug!(
            "{equation}: n={n}, rank={rank}, R²={r_squared:.4}, F={f_stat:.3} (p={f_p_value:.3e})"
        );

        Ok(OlsFit {
            equation,
            dependent: dependent.to_string(),
            names: design.names().to_vec(),
            params,
            std_errors,
            t_values,
            p_values,
            conf_int,
            n_obs: n,
            rank,
            df_model,
            df_resid,
            has_intercept,
            rss,
            tss,
            r_squared,
            adj_r_squared,
            f_stat,
            f_p_value,
            log_likelihood,
            aic,
            bic,
            fitted: fitted_vec.iter().copied().collect(),
            residuals: resid_vec.iter().copied().collect(),
        })
    }
}

impl OlsFit {
    /// Inference for the coefficient named `name`
    pub fn coefficient(&self, name: &str) -> Option<CoefficientStats> {
        let j = self.names.iter().position(|n| n == name)?;
        Some(CoefficientStats {
            name: self.names[j].clone(),
            coef: self.params[j],
            std_err: self.std_errors[j],
            t_value: self.t_values[j],
            p_value: self.p_values[j],
            ci_lower: self.conf_int[j].0,
            ci_upper: self.conf_int[j].1,
        })
    }

    /// Predictions for a design with the same columns as the fitted one
    pub fn predict(&self, design: &DesignMatrix) -> Result<Vec<f64>> {
        if design.names() != self.names.as_slice() {
            return Err(Error::InvalidInput(format!(
                "Prediction design columns {:?} do not match fitted columns {:?}",
                design.names(),
                self.names
            )));
        }
        let beta = DVector::from_column_slice(&self.params);
        Ok((design.to_matrix() * beta).iter().copied().collect())
    }
}

/// Result of an F-test comparing nested models
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FTest {
    pub f_stat: f64,
    pub p_value: f64,
    pub df_num: f64,
    pub df_den: f64,
}

/// F-test of the restrictions separating `restricted` from `full`
///
/// Both models must share the dependent variable and observations; `full`
/// must nest `restricted`.
pub fn nested_f_test(restricted: &OlsFit, full: &OlsFit) -> Result<FTest> {
    if restricted.n_obs != full.n_obs {
        return Err(Error::size_mismatch(full.n_obs, restricted.n_obs, "nested F-test"));
    }
    if full.rank <= restricted.rank {
        return Err(Error::InvalidParameter(format!(
            "Full model rank {} does not exceed restricted rank {}",
            full.rank, restricted.rank
        )));
    }
    let df_num = (full.rank - restricted.rank) as f64;
    let df_den = full.df_resid;
    let f_stat = ((restricted.rss - full.rss) / df_num) / (full.rss / df_den);
    Ok(FTest {
        f_stat,
        p_value: f_survival(f_stat, df_num, df_den)?,
        df_num,
        df_den,
    })
}

fn two_sided_p(dist: &StudentsT, t: f64) -> f64 {
    if t.is_nan() {
        f64::NAN
    } else if t.is_infinite() {
        0.0
    } else {
        (2.0 * dist.sf(t.abs())).min(1.0)
    }
}

fn f_survival(f: f64, df_num: f64, df_den: f64) -> Result<f64> {
    if f.is_nan() {
        return Ok(f64::NAN);
    }
    if f.is_infinite() {
        return Ok(0.0);
    }
    let dist = FisherSnedecor::new(df_num, df_den)
        .map_err(|e| Error::Computation(format!("Failed to create F-distribution: {e}")))?;
    Ok(dist.sf(f.max(0.0)))
}

/// Names of the columns spanning the numerical null space
fn collinear_columns(
    names: &[String],
    singular_values: &DVector<f64>,
    v_t: &DMatrix<f64>,
    tol: f64,
) -> Vec<String> {
    let p = names.len();
    let mut involved = vec![false; p];
    for (k, &s) in singular_values.iter().enumerate() {
        if s <= tol {
            for (j, flag) in involved.iter_mut().enumerate() {
                if v_t[(k, j)].abs() > 1e-8 {
                    *flag = true;
                }
            }
        }
    }
    names
        .iter()
        .zip(involved)
        .filter_map(|(name, hit)| hit.then(|| name.clone()))
        .collect()
}
