//! Named regressor matrices

use iv_core::{is_missing, Error, Result};
use nalgebra::DMatrix;

/// Name given to the intercept column
pub const CONST_NAME: &str = "const";

/// Column-major matrix of named regressors
#[derive(Debug, Clone, PartialEq)]
pub struct DesignMatrix {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
    n_rows: usize,
    has_intercept: bool,
}

impl DesignMatrix {
    /// Empty design over `n_rows` observations
    pub fn new(n_rows: usize) -> Self {
        Self {
            names: Vec::new(),
            columns: Vec::new(),
            n_rows,
            has_intercept: false,
        }
    }

    /// Design whose first column is a constant of ones named `const`
    pub fn with_intercept(n_rows: usize) -> Self {
        Self {
            names: vec![CONST_NAME.to_string()],
            columns: vec![vec![1.0; n_rows]],
            n_rows,
            has_intercept: true,
        }
    }

    /// Append a regressor column
    pub fn push_column(&mut self, name: impl Into<String>, values: &[f64]) -> Result<()> {
        let name = name.into();
        if values.len() != self.n_rows {
            return Err(Error::size_mismatch(
                self.n_rows,
                values.len(),
                &format!("regressor `{name}`"),
            ));
        }
        let count = values.iter().filter(|v| is_missing(**v)).count();
        if count > 0 {
            return Err(Error::MissingValues { column: name, count });
        }
        self.names.push(name);
        self.columns.push(values.to_vec());
        Ok(())
    }

    pub fn with_column(mut self, name: impl Into<String>, values: &[f64]) -> Result<Self> {
        self.push_column(name, values)?;
        Ok(self)
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_params(&self) -> usize {
        self.columns.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn has_intercept(&self) -> bool {
        self.has_intercept
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|j| self.columns[j].as_slice())
    }

    pub(crate) fn to_matrix(&self) -> DMatrix<f64> {
        DMatrix::from_fn(self.n_rows, self.columns.len(), |i, j| self.columns[j][i])
    }
}
