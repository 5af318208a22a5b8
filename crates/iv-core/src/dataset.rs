//! Columnar in-memory dataset keyed by stage
//!
//! One row per observed unit (a team's participation in a competition round).
//! Every row carries a [`Stage`] key; all other columns are `f64` and use `NaN`
//! to mark a missing value.

use crate::{Error, Result, Stage};
use std::collections::BTreeMap;
use tracing::debug;

/// A typed table of named numeric columns plus a stage key
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    stages: Vec<Stage>,
    columns: BTreeMap<String, Vec<f64>>,
}

impl Dataset {
    /// Create a dataset with the given stage key per row and no other columns
    pub fn new(stages: Vec<Stage>) -> Self {
        Self {
            stages,
            columns: BTreeMap::new(),
        }
    }

    /// Add a column, consuming and returning the dataset
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        self.insert_column(name, values)?;
        Ok(self)
    }

    /// Add or replace a column
    pub fn insert_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        let name = name.into();
        if values.len() != self.stages.len() {
            return Err(Error::size_mismatch(
                self.stages.len(),
                values.len(),
                &format!("column `{name}`"),
            ));
        }
        self.columns.insert(name, values);
        Ok(())
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stage key of every row, in row order
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Names of the numeric columns, sorted
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Result<&[f64]> {
        self.columns
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::missing_column(name))
    }

    /// Distinct stage keys in ascending order
    pub fn distinct_stages(&self) -> Vec<Stage> {
        let mut stages = self.stages.clone();
        stages.sort_unstable();
        stages.dedup();
        stages
    }

    /// Rows belonging to a single stage
    pub fn filter_stage(&self, stage: Stage) -> Self {
        self.filter_rows(|i| self.stages[i] == stage)
    }

    /// All rows except those of one stage
    pub fn without_stage(&self, stage: Stage) -> Self {
        self.filter_rows(|i| self.stages[i] != stage)
    }

    /// Rows at the given indices, in the given order
    pub fn select_rows(&self, indices: &[usize]) -> Result<Self> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.len()) {
            return Err(Error::InvalidInput(format!(
                "Row index {bad} out of bounds for dataset with {} rows",
                self.len()
            )));
        }
        Ok(Self {
            stages: indices.iter().map(|&i| self.stages[i]).collect(),
            columns: self
                .columns
                .iter()
                .map(|(name, values)| (name.clone(), indices.iter().map(|&i| values[i]).collect()))
                .collect(),
        })
    }

    fn filter_rows(&self, keep: impl Fn(usize) -> bool) -> Self {
        let indices: Vec<usize> = (0..self.len()).filter(|&i| keep(i)).collect();
        Self {
            stages: indices.iter().map(|&i| self.stages[i]).collect(),
            columns: self
                .columns
                .iter()
                .map(|(name, values)| (name.clone(), indices.iter().map(|&i| values[i]).collect()))
                .collect(),
        }
    }

    /// Count missing values in each of the given columns
    pub fn missing_counts<S: AsRef<str>>(&self, columns: &[S]) -> Result<Vec<(String, usize)>> {
        columns
            .iter()
            .map(|name| {
                let name = name.as_ref();
                let count = self.column(name)?.iter().filter(|v| is_missing(**v)).count();
                Ok((name.to_string(), count))
            })
            .collect()
    }

    /// Remove every row with a missing value in any of the `subset` columns
    pub fn drop_missing<S: AsRef<str>>(&self, subset: &[S]) -> Result<Self> {
        let checked: Vec<&[f64]> = subset
            .iter()
            .map(|name| self.column(name.as_ref()))
            .collect::<Result<_>>()?;

        let dropped = self.filter_rows(|i| checked.iter().all(|col| !is_missing(col[i])));
        debug!(
            "Dropped {} of {} rows with missing values",
            self.len() - dropped.len(),
            self.len()
        );
        Ok(dropped)
    }

    /// Replace missing values in `column` with `placeholder`
    ///
    /// Returns the number of values filled.
    pub fn fill_missing(&mut self, column: &str, placeholder: f64) -> Result<usize> {
        let values = self
            .columns
            .get_mut(column)
            .ok_or_else(|| Error::missing_column(column))?;

        let mut filled = 0;
        for v in values.iter_mut().filter(|v| is_missing(**v)) {
            *v = placeholder;
            filled += 1;
        }
        debug!("Imputed {filled} missing value(s) in `{column}` with {placeholder}");
        Ok(filled)
    }

    /// Apply an imputation policy, returning the number of values filled
    pub fn impute(&mut self, imputation: &Imputation) -> Result<usize> {
        self.fill_missing(&imputation.column, imputation.placeholder)
    }
}

/// Whether a value counts as missing
#[inline]
pub fn is_missing(value: f64) -> bool {
    !value.is_finite()
}

/// A placeholder imputation policy for one column
#[derive(Debug, Clone, PartialEq)]
pub struct Imputation {
    /// Column to fill
    pub column: String,
    /// Value substituted for missing entries
    pub placeholder: f64,
}

impl Imputation {
    /// Sentinel league rank assigned to opponents outside the league system
    pub const OPPONENT_RANK_PLACEHOLDER: f64 = 25.0;

    pub fn new(column: impl Into<String>, placeholder: f64) -> Self {
        Self {
            column: column.into(),
            placeholder,
        }
    }

    /// Fill a missing previous-season opponent rank with the sentinel rank
    ///
    /// Non-league opponents have no league standing; they are treated as
    /// ranking below every league team.
    pub fn opponent_rank() -> Self {
        Self::new("opponent_league_rank_prev", Self::OPPONENT_RANK_PLACEHOLDER)
    }
}
