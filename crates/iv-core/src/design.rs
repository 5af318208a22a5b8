//! Resolution of logical variable roles to dataset columns
//!
//! A [`Design`] is built once at the start of each estimation call. It checks
//! that every referenced column exists and holds no missing values, so the
//! numerical code downstream only ever sees complete, named slices.

use crate::dataset::is_missing;
use crate::{Dataset, Error, Result, VariableSpec};

/// A named column slice
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NamedColumn<'a> {
    pub name: &'a str,
    pub values: &'a [f64],
}

/// Columns of a dataset resolved against a [`VariableSpec`]
#[derive(Debug, Clone)]
pub struct Design<'a> {
    pub outcome: NamedColumn<'a>,
    pub treatment: NamedColumn<'a>,
    pub instruments: Vec<NamedColumn<'a>>,
    pub controls: Vec<NamedColumn<'a>>,
    n_rows: usize,
}

impl<'a> Design<'a> {
    /// Validate the specification and look up every column it names
    pub fn resolve(data: &'a Dataset, spec: &'a VariableSpec) -> Result<Self> {
        spec.validate()?;

        let lookup = |name: &'a str| -> Result<NamedColumn<'a>> {
            let values = data.column(name)?;
            let count = values.iter().filter(|v| is_missing(**v)).count();
            if count > 0 {
                return Err(Error::MissingValues {
                    column: name.to_string(),
                    count,
                });
            }
            Ok(NamedColumn { name, values })
        };

        Ok(Self {
            outcome: lookup(spec.outcome_var.as_str())?,
            treatment: lookup(spec.treatment_var.as_str())?,
            instruments: spec
                .instrument_vars
                .iter()
                .map(|name| lookup(name.as_str()))
                .collect::<Result<_>>()?,
            controls: spec
                .control_vars
                .iter()
                .map(|name| lookup(name.as_str()))
                .collect::<Result<_>>()?,
            n_rows: data.len(),
        })
    }

    /// Number of rows entering the fit
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Minimum row count for a fit: one more than the first-stage parameters
    pub fn min_rows(&self) -> usize {
        let mut names: Vec<&str> = self
            .instruments
            .iter()
            .chain(&self.controls)
            .map(|c| c.name)
            .collect();
        names.sort_unstable();
        names.dedup();
        names.len() + 2
    }
}
