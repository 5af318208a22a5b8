//! Seams between the estimation core and its collaborators

use crate::{Dataset, Result};

/// Source of the tabular dataset consumed by the estimation core
///
/// The core is agnostic to how rows are stored (flat file, database or
/// in-memory construction) as long as column names and row semantics match
/// the [`VariableSpec`](crate::VariableSpec) it is analysed with.
pub trait DatasetProvider {
    /// Materialize the full dataset
    fn load(&self) -> Result<Dataset>;
}

impl DatasetProvider for Dataset {
    fn load(&self) -> Result<Dataset> {
        Ok(self.clone())
    }
}

impl<F> DatasetProvider for F
where
    F: Fn() -> Result<Dataset>,
{
    fn load(&self) -> Result<Dataset> {
        self()
    }
}
