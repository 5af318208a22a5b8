//! Extension trait running the staged analysis directly on a DataFrame

use crate::convert::{dataframe_to_dataset, nan_counts};
use crate::Result;
use iv_core::{Dataset, VariableSpec};
use iv_estimate::{StagedAnalysis, StagedAnalyzer};
use polars::prelude::*;

/// Staged 2SLS operations on Polars DataFrames
pub trait IvAnalysisExt {
    /// Extract the stage key and every column `spec` references
    ///
    /// Nulls become `NaN`; nothing is dropped or imputed.
    fn to_dataset(&self, spec: &VariableSpec, stage_column: &str) -> Result<Dataset>;

    /// Run `analyzer` over the frame, partitioned by `stage_column`
    fn staged_2sls(
        &self,
        spec: &VariableSpec,
        stage_column: &str,
        analyzer: &StagedAnalyzer,
    ) -> Result<StagedAnalysis>;

    /// Missing-value count of every column `spec` references
    ///
    /// # Returns
    /// DataFrame with columns `column` and `nan_count`
    fn spec_nan_counts(&self, spec: &VariableSpec) -> Result<DataFrame>;
}

impl IvAnalysisExt for DataFrame {
    fn to_dataset(&self, spec: &VariableSpec, stage_column: &str) -> Result<Dataset> {
        dataframe_to_dataset(self, stage_column, &spec.all_columns())
    }

    fn staged_2sls(
        &self,
        spec: &VariableSpec,
        stage_column: &str,
        analyzer: &StagedAnalyzer,
    ) -> Result<StagedAnalysis> {
        let data = self.to_dataset(spec, stage_column)?;
        Ok(analyzer.run(&data, spec)?)
    }

    fn spec_nan_counts(&self, spec: &VariableSpec) -> Result<DataFrame> {
        nan_counts(self, &spec.all_columns())
    }
}
