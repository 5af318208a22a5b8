//! Processed-data files and the CSV dataset provider

use crate::convert::{dataframe_to_dataset, STAGE_COLUMN};
use crate::Result;
use iv_core::{Dataset, DatasetProvider, Imputation, VariableSpec};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Location of a processed cup file: `<root>/data/process/<country>/<cup>_processed.csv`
pub fn processed_data_path(root: impl AsRef<Path>, country: &str, cup: &str) -> PathBuf {
    root.as_ref()
        .join("data")
        .join("process")
        .join(country)
        .join(format!("{cup}_processed.csv"))
}

/// Read a processed CSV with a header row
pub fn load_processed_csv(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    info!("Loaded {} rows x {} columns from {}", df.height(), df.width(), path.display());
    Ok(df)
}

/// Write a processed frame as CSV with a header row, creating parent directories
pub fn write_processed_csv(df: &DataFrame, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(iv_core::Error::from)?;
    }
    let mut file = std::fs::File::create(path).map_err(iv_core::Error::from)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df.clone())?;
    debug!("Wrote {} rows to {}", df.height(), path.display());
    Ok(())
}

/// [`DatasetProvider`] reading a processed CSV file
///
/// Imputations are applied before rows with missing values in
/// `drop_missing` columns are removed.
#[derive(Debug, Clone)]
pub struct CsvDatasetProvider {
    pub path: PathBuf,
    pub stage_column: String,
    pub columns: Vec<String>,
    pub imputations: Vec<Imputation>,
    pub drop_missing: Vec<String>,
}

impl CsvDatasetProvider {
    pub fn new<I, S>(path: impl Into<PathBuf>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: path.into(),
            stage_column: STAGE_COLUMN.to_string(),
            columns: columns.into_iter().map(Into::into).collect(),
            imputations: Vec::new(),
            drop_missing: Vec::new(),
        }
    }

    /// Provider for every column `spec` references in a processed cup file
    pub fn for_cup(root: impl AsRef<Path>, country: &str, cup: &str, spec: &VariableSpec) -> Self {
        Self::new(processed_data_path(root, country, cup), spec.all_columns())
    }

    pub fn with_stage_column(mut self, stage_column: impl Into<String>) -> Self {
        self.stage_column = stage_column.into();
        self
    }

    pub fn with_imputation(mut self, imputation: Imputation) -> Self {
        self.imputations.push(imputation);
        self
    }

    /// Drop rows with a missing value in any of `columns`
    pub fn dropping_missing<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.drop_missing.extend(columns.into_iter().map(Into::into));
        self
    }

    fn read(&self) -> Result<Dataset> {
        let df = load_processed_csv(&self.path)?;

        let mut wanted = self.columns.clone();
        let extra = self
            .imputations
            .iter()
            .map(|imputation| &imputation.column)
            .chain(&self.drop_missing);
        for name in extra {
            if !wanted.contains(name) {
                wanted.push(name.clone());
            }
        }
        let mut data = dataframe_to_dataset(&df, &self.stage_column, &wanted)?;

        for imputation in &self.imputations {
            data.impute(imputation)?;
        }
        if !self.drop_missing.is_empty() {
            data = data.drop_missing(&self.drop_missing)?;
        }
        debug!("{} rows ready for estimation", data.len());
        Ok(data)
    }
}

impl DatasetProvider for CsvDatasetProvider {
    fn load(&self) -> iv_core::Result<Dataset> {
        Ok(self.read()?)
    }
}
