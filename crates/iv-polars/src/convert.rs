//! Conversions between Polars frames and the estimation types

use crate::{Error, Result};
use iv_core::{is_missing, Dataset, Stage};
use iv_estimate::EstimationResult;
use polars::prelude::*;

/// Column holding the round of each fixture in processed cup data
pub const STAGE_COLUMN: &str = "stage";

/// Names of the columns produced by [`results_to_dataframe`]
pub const RESULT_COLUMNS: [&str; 7] = [
    "stage",
    "2sls_iv",
    "std_error",
    "p_value",
    "r_squared",
    "f_stat",
    "f_p_value",
];

/// Read a numeric column as `f64`, mapping nulls to `NaN`
pub fn column_to_f64(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = df
        .column(name)
        .map_err(|_| Error::InvalidColumn(name.to_string()))?;

    let dtype = column.dtype();
    if !(dtype.is_float() || dtype.is_integer() || matches!(dtype, DataType::Boolean)) {
        return Err(Error::TypeMismatch {
            column: name.to_string(),
            expected: "numeric".to_string(),
            got: format!("{dtype:?}"),
        });
    }

    let floats = column.cast(&DataType::Float64)?;
    Ok(floats
        .f64()?
        .iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

fn stage_keys(df: &DataFrame, stage_column: &str) -> Result<Vec<Stage>> {
    let column = df
        .column(stage_column)
        .map_err(|_| Error::InvalidColumn(stage_column.to_string()))?;

    let dtype = column.dtype();
    if !(dtype.is_integer() || dtype.is_float()) {
        return Err(Error::TypeMismatch {
            column: stage_column.to_string(),
            expected: "integer stage key".to_string(),
            got: format!("{dtype:?}"),
        });
    }

    if dtype.is_float() {
        let floats = column.cast(&DataType::Float64)?;
        if let Some((row, key)) = floats
            .f64()?
            .iter()
            .enumerate()
            .find_map(|(row, key)| key.filter(|k| k.fract() != 0.0).map(|k| (row, k)))
        {
            return Err(Error::InvalidInput(format!(
                "Stage column `{stage_column}` holds non-integer key {key} in row {row}"
            )));
        };
    }

    let keys = column.cast(&DataType::Int64)?;
    keys.i64()?
        .iter()
        .enumerate()
        .map(|(row, key)| {
            key.ok_or_else(|| {
                Error::InvalidInput(format!("Stage column `{stage_column}` is null in row {row}"))
            })
        })
        .collect()
}

/// Build a [`Dataset`] from the stage column and the requested numeric columns
pub fn dataframe_to_dataset<S: AsRef<str>>(
    df: &DataFrame,
    stage_column: &str,
    columns: &[S],
) -> Result<Dataset> {
    let mut data = Dataset::new(stage_keys(df, stage_column)?);
    for name in columns {
        let name = name.as_ref();
        if name == stage_column {
            continue;
        }
        data.insert_column(name, column_to_f64(df, name)?)?;
    }
    Ok(data)
}

/// Count missing (null or NaN) entries per column
///
/// Returns a frame with columns `column` and `nan_count`.
pub fn nan_counts<S: AsRef<str>>(df: &DataFrame, columns: &[S]) -> Result<DataFrame> {
    let mut names = Vec::with_capacity(columns.len());
    let mut counts = Vec::with_capacity(columns.len());
    for name in columns {
        let name = name.as_ref();
        let values = column_to_f64(df, name)?;
        names.push(name.to_string());
        counts.push(values.iter().filter(|v| is_missing(**v)).count() as u64);
    }
    Ok(DataFrame::new(vec![
        Series::new(PlSmallStr::from("column"), names).into(),
        Series::new(PlSmallStr::from("nan_count"), counts).into(),
    ])?)
}

/// Tabulate per-stage results, one row per stage
pub fn results_to_dataframe(results: &[EstimationResult]) -> Result<DataFrame> {
    let field = |f: fn(&EstimationResult) -> f64| -> Vec<f64> { results.iter().map(f).collect() };
    let stages: Vec<i64> = results.iter().map(|r| r.stage).collect();

    Ok(DataFrame::new(vec![
        Series::new(PlSmallStr::from(RESULT_COLUMNS[0]), stages).into(),
        Series::new(PlSmallStr::from(RESULT_COLUMNS[1]), field(|r| r.estimate)).into(),
        Series::new(PlSmallStr::from(RESULT_COLUMNS[2]), field(|r| r.std_error)).into(),
        Series::new(PlSmallStr::from(RESULT_COLUMNS[3]), field(|r| r.p_value)).into(),
        Series::new(PlSmallStr::from(RESULT_COLUMNS[4]), field(|r| r.r_squared)).into(),
        Series::new(PlSmallStr::from(RESULT_COLUMNS[5]), field(|r| r.f_stat)).into(),
        Series::new(PlSmallStr::from(RESULT_COLUMNS[6]), field(|r| r.f_p_value)).into(),
    ])?)
}
