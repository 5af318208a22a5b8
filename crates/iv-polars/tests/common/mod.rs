//! Common test utilities for iv-polars tests

#![allow(dead_code)]

use polars::prelude::*;

pub use iv_polars::test_data::cup_fixtures;

/// Helper function to extract a single value from a result DataFrame
pub fn value_at(df: &DataFrame, column: &str, row: usize) -> f64 {
    df.column(column).unwrap().f64().unwrap().get(row).unwrap()
}
