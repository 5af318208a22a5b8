//! Per-stage summary table

use crate::Result;
use iv_core::Stage;
use iv_estimate::EstimationResult;
use serde::Serialize;
use std::fmt;
use std::io;
use std::path::Path;

/// One row of the summary table
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TableRow {
    pub stage: Stage,
    #[serde(rename = "2sls_iv")]
    pub estimate: f64,
    pub std_error: f64,
    pub p_value: f64,
    pub r_squared: f64,
    pub f_stat: f64,
    pub f_p_value: f64,
}

impl From<&EstimationResult> for TableRow {
    fn from(result: &EstimationResult) -> Self {
        Self {
            stage: result.stage,
            estimate: result.estimate,
            std_error: result.std_error,
            p_value: result.p_value,
            r_squared: result.r_squared,
            f_stat: result.f_stat,
            f_p_value: result.f_p_value,
        }
    }
}

/// Results of a staged run, one row per stage in stage order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    rows: Vec<TableRow>,
}

/// Tabulate results without touching them
pub fn summarize(results: &[EstimationResult]) -> ResultTable {
    ResultTable {
        rows: results.iter().map(TableRow::from).collect(),
    }
}

impl ResultTable {
    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write the table as CSV with a header row
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        for row in &self.rows {
            csv.serialize(row)?;
        }
        if self.rows.is_empty() {
            csv.write_record(HEADERS)?;
        }
        csv.flush()?;
        Ok(())
    }

    pub fn save_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.write_csv(io::BufWriter::new(file))
    }
}

const HEADERS: [&str; 7] = [
    "stage",
    "2sls_iv",
    "std_error",
    "p_value",
    "r_squared",
    "f_stat",
    "f_p_value",
];

impl fmt::Display for ResultTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>6}", HEADERS[0])?;
        for header in &HEADERS[1..] {
            write!(f, " {header:>11}")?;
        }
        for row in &self.rows {
            writeln!(f)?;
            write!(
                f,
                "{:>6} {:>11.4} {:>11.4} {:>11.4} {:>11.4} {:>11.3} {:>11.4}",
                row.stage,
                row.estimate,
                row.std_error,
                row.p_value,
                row.r_squared,
                row.f_stat,
                row.f_p_value
            )?;
        }
        Ok(())
    }
}
