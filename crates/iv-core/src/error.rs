//! Error types for staged instrumental-variable analysis
//!
//! Provides a unified error type for all iv-* crates.

use crate::Stage;
use thiserror::Error;

/// Core error type for dataset handling and estimation
#[derive(Error, Debug)]
pub enum Error {
    /// A required column is absent from the dataset
    #[error("Missing column: `{column}` is not present in the dataset")]
    MissingColumn { column: String },

    /// A referenced column holds missing (NaN or infinite) values
    #[error("Missing values: column `{column}` has {count} missing value(s); drop or impute them before estimation")]
    MissingValues { column: String, count: usize },

    /// The design matrix is singular or underdetermined
    #[error("Degenerate design in {equation}: {reason} ({rows} rows, {params} parameters)")]
    DegenerateDesign {
        equation: String,
        rows: usize,
        params: usize,
        reason: String,
    },

    /// The variable specification violates a structural rule
    #[error("Invalid specification: {0}")]
    InvalidSpecification(String),

    /// Invalid parameter provided to a function
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Insufficient data for the requested operation
    #[error("Insufficient data: expected at least {expected} rows, got {actual}")]
    InsufficientData { expected: usize, actual: usize },

    /// Numerical computation error
    #[error("Computation error: {0}")]
    Computation(String),

    /// A failure raised while estimating one stage
    #[error("Stage {stage}: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<Error>,
    },

    /// IO error (for file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

// Helper functions for common error patterns

impl Error {
    /// Create an error for a column that cannot be found
    pub fn missing_column(column: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
        }
    }

    /// Create a degenerate-design error for a named equation
    pub fn degenerate(
        equation: impl Into<String>,
        rows: usize,
        params: usize,
        reason: impl Into<String>,
    ) -> Self {
        Self::DegenerateDesign {
            equation: equation.into(),
            rows,
            params,
            reason: reason.into(),
        }
    }

    /// Create an error for size mismatch
    pub fn size_mismatch(expected: usize, actual: usize, context: &str) -> Self {
        Self::InvalidInput(format!(
            "Size mismatch in {context}: expected {expected}, got {actual}"
        ))
    }

    /// Attach the stage identifier to an error raised while estimating it
    pub fn in_stage(self, stage: Stage) -> Self {
        match self {
            already @ Self::Stage { .. } => already,
            other => Self::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// Stage the error was raised in, if known
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// The error with any stage wrapper removed
    pub fn root(&self) -> &Error {
        match self {
            Self::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether the underlying failure is a singular or underdetermined design
    pub fn is_degenerate(&self) -> bool {
        matches!(self.root(), Self::DegenerateDesign { .. })
    }

    /// Whether the underlying failure is an absent column
    pub fn is_missing_column(&self) -> bool {
        matches!(self.root(), Self::MissingColumn { .. })
    }
}
