//! # Livability Math
//!
//! Mathematical building blocks for city livability scoring.
//! This crate provides the fixed category list, weight maps used to
//! compute composite scores, and the small dense linear algebra needed
//! by the forecasting model.

use thiserror::Error;

pub mod categories;
pub mod regression;
pub mod weights;

pub use crate::categories::{Category, CategoryValues};
pub use crate::weights::{WeightIssue, WeightMap, WEIGHT_SUM_TOLERANCE};

/// Errors that can occur in scoring and regression calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Matrix is not positive definite at pivot {0}")]
    NotPositiveDefinite(usize),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for livability math operations
pub type Result<T> = std::result::Result<T, MathError>;
