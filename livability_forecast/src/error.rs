//! Error types for the livability_forecast crate

use livability_math::{MathError, WeightIssue};
use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the livability_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// A required column is absent from the input table
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// No rows with race stratum "All" and sex stratum "Both"
    #[error("No city-wide aggregate rows (race \"All\", sex \"Both\") in input")]
    NoAggregateRows,

    /// Too few delta-bearing observations to fit a model
    #[error("Insufficient data points for {city}: need {required}, found {found}")]
    InsufficientData {
        city: String,
        required: usize,
        found: usize,
    },

    /// Every regressor is constant over the training window
    #[error("Degenerate regressors for {city}: every regressor is constant")]
    DegenerateRegressors { city: String },

    /// The normal equations could not be solved
    #[error("Singular fit for {city}: {detail}")]
    SingularFit { city: String, detail: String },

    /// More than one aggregate row for the same city and year
    #[error("Duplicate aggregate rows for {city} in {year}")]
    DuplicateYear { city: String, year: i32 },

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Caller-supplied weights failed validation under the reject policy
    #[error("Invalid weights: {}", format_issues(.0))]
    InvalidWeights(Vec<WeightIssue>),

    /// Error related to parameter or result validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error from scoring math
    #[error("Math error: {0}")]
    Math(#[from] MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error writing CSV output
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error reading or writing JSON
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error parsing configuration
    #[error("Config error: {0}")]
    ConfigError(String),
}

impl ForecastError {
    /// Short stable reason used when reporting per-city failures
    pub fn reason(&self) -> &'static str {
        match self {
            ForecastError::InsufficientData { .. } => "insufficient data points",
            ForecastError::DegenerateRegressors { .. } => "degenerate regressors",
            ForecastError::SingularFit { .. } => "singular fit",
            ForecastError::DuplicateYear { .. } => "duplicate year",
            ForecastError::NoAggregateRows => "no aggregate rows",
            ForecastError::MissingColumn(_) => "missing column",
            ForecastError::InvalidWeights(_) => "invalid weights",
            _ => "forecast failed",
        }
    }
}

fn format_issues(issues: &[WeightIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A city excluded from the forecast and the reason why
#[derive(Debug)]
pub struct CityFailure {
    /// City identifier
    pub city: String,
    /// Error that excluded the city
    pub error: ForecastError,
}

impl CityFailure {
    /// Create a failure record
    pub fn new(city: impl Into<String>, error: ForecastError) -> Self {
        Self {
            city: city.into(),
            error,
        }
    }

    /// Short stable reason, e.g. "insufficient data points"
    pub fn reason(&self) -> &'static str {
        self.error.reason()
    }
}

impl std::fmt::Display for CityFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} ({})", self.city, self.reason(), self.error)
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl From<toml::de::Error> for ForecastError {
    fn from(err: toml::de::Error) -> Self {
        ForecastError::ConfigError(err.to_string())
    }
}
