//! Forecasting models for annual series with exogenous regressors

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use std::fmt::Debug;

/// A named regressor column
#[derive(Debug, Clone, PartialEq)]
pub struct Regressor {
    /// Column name
    pub name: String,
    /// One value per period
    pub values: Vec<f64>,
}

impl Regressor {
    /// Create a regressor column
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Historical periods, target values and regressors used to train a model
#[derive(Debug, Clone)]
pub struct TrainingFrame {
    label: String,
    periods: Vec<NaiveDate>,
    target: Vec<f64>,
    regressors: Vec<Regressor>,
}

impl TrainingFrame {
    /// Create a training frame.
    ///
    /// Periods must be strictly increasing and every column must have one
    /// value per period.
    pub fn new(
        label: impl Into<String>,
        periods: Vec<NaiveDate>,
        target: Vec<f64>,
        regressors: Vec<Regressor>,
    ) -> Result<Self> {
        if target.len() != periods.len() {
            return Err(ForecastError::ValidationError(format!(
                "Target length ({}) doesn't match periods ({})",
                target.len(),
                periods.len()
            )));
        }
        validate_columns(&periods, &regressors)?;

        Ok(Self {
            label: label.into(),
            periods,
            target,
            regressors,
        })
    }

    /// Label of the series (city identifier)
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Training periods
    pub fn periods(&self) -> &[NaiveDate] {
        &self.periods
    }

    /// Target values
    pub fn target(&self) -> &[f64] {
        &self.target
    }

    /// Regressor columns
    pub fn regressors(&self) -> &[Regressor] {
        &self.regressors
    }

    /// Number of periods
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    /// Check if the frame is empty
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }
}

/// Future periods with the regressor values assumed for them
#[derive(Debug, Clone)]
pub struct FutureFrame {
    periods: Vec<NaiveDate>,
    regressors: Vec<Regressor>,
}

impl FutureFrame {
    /// Create a future frame
    pub fn new(periods: Vec<NaiveDate>, regressors: Vec<Regressor>) -> Result<Self> {
        validate_columns(&periods, &regressors)?;
        Ok(Self {
            periods,
            regressors,
        })
    }

    /// Future periods
    pub fn periods(&self) -> &[NaiveDate] {
        &self.periods
    }

    /// Values of a regressor by name
    pub fn regressor(&self, name: &str) -> Option<&[f64]> {
        self.regressors
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.values.as_slice())
    }

    /// Number of periods
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    /// Check if the frame is empty
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }
}

fn validate_columns(periods: &[NaiveDate], regressors: &[Regressor]) -> Result<()> {
    if periods.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Err(ForecastError::ValidationError(
            "Periods must be strictly increasing".to_string(),
        ));
    }
    for regressor in regressors {
        if regressor.values.len() != periods.len() {
            return Err(ForecastError::ValidationError(format!(
                "Regressor {} has {} values for {} periods",
                regressor.name,
                regressor.values.len(),
                periods.len()
            )));
        }
    }
    Ok(())
}

/// Point forecasts with their uncertainty interval
#[derive(Debug, Clone)]
pub struct ModelForecast {
    values: Vec<f64>,
    intervals: Vec<(f64, f64)>,
}

impl ModelForecast {
    /// Create a forecast with one interval per value
    pub fn new(values: Vec<f64>, intervals: Vec<(f64, f64)>) -> Result<Self> {
        if values.len() != intervals.len() {
            return Err(ForecastError::ValidationError(format!(
                "Values length ({}) doesn't match intervals length ({})",
                values.len(),
                intervals.len()
            )));
        }

        Ok(Self { values, intervals })
    }

    /// Forecasted values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Lower and upper bounds
    pub fn intervals(&self) -> &[(f64, f64)] {
        &self.intervals
    }

    /// Number of periods forecasted
    pub fn horizons(&self) -> usize {
        self.values.len()
    }
}

/// Trained forecast model
pub trait TrainedForecastModel: Debug {
    /// Generate a forecast for the given future periods
    fn forecast(&self, future: &FutureFrame) -> Result<ModelForecast>;

    /// In-sample predictions for a training frame
    fn predict(&self, data: &TrainingFrame) -> Result<Vec<f64>>;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Forecast model that can be trained on a training frame
pub trait ForecastModel: Debug + Clone + Send + Sync {
    /// The type of trained model produced
    type Trained: TrainedForecastModel;

    /// Train the model
    fn train(&self, data: &TrainingFrame) -> Result<Self::Trained>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

pub mod additive;
