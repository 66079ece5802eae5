//! Additive trend-plus-regressors model
//!
//! The fitted curve is `y = intercept + slope * t + Σ β_j z_j` where `t` is the
//! period rescaled to `[0, 1]` over the training window and `z_j` is the
//! standardized regressor `j`. Coefficients are the MAP estimate under
//! zero-mean Gaussian priors on the slope and regressor weights (a ridge
//! regression with an unpenalized intercept), solved in closed form.

use crate::error::{ForecastError, Result};
use crate::models::{
    ForecastModel, FutureFrame, ModelForecast, TrainedForecastModel, TrainingFrame,
};
use chrono::NaiveDate;
use livability_math::regression::{mean, quadratic_form, sample_std, Cholesky};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

/// Noise floor in scaled units so a perfect fit still yields an interval
const MIN_NOISE_SCALE: f64 = 1e-3;

/// Relative spread below which a regressor counts as constant
const CONSTANT_TOLERANCE: f64 = 1e-9;

/// Model hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdditiveConfig {
    /// Coverage of the uncertainty interval, in `(0, 1)`
    pub interval_width: f64,
    /// Prior standard deviation of the trend slope
    pub trend_prior_scale: f64,
    /// Prior standard deviation of each standardized regressor weight
    pub regressor_prior_scale: f64,
    /// Minimum number of training rows
    pub min_observations: usize,
}

impl Default for AdditiveConfig {
    fn default() -> Self {
        Self {
            interval_width: 0.8,
            trend_prior_scale: 5.0,
            regressor_prior_scale: 10.0,
            min_observations: 2,
        }
    }
}

impl AdditiveConfig {
    /// Check every field is usable
    pub fn validate(&self) -> Result<()> {
        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "interval_width must be in (0, 1), got {}",
                self.interval_width
            )));
        }
        if !(self.trend_prior_scale > 0.0 && self.trend_prior_scale.is_finite()) {
            return Err(ForecastError::InvalidParameter(format!(
                "trend_prior_scale must be positive, got {}",
                self.trend_prior_scale
            )));
        }
        if !(self.regressor_prior_scale > 0.0 && self.regressor_prior_scale.is_finite()) {
            return Err(ForecastError::InvalidParameter(format!(
                "regressor_prior_scale must be positive, got {}",
                self.regressor_prior_scale
            )));
        }
        if self.min_observations == 0 {
            return Err(ForecastError::InvalidParameter(
                "min_observations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Additive regression model
#[derive(Debug, Clone)]
pub struct AdditiveRegression {
    name: String,
    config: AdditiveConfig,
    quantile: f64,
}

impl Default for AdditiveRegression {
    fn default() -> Self {
        Self {
            name: "Additive Regression".to_string(),
            config: AdditiveConfig::default(),
            // Standard normal quantile at 0.9
            quantile: 1.2815515655446004,
        }
    }
}

impl AdditiveRegression {
    /// Create a model from validated hyperparameters
    pub fn new(config: AdditiveConfig) -> Result<Self> {
        config.validate()?;

        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| ForecastError::InvalidParameter(e.to_string()))?;
        let quantile = normal.inverse_cdf(0.5 + config.interval_width / 2.0);

        Ok(Self {
            name: format!(
                "Additive Regression (interval={})",
                config.interval_width
            ),
            config,
            quantile,
        })
    }

    /// Hyperparameters in use
    pub fn config(&self) -> &AdditiveConfig {
        &self.config
    }
}

/// Standardization of one regressor kept in the fit
#[derive(Debug, Clone)]
struct Standardizer {
    name: String,
    mean: f64,
    std: f64,
}

/// Trained additive regression
#[derive(Debug, Clone)]
pub struct TrainedAdditiveRegression {
    name: String,
    origin: NaiveDate,
    span_days: f64,
    y_scale: f64,
    standardizers: Vec<Standardizer>,
    excluded: Vec<String>,
    /// Intercept, slope, then one weight per kept regressor
    coefficients: Vec<f64>,
    /// Posterior precision inverse, row-major
    covariance: Vec<f64>,
    sigma: f64,
    quantile: f64,
}

impl ForecastModel for AdditiveRegression {
    type Trained = TrainedAdditiveRegression;

    fn train(&self, data: &TrainingFrame) -> Result<Self::Trained> {
        let city = data.label();
        let n = data.len();
        if n < self.config.min_observations || n == 0 {
            return Err(ForecastError::InsufficientData {
                city: city.to_string(),
                required: self.config.min_observations,
                found: n,
            });
        }
        if data.target().iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::DataError(format!(
                "Non-finite target value for {}",
                city
            )));
        }

        let periods = data.periods();
        let origin = periods[0];
        let span_days = ((periods[n - 1] - origin).num_days() as f64).max(1.0);

        let y_max = data.target().iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        let y_scale = if y_max > 0.0 { y_max } else { 1.0 };
        let ys: Vec<f64> = data.target().iter().map(|v| v / y_scale).collect();

        let mut standardizers = Vec::new();
        let mut columns: Vec<&[f64]> = Vec::new();
        let mut excluded = Vec::new();
        for regressor in data.regressors() {
            if regressor.values.iter().any(|v| !v.is_finite()) {
                return Err(ForecastError::DataError(format!(
                    "Non-finite value in regressor {} for {}",
                    regressor.name, city
                )));
            }
            match (mean(&regressor.values), sample_std(&regressor.values)) {
                (Some(m), Some(s)) if s > CONSTANT_TOLERANCE * m.abs().max(1.0) => {
                    standardizers.push(Standardizer {
                        name: regressor.name.clone(),
                        mean: m,
                        std: s,
                    });
                    columns.push(&regressor.values);
                }
                _ => excluded.push(regressor.name.clone()),
            }
        }
        if standardizers.is_empty() {
            return Err(ForecastError::DegenerateRegressors {
                city: city.to_string(),
            });
        }
        if !excluded.is_empty() {
            log::debug!("{}: constant regressors excluded: {}", city, excluded.join(", "));
        }

        let p = 2 + standardizers.len();
        let mut design = Vec::with_capacity(n);
        for (i, period) in periods.iter().enumerate() {
            let t = (*period - origin).num_days() as f64 / span_days;
            let mut row = Vec::with_capacity(p);
            row.push(1.0);
            row.push(t);
            for (standardizer, column) in standardizers.iter().zip(&columns) {
                row.push((column[i] - standardizer.mean) / standardizer.std);
            }
            design.push(row);
        }

        let mut precision = vec![0.0; p * p];
        let mut rhs = vec![0.0; p];
        for (row, y) in design.iter().zip(&ys) {
            for a in 0..p {
                rhs[a] += row[a] * y;
                for b in 0..p {
                    precision[a * p + b] += row[a] * row[b];
                }
            }
        }
        precision[p + 1] += 1.0 / self.config.trend_prior_scale.powi(2);
        let regressor_penalty = 1.0 / self.config.regressor_prior_scale.powi(2);
        for j in 2..p {
            precision[j * p + j] += regressor_penalty;
        }

        let singular = |detail: String| ForecastError::SingularFit {
            city: city.to_string(),
            detail,
        };
        let cholesky = Cholesky::decompose(&precision, p).map_err(|e| singular(e.to_string()))?;
        let coefficients = cholesky.solve(&rhs).map_err(|e| singular(e.to_string()))?;
        let covariance = cholesky.inverse().map_err(|e| singular(e.to_string()))?;

        let rss: f64 = design
            .iter()
            .zip(&ys)
            .map(|(row, y)| (y - dot(row, &coefficients)).powi(2))
            .sum();
        let dof = n.saturating_sub(1).max(1) as f64;
        let sigma = (rss / dof).sqrt().max(MIN_NOISE_SCALE);

        Ok(TrainedAdditiveRegression {
            name: self.name.clone(),
            origin,
            span_days,
            y_scale,
            standardizers,
            excluded,
            coefficients,
            covariance,
            sigma,
            quantile: self.quantile,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedAdditiveRegression {
    /// Coefficients by term name, in scaled units
    pub fn coefficients(&self) -> Vec<(String, f64)> {
        let mut named = vec![
            ("intercept".to_string(), self.coefficients[0]),
            ("trend".to_string(), self.coefficients[1]),
        ];
        for (standardizer, beta) in self.standardizers.iter().zip(&self.coefficients[2..]) {
            named.push((standardizer.name.clone(), *beta));
        }
        named
    }

    /// Regressors dropped because they were constant over the training window
    pub fn excluded_regressors(&self) -> &[String] {
        &self.excluded
    }

    /// Residual standard deviation in target units
    pub fn noise_scale(&self) -> f64 {
        self.sigma * self.y_scale
    }

    fn design_row(
        &self,
        period: NaiveDate,
        index: usize,
        columns: &[&[f64]],
    ) -> Vec<f64> {
        let mut row = Vec::with_capacity(self.coefficients.len());
        row.push(1.0);
        row.push((period - self.origin).num_days() as f64 / self.span_days);
        for (standardizer, column) in self.standardizers.iter().zip(columns) {
            row.push((column[index] - standardizer.mean) / standardizer.std);
        }
        row
    }

    fn columns<'a, F>(&self, lookup: F) -> Result<Vec<&'a [f64]>>
    where
        F: Fn(&str) -> Option<&'a [f64]>,
    {
        self.standardizers
            .iter()
            .map(|s| {
                lookup(&s.name).ok_or_else(|| {
                    ForecastError::ValidationError(format!("Missing regressor {}", s.name))
                })
            })
            .collect()
    }
}

impl TrainedForecastModel for TrainedAdditiveRegression {
    fn forecast(&self, future: &FutureFrame) -> Result<ModelForecast> {
        let columns = self.columns(|name| future.regressor(name))?;

        let mut values = Vec::with_capacity(future.len());
        let mut intervals = Vec::with_capacity(future.len());
        for (i, period) in future.periods().iter().enumerate() {
            let row = self.design_row(*period, i, &columns);
            let estimate = dot(&row, &self.coefficients);
            let spread = self.sigma * (1.0 + quadratic_form(&self.covariance, &row)).sqrt();
            let half_width = self.quantile * spread;

            values.push(estimate * self.y_scale);
            intervals.push((
                (estimate - half_width) * self.y_scale,
                (estimate + half_width) * self.y_scale,
            ));
        }

        ModelForecast::new(values, intervals)
    }

    fn predict(&self, data: &TrainingFrame) -> Result<Vec<f64>> {
        let columns = self.columns(|name| {
            data.regressors()
                .iter()
                .find(|r| r.name == name)
                .map(|r| r.values.as_slice())
        })?;

        Ok(data
            .periods()
            .iter()
            .enumerate()
            .map(|(i, period)| {
                dot(&self.design_row(*period, i, &columns), &self.coefficients) * self.y_scale
            })
            .collect())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
