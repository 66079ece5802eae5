//! Per-city forecasting and the concurrent batch runner

use crate::data::IndicatorTable;
use crate::error::{CityFailure, ForecastError, Result};
use crate::features::{period_start, CitySeries, FeatureBuilder};
use crate::metrics::{forecast_accuracy, FitSummary};
use crate::models::additive::{AdditiveConfig, AdditiveRegression};
use crate::models::{ForecastModel, FutureFrame, Regressor, TrainedForecastModel, TrainingFrame};
use chrono::NaiveDate;
use livability_math::{Category, CategoryValues};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;

/// Default number of years to forecast
pub const DEFAULT_HORIZON: usize = 5;

/// One forecasted year
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub year: i32,
    pub forecast: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// Forecast for one city
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    city: String,
    points: Vec<ForecastPoint>,
    fit: FitSummary,
}

impl ForecastResult {
    /// Create a forecast result.
    ///
    /// Years must be consecutive and strictly after `last_observed_year`.
    pub fn new(
        city: impl Into<String>,
        last_observed_year: i32,
        points: Vec<ForecastPoint>,
        fit: FitSummary,
    ) -> Result<Self> {
        let city = city.into();
        for (offset, point) in points.iter().enumerate() {
            let expected = last_observed_year + offset as i32 + 1;
            if point.year != expected {
                return Err(ForecastError::ValidationError(format!(
                    "{}: forecast year {} at position {}, expected {}",
                    city, point.year, offset, expected
                )));
            }
            if !(point.lower_bound <= point.forecast && point.forecast <= point.upper_bound) {
                return Err(ForecastError::ValidationError(format!(
                    "{}: forecast for {} outside its interval",
                    city, point.year
                )));
            }
        }

        Ok(Self { city, points, fit })
    }

    /// City identifier
    pub fn city(&self) -> &str {
        &self.city
    }

    /// Forecasted years in order
    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    /// In-sample fit diagnostics
    pub fn fit(&self) -> &FitSummary {
        &self.fit
    }

    /// Number of forecasted years
    pub fn horizon(&self) -> usize {
        self.points.len()
    }
}

/// Successful forecasts plus the cities that could not be forecast
#[derive(Debug, Default)]
pub struct ForecastReport {
    pub forecasts: BTreeMap<String, ForecastResult>,
    pub failures: Vec<CityFailure>,
}

impl ForecastReport {
    /// Failure record for one city, if it failed
    pub fn failure(&self, city: &str) -> Option<&CityFailure> {
        self.failures.iter().find(|f| f.city == city)
    }
}

/// Regressor names in design order: raw categories, then deltas
pub fn regressor_names() -> Vec<String> {
    Category::ALL
        .iter()
        .map(|c| c.name().to_string())
        .chain(Category::ALL.iter().map(|c| c.delta_name()))
        .collect()
}

fn regressor_columns<'a, I>(rows: I) -> Vec<Regressor>
where
    I: Iterator<Item = (&'a CategoryValues, &'a CategoryValues)> + Clone,
{
    let mut columns = Vec::with_capacity(2 * Category::COUNT);
    for category in Category::ALL {
        let values = rows.clone().map(|(values, _)| values[category]).collect();
        columns.push(Regressor::new(category.name(), values));
    }
    for category in Category::ALL {
        let values = rows.clone().map(|(_, deltas)| deltas[category]).collect();
        columns.push(Regressor::new(category.delta_name(), values));
    }
    columns
}

fn anchor(city: &str, year: i32) -> Result<NaiveDate> {
    period_start(year).ok_or_else(|| {
        ForecastError::DataError(format!("{}: year {} is out of range", city, year))
    })
}

/// Fits one model per city and forecasts a fixed horizon
#[derive(Debug, Clone)]
pub struct CityForecaster<M: ForecastModel = AdditiveRegression> {
    model: M,
    horizon: usize,
}

impl CityForecaster<AdditiveRegression> {
    /// Forecaster using the additive model with the given settings
    pub fn additive(config: AdditiveConfig, horizon: usize) -> Result<Self> {
        Self::new(AdditiveRegression::new(config)?, horizon)
    }
}

impl<M: ForecastModel> CityForecaster<M> {
    /// Create a forecaster; the horizon must be at least one year
    pub fn new(model: M, horizon: usize) -> Result<Self> {
        if horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "Horizon must be greater than 0".to_string(),
            ));
        }
        Ok(Self { model, horizon })
    }

    /// Years forecast per city
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Model being fitted
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Training frame over the delta-bearing rows of a series
    pub fn training_frame(series: &CitySeries) -> Result<TrainingFrame> {
        let rows: Vec<_> = series
            .training_rows()
            .filter_map(|o| o.deltas.as_ref().map(|d| (o, d)))
            .collect();

        let periods = rows
            .iter()
            .map(|(o, _)| anchor(series.city(), o.year))
            .collect::<Result<Vec<_>>>()?;
        let target = rows.iter().map(|(o, _)| o.score).collect();
        let regressors = regressor_columns(rows.iter().map(|&(o, d)| (&o.values, d)));

        TrainingFrame::new(series.city(), periods, target, regressors)
    }

    /// Future frame holding every regressor at its last observed value
    pub fn future_frame(&self, series: &CitySeries) -> Result<FutureFrame> {
        let last = series
            .last()
            .ok_or_else(|| ForecastError::InsufficientData {
                city: series.city().to_string(),
                required: 1,
                found: 0,
            })?;
        let deltas = last.deltas.unwrap_or_default();

        let periods = (1..=self.horizon as i32)
            .map(|offset| anchor(series.city(), last.year + offset))
            .collect::<Result<Vec<_>>>()?;
        let rows = std::iter::repeat((&last.values, &deltas)).take(self.horizon);

        FutureFrame::new(periods, regressor_columns(rows))
    }

    /// Fit and forecast one city
    pub fn forecast_city(&self, series: &CitySeries) -> Result<ForecastResult> {
        let training = Self::training_frame(series)?;
        let trained = self.model.train(&training)?;

        let fitted = trained.predict(&training)?;
        let fit = FitSummary {
            observations: training.len(),
            accuracy: forecast_accuracy(&fitted, training.target())?,
            noise_scale: forecast_noise(&fitted, training.target()),
        };

        let future = self.future_frame(series)?;
        let forecast = trained.forecast(&future)?;

        let last_year = series.last_year().unwrap_or_default();
        let points = forecast
            .values()
            .iter()
            .zip(forecast.intervals())
            .enumerate()
            .map(|(offset, (value, (lower, upper)))| ForecastPoint {
                year: last_year + offset as i32 + 1,
                forecast: *value,
                lower_bound: *lower,
                upper_bound: *upper,
            })
            .collect();

        log::debug!(
            "{}: {} fitted on {} rows, in-sample MAE {:.4}",
            series.city(),
            trained.name(),
            fit.observations,
            fit.accuracy.mae
        );

        ForecastResult::new(series.city(), last_year, points, fit)
    }

    /// Forecast every city in parallel; one city's failure does not stop the others
    pub fn forecast_all(&self, series: &BTreeMap<String, CitySeries>) -> ForecastReport {
        let cities: Vec<&CitySeries> = series.values().collect();
        let outcomes: Vec<(String, Result<ForecastResult>)> = cities
            .par_iter()
            .map(|s| (s.city().to_string(), self.forecast_city(s)))
            .collect();

        let mut report = ForecastReport::default();
        for (city, outcome) in outcomes {
            match outcome {
                Ok(result) => {
                    report.forecasts.insert(city, result);
                }
                Err(err) => {
                    log::warn!("Forecast failed for {}: {}", city, err);
                    report.failures.push(CityFailure::new(city, err));
                }
            }
        }
        report
    }
}

/// Residual standard deviation of fitted values
fn forecast_noise(fitted: &[f64], actual: &[f64]) -> f64 {
    let n = fitted.len();
    if n == 0 {
        return 0.0;
    }
    let rss: f64 = fitted.iter().zip(actual).map(|(f, a)| (a - f).powi(2)).sum();
    (rss / n.saturating_sub(1).max(1) as f64).sqrt()
}

/// Feature building, per-city fitting and failure collection in one step
#[derive(Debug, Clone)]
pub struct ForecastPipeline<M: ForecastModel = AdditiveRegression> {
    features: FeatureBuilder,
    forecaster: CityForecaster<M>,
    worker_threads: usize,
}

impl<M: ForecastModel> ForecastPipeline<M> {
    /// Create a pipeline; `worker_threads == 0` uses the global rayon pool
    pub fn new(
        features: FeatureBuilder,
        forecaster: CityForecaster<M>,
        worker_threads: usize,
    ) -> Self {
        Self {
            features,
            forecaster,
            worker_threads,
        }
    }

    /// Per-city forecaster in use
    pub fn forecaster(&self) -> &CityForecaster<M> {
        &self.forecaster
    }

    /// Run the whole pipeline over an indicator table.
    ///
    /// Only a table without any aggregate row is fatal; every other problem
    /// is recorded as a per-city failure.
    pub fn run(&self, table: &IndicatorTable) -> Result<ForecastReport> {
        let (series, rejected) = self.features.build(table)?.into_parts();

        let mut report = if self.worker_threads > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.worker_threads)
                .build()
                .map_err(|e| ForecastError::InvalidParameter(e.to_string()))?;
            pool.install(|| self.forecaster.forecast_all(&series))
        } else {
            self.forecaster.forecast_all(&series)
        };

        report.failures.extend(rejected);
        report.failures.sort_by(|a, b| a.city.cmp(&b.city));

        log::info!(
            "Forecast {} cities over {} years ({} failed)",
            report.forecasts.len(),
            self.forecaster.horizon(),
            report.failures.len()
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use livability_math::WeightMap;

    fn rising_series(city: &str, years: std::ops::RangeInclusive<i32>) -> CitySeries {
        let start = *years.start();
        let rows = years
            .map(|y| (y, CategoryValues::splat(0.1 + 0.2 * (y - start) as f64)))
            .collect();
        CitySeries::new(city, rows, &WeightMap::forecasting()).unwrap()
    }

    #[test]
    fn test_zero_horizon_rejected() {
        assert!(CityForecaster::additive(AdditiveConfig::default(), 0).is_err());
    }

    #[test]
    fn test_training_frame_skips_first_year() {
        let series = rising_series("Springfield", 2020..=2024);
        let frame = CityForecaster::<AdditiveRegression>::training_frame(&series).unwrap();
        assert_eq!(frame.len(), 4);
        assert_eq!(frame.regressors().len(), 14);
        assert_eq!(frame.periods()[0], NaiveDate::from_ymd_opt(2021, 1, 1).unwrap());
    }

    #[test]
    fn test_future_frame_carries_last_values() {
        let series = rising_series("Springfield", 2020..=2024);
        let forecaster = CityForecaster::additive(AdditiveConfig::default(), 3).unwrap();
        let future = forecaster.future_frame(&series).unwrap();
        assert_eq!(future.len(), 3);
        assert_eq!(future.periods()[2], NaiveDate::from_ymd_opt(2027, 1, 1).unwrap());
        let housing = future.regressor("Housing").unwrap();
        assert!(housing.iter().all(|v| (*v - 0.9).abs() < 1e-12));
    }

    #[test]
    fn test_regressor_names_order() {
        let names = regressor_names();
        assert_eq!(names.len(), 14);
        assert_eq!(names[0], "Housing");
        assert_eq!(names[7], "Housing_delta");
    }
}
