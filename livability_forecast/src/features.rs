//! Feature building: aggregate filter, composite score and year-over-year deltas

use crate::data::{IndicatorRecord, IndicatorTable};
use crate::error::{CityFailure, ForecastError, Result};
use chrono::NaiveDate;
use livability_math::{CategoryValues, WeightMap};
use std::collections::BTreeMap;

/// January 1st of `year`, the period anchor for annual observations
pub fn period_start(year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 1, 1)
}

/// One year of a city's series
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Calendar year
    pub year: i32,
    /// Composite score under the forecasting weights
    pub score: f64,
    /// Raw category values
    pub values: CategoryValues,
    /// Change from the previous observed year; `None` for the first year
    pub deltas: Option<CategoryValues>,
}

/// Year-ordered observations for one city
#[derive(Debug, Clone, PartialEq)]
pub struct CitySeries {
    city: String,
    observations: Vec<Observation>,
}

impl CitySeries {
    /// Build a series from `(year, values)` rows in any order.
    ///
    /// Rows are sorted by year; deltas use sorted adjacency, so a gap in the
    /// years still yields a delta against the previous available year.
    pub fn new(
        city: impl Into<String>,
        mut rows: Vec<(i32, CategoryValues)>,
        weights: &WeightMap,
    ) -> Result<Self> {
        let city = city.into();
        rows.sort_by_key(|(year, _)| *year);

        if let Some(pair) = rows.windows(2).find(|pair| pair[0].0 == pair[1].0) {
            return Err(ForecastError::DuplicateYear {
                city,
                year: pair[0].0,
            });
        }

        let mut observations: Vec<Observation> = Vec::with_capacity(rows.len());
        for (year, values) in rows {
            let deltas = observations
                .last()
                .map(|previous| values.delta_from(&previous.values));
            observations.push(Observation {
                year,
                score: weights.composite(&values),
                values,
                deltas,
            });
        }

        Ok(Self { city, observations })
    }

    /// City identifier
    pub fn city(&self) -> &str {
        &self.city
    }

    /// All observations in year order
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Observations that carry deltas and can be used for fitting
    pub fn training_rows(&self) -> impl Iterator<Item = &Observation> {
        self.observations.iter().filter(|o| o.deltas.is_some())
    }

    /// Number of delta-bearing observations
    pub fn training_len(&self) -> usize {
        self.training_rows().count()
    }

    /// Most recent observation
    pub fn last(&self) -> Option<&Observation> {
        self.observations.last()
    }

    /// Most recent observed year
    pub fn last_year(&self) -> Option<i32> {
        self.last().map(|o| o.year)
    }

    /// Number of observations
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Check if the series is empty
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// Per-city series built from one indicator table
#[derive(Debug, Default)]
pub struct FeatureSet {
    series: BTreeMap<String, CitySeries>,
    rejected: Vec<CityFailure>,
}

impl FeatureSet {
    /// Series keyed by city, in city order
    pub fn series(&self) -> &BTreeMap<String, CitySeries> {
        &self.series
    }

    /// Series for one city
    pub fn get(&self, city: &str) -> Option<&CitySeries> {
        self.series.get(city)
    }

    /// Cities whose rows could not form a valid series
    pub fn rejected(&self) -> &[CityFailure] {
        &self.rejected
    }

    /// Split into series and rejections
    pub fn into_parts(self) -> (BTreeMap<String, CitySeries>, Vec<CityFailure>) {
        (self.series, self.rejected)
    }
}

/// Builds per-city series from the aggregate slice of an indicator table
#[derive(Debug, Clone)]
pub struct FeatureBuilder {
    weights: WeightMap,
}

impl Default for FeatureBuilder {
    fn default() -> Self {
        Self::new(WeightMap::forecasting())
    }
}

impl FeatureBuilder {
    /// Create a builder scoring with `weights`
    pub fn new(weights: WeightMap) -> Self {
        Self { weights }
    }

    /// Weights used for the composite score
    pub fn weights(&self) -> &WeightMap {
        &self.weights
    }

    /// Build one series per city.
    ///
    /// Only rows with race "All" and sex "Both" are used; the rest are
    /// dropped silently. Rows with non-finite values are skipped before
    /// deltas are taken. An input without any such row is an error. A city
    /// with duplicate years is rejected and reported, not fatal.
    pub fn build(&self, table: &IndicatorTable) -> Result<FeatureSet> {
        self.build_from_records(table.records())
    }

    /// Same as [`FeatureBuilder::build`] over a plain record slice
    pub fn build_from_records(&self, records: &[IndicatorRecord]) -> Result<FeatureSet> {
        let mut by_city: BTreeMap<&str, Vec<(i32, CategoryValues)>> = BTreeMap::new();
        let mut out_of_range = 0usize;
        let mut incomplete: BTreeMap<&str, usize> = BTreeMap::new();

        for record in records.iter().filter(|r| r.is_aggregate()) {
            if !record.values.is_finite() {
                *incomplete.entry(record.city.as_str()).or_default() += 1;
                continue;
            }
            if !record.values.out_of_unit_range().is_empty() {
                out_of_range += 1;
            }
            by_city
                .entry(record.city.as_str())
                .or_default()
                .push((record.year, record.values));
        }

        if !incomplete.is_empty() {
            log::warn!(
                "Skipped {} aggregate rows with missing values",
                incomplete.values().sum::<usize>()
            );
        }
        if by_city.is_empty() && incomplete.is_empty() {
            return Err(ForecastError::NoAggregateRows);
        }
        if out_of_range > 0 {
            log::debug!("{} aggregate rows have values outside [0, 1]", out_of_range);
        }

        let mut features = FeatureSet::default();
        for (city, skipped) in &incomplete {
            if !by_city.contains_key(city) {
                let err = ForecastError::InsufficientData {
                    city: city.to_string(),
                    required: 1,
                    found: 0,
                };
                log::warn!("Rejecting {}: all {} aggregate rows incomplete", city, skipped);
                features.rejected.push(CityFailure::new(*city, err));
            }
        }
        for (city, rows) in by_city {
            match CitySeries::new(city, rows, &self.weights) {
                Ok(series) => {
                    features.series.insert(city.to_string(), series);
                }
                Err(err) => {
                    log::warn!("Rejecting {}: {}", city, err);
                    features.rejected.push(CityFailure::new(city, err));
                }
            }
        }

        log::info!(
            "Built {} city series ({} rejected)",
            features.series.len(),
            features.rejected.len()
        );

        Ok(features)
    }
}
