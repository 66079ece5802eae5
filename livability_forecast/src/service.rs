//! Operations offered to a serving layer

use crate::aggregate::{by_city, combine, CityForecastColumns, ForecastRecord};
use crate::config::PipelineConfig;
use crate::data::{DataLoader, IndicatorRecord, IndicatorTable};
use crate::error::Result;
use crate::pipeline::ForecastReport;
use crate::scoring::{top_city, CityScore, ScoreReport};
use livability_math::WeightMap;
use std::collections::BTreeMap;
use std::path::Path;

/// Forecast output in the shapes clients consume
#[derive(Debug)]
pub struct ServiceForecast {
    pub report: ForecastReport,
    pub records: Vec<ForecastRecord>,
}

impl ServiceForecast {
    /// Column layout keyed by city
    pub fn by_city(&self) -> BTreeMap<String, CityForecastColumns> {
        by_city(&self.report.forecasts)
    }
}

/// Holds a loaded indicator table and answers scoring and forecast requests
#[derive(Debug, Clone)]
pub struct LivabilityService {
    table: IndicatorTable,
    config: PipelineConfig,
}

impl LivabilityService {
    /// Create a service over an already-parsed table
    pub fn new(table: IndicatorTable, config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { table, config })
    }

    /// Load the table from CSV
    pub fn from_csv<P: AsRef<Path>>(path: P, config: PipelineConfig) -> Result<Self> {
        Self::new(DataLoader::from_csv(path)?, config)
    }

    /// Configuration in use
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Indicator records as loaded
    pub fn precomputed_scores(&self) -> &[IndicatorRecord] {
        self.table.records()
    }

    /// General scores under `weights`, or the configured defaults
    pub fn compute_scores(&self, weights: Option<&WeightMap>) -> Result<ScoreReport> {
        self.config.scorer().score(self.table.records(), weights)
    }

    /// Forecast every city for `horizon` years, or the configured horizon
    pub fn forecast(&self, horizon: Option<usize>) -> Result<ServiceForecast> {
        let report = self.config.pipeline(horizon)?.run(&self.table)?;
        let records = combine(&report.forecasts);
        Ok(ServiceForecast { report, records })
    }

    /// Best city in `year` under the default general weights
    pub fn top_city(&self, year: i32) -> Result<Option<CityScore>> {
        let report = self.compute_scores(None)?;
        Ok(top_city(&report.scores, year).cloned())
    }
}
