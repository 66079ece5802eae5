//! Pipeline configuration loaded from TOML
//!
//! Every field is optional:
//!
//! ```toml
//! horizon = 5
//! weight_policy = "warn"
//!
//! [model]
//! interval_width = 0.8
//!
//! [general_weights]
//! Housing = 0.2
//! Transportation = 0.15
//! Environment = 0.15
//! Health = 0.2
//! Neighborhood = 0.1
//! Engagement = 0.1
//! Opportunity = 0.1
//! ```

use crate::error::{ForecastError, Result};
use crate::features::FeatureBuilder;
use crate::models::additive::{AdditiveConfig, AdditiveRegression};
use crate::pipeline::{CityForecaster, ForecastPipeline, DEFAULT_HORIZON};
use crate::scoring::{GeneralScorer, WeightPolicy};
use livability_math::WeightMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings for feature building, forecasting and scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Weights for the composite score that is forecast
    pub forecasting_weights: WeightMap,
    /// Default weights for the general score
    pub general_weights: WeightMap,
    /// Years to forecast per city
    pub horizon: usize,
    /// Model hyperparameters
    pub model: AdditiveConfig,
    /// Handling of invalid caller-supplied weights
    pub weight_policy: WeightPolicy,
    /// Constant added to every general score
    pub score_offset: f64,
    /// Size of the fitting thread pool; 0 uses the rayon default
    pub worker_threads: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            forecasting_weights: WeightMap::forecasting(),
            general_weights: WeightMap::general(),
            horizon: DEFAULT_HORIZON,
            model: AdditiveConfig::default(),
            weight_policy: WeightPolicy::Warn,
            score_offset: 0.0,
            worker_threads: 0,
        }
    }
}

impl PipelineConfig {
    /// Parse a TOML document and validate it
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::de::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML file and validate it
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check field ranges
    pub fn validate(&self) -> Result<()> {
        if self.horizon == 0 {
            return Err(ForecastError::ConfigError(
                "horizon must be greater than 0".to_string(),
            ));
        }
        if !self.score_offset.is_finite() {
            return Err(ForecastError::ConfigError(
                "score_offset must be finite".to_string(),
            ));
        }
        self.model.validate()
    }

    /// Feature builder using the forecasting weights
    pub fn feature_builder(&self) -> FeatureBuilder {
        FeatureBuilder::new(self.forecasting_weights)
    }

    /// Forecaster for `horizon` years, or the configured horizon
    pub fn forecaster(&self, horizon: Option<usize>) -> Result<CityForecaster<AdditiveRegression>> {
        CityForecaster::additive(self.model.clone(), horizon.unwrap_or(self.horizon))
    }

    /// Full forecasting pipeline
    pub fn pipeline(&self, horizon: Option<usize>) -> Result<ForecastPipeline<AdditiveRegression>> {
        Ok(ForecastPipeline::new(
            self.feature_builder(),
            self.forecaster(horizon)?,
            self.worker_threads,
        ))
    }

    /// General scorer using the default weights, policy and offset
    pub fn scorer(&self) -> GeneralScorer {
        GeneralScorer::new(self.general_weights, self.weight_policy, self.score_offset)
    }
}
