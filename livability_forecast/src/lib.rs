//! # Livability Forecast
//!
//! Per-city livability scoring and multi-year forecasting.
//!
//! ## Features
//!
//! - Indicator table loading (CSV through polars) with per-row issue reporting
//! - Sub-indicator to category aggregation
//! - Composite score and year-over-year delta features per city
//! - One additive trend-plus-regressors model per city, fitted in parallel
//! - Forecasts with uncertainty intervals, flattened into one record stream
//! - General scores per (city, year) with optional caller-supplied weights
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use livability_forecast::{DataLoader, PipelineConfig, aggregate};
//!
//! let table = DataLoader::from_csv("indicators.csv")?;
//! let config = PipelineConfig::default();
//!
//! let report = config.pipeline(None)?.run(&table)?;
//! for record in aggregate::combine(&report.forecasts) {
//!     println!("{} {} {:.3}", record.city, record.year, record.forecast);
//! }
//! for failure in &report.failures {
//!     eprintln!("{}", failure);
//! }
//!
//! let scores = config.scorer().score(table.records(), None)?;
//! # Ok::<(), livability_forecast::ForecastError>(())
//! ```

pub mod aggregate;
pub mod categorize;
pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod features;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod scoring;
pub mod service;

// Re-export commonly used types
pub use crate::aggregate::ForecastRecord;
pub use crate::config::PipelineConfig;
pub use crate::data::{DataLoader, IndicatorRecord, IndicatorTable};
pub use crate::error::{CityFailure, ForecastError, Result};
pub use crate::features::{CitySeries, FeatureBuilder, FeatureSet};
pub use crate::models::{ForecastModel, TrainedForecastModel};
pub use crate::pipeline::{CityForecaster, ForecastPipeline, ForecastReport, ForecastResult};
pub use crate::scoring::{CityScore, GeneralScorer, ScoreReport, WeightPolicy};
pub use crate::service::LivabilityService;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
