//! # Livability
//!
//! Single import point for the livability workspace: the scoring math from
//! `livability_math` and the forecasting pipeline from `livability_forecast`.
//!
//! ## Example
//!
//! ```
//! use livability_workspace::{Category, CategoryValues, WeightMap};
//!
//! let values = CategoryValues::from_fn(|c| if c == Category::Housing { 0.8 } else { 0.3 });
//! let score = WeightMap::single(Category::Housing).composite(&values);
//! assert_eq!(score, 0.8);
//! ```

pub use livability_forecast as forecast;
pub use livability_math as math;

pub use livability_forecast::{
    CityFailure, CityForecaster, DataLoader, ForecastError, ForecastReport, ForecastResult,
    GeneralScorer, IndicatorRecord, IndicatorTable, LivabilityService, PipelineConfig,
    ScoreReport,
};
pub use livability_math::{Category, CategoryValues, WeightIssue, WeightMap};
