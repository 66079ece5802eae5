//! General livability score per (city, year)
//!
//! Unlike forecasting, scoring averages every stratum row of a city-year, not
//! just the city-wide aggregate slice.

use crate::data::IndicatorRecord;
use crate::error::{ForecastError, Result};
use livability_math::{WeightIssue, WeightMap};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What to do with caller-supplied weights that fail validation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightPolicy {
    /// Log and report the issues, score anyway
    #[default]
    Warn,
    /// Fail with [`ForecastError::InvalidWeights`]
    Reject,
}

/// Average general score of one city in one year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityScore {
    #[serde(rename = "geo_label_citystate")]
    pub city: String,
    #[serde(rename = "date_label")]
    pub year: i32,
    #[serde(rename = "Average_General_Score")]
    pub average_general_score: f64,
}

/// Scores plus any weight validation warnings
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreReport {
    pub scores: Vec<CityScore>,
    pub warnings: Vec<WeightIssue>,
}

/// Computes general scores from indicator records
#[derive(Debug, Clone)]
pub struct GeneralScorer {
    defaults: WeightMap,
    policy: WeightPolicy,
    offset: f64,
}

impl Default for GeneralScorer {
    fn default() -> Self {
        Self::new(WeightMap::general(), WeightPolicy::Warn, 0.0)
    }
}

impl GeneralScorer {
    /// Create a scorer.
    ///
    /// `defaults` apply when no weights are supplied and are not validated;
    /// `offset` is added to every average.
    pub fn new(defaults: WeightMap, policy: WeightPolicy, offset: f64) -> Self {
        Self {
            defaults,
            policy,
            offset,
        }
    }

    /// Score every (city, year) pair, ordered by city then year.
    ///
    /// Rows with non-finite category values are left out of the average; a
    /// pair without any usable row is omitted.
    pub fn score(
        &self,
        records: &[IndicatorRecord],
        weights: Option<&WeightMap>,
    ) -> Result<ScoreReport> {
        let mut warnings = Vec::new();
        let weights = match weights {
            Some(custom) => {
                let issues = custom.validate();
                if !issues.is_empty() {
                    match self.policy {
                        WeightPolicy::Reject => return Err(ForecastError::InvalidWeights(issues)),
                        WeightPolicy::Warn => {
                            for issue in &issues {
                                log::warn!("Weight validation: {}", issue);
                            }
                            warnings = issues;
                        }
                    }
                }
                custom
            }
            None => &self.defaults,
        };

        let mut groups: BTreeMap<(&str, i32), (f64, usize)> = BTreeMap::new();
        let mut skipped = 0usize;
        for record in records {
            let entry = groups.entry((record.city.as_str(), record.year)).or_default();
            if !record.values.is_finite() {
                skipped += 1;
                continue;
            }
            entry.0 += weights.composite(&record.values);
            entry.1 += 1;
        }
        if skipped > 0 {
            log::warn!("Skipped {} incomplete rows while scoring", skipped);
        }

        let scores = groups
            .into_iter()
            .filter_map(|((city, year), (total, count))| {
                if count == 0 {
                    log::warn!("No complete rows for {} in {}", city, year);
                    return None;
                }
                Some(CityScore {
                    city: city.to_string(),
                    year,
                    average_general_score: total / count as f64 + self.offset,
                })
            })
            .collect();

        Ok(ScoreReport { scores, warnings })
    }
}

/// Highest-scoring city in `year`; ties go to the earlier entry
pub fn top_city(scores: &[CityScore], year: i32) -> Option<&CityScore> {
    scores
        .iter()
        .filter(|s| s.year == year && s.average_general_score.is_finite())
        .fold(None, |best: Option<&CityScore>, candidate| match best {
            Some(current) if current.average_general_score >= candidate.average_general_score => {
                Some(current)
            }
            _ => Some(candidate),
        })
}
