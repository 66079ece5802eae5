//! Weight maps and composite scores
//!
//! Two fixed weight maps exist and are deliberately kept separate:
//!
//! - [`WeightMap::forecasting`] feeds the composite score that the forecasting
//!   model learns. Its weights sum to 1.00 by construction of the literals but
//!   are never renormalized.
//! - [`WeightMap::general`] is the default for general scoring and can be
//!   replaced by caller-supplied weights.

use crate::categories::{Category, CategoryValues};
use crate::{MathError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Allowed deviation of a weight sum from 1.0
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Mapping from category to weight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightMap {
    weights: CategoryValues,
}

/// Problem found while validating caller-supplied weights
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WeightIssue {
    /// A single weight outside `[0, 1]`
    OutOfRange { category: Category, weight: f64 },
    /// Weights do not sum to 1 within [`WEIGHT_SUM_TOLERANCE`]
    SumMismatch { sum: f64 },
}

impl fmt::Display for WeightIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeightIssue::OutOfRange { category, weight } => {
                write!(f, "weight for {} is {}, expected a value in [0, 1]", category, weight)
            }
            WeightIssue::SumMismatch { sum } => {
                write!(f, "weights sum to {}, not 1", sum)
            }
        }
    }
}

impl WeightMap {
    /// Weights used for the composite score that is forecast
    pub fn forecasting() -> Self {
        Self::new(CategoryValues {
            housing: 0.12,
            transportation: 0.16,
            environment: 0.13,
            health: 0.19,
            neighborhood: 0.15,
            engagement: 0.12,
            opportunity: 0.13,
        })
    }

    /// Default weights for the general score
    pub fn general() -> Self {
        Self::new(CategoryValues {
            housing: 0.2,
            transportation: 0.15,
            environment: 0.15,
            health: 0.2,
            neighborhood: 0.1,
            engagement: 0.1,
            opportunity: 0.1,
        })
    }

    /// Wrap per-category weights
    pub fn new(weights: CategoryValues) -> Self {
        Self { weights }
    }

    /// Single category with weight 1, all others 0
    pub fn single(category: Category) -> Self {
        Self::new(CategoryValues::from_fn(|c| if c == category { 1.0 } else { 0.0 }))
    }

    /// Build a weight map from `(name, weight)` pairs.
    ///
    /// Every category must be present exactly once; unknown names are rejected.
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut seen = [false; Category::COUNT];
        let mut weights = CategoryValues::default();

        for (name, weight) in pairs {
            let category: Category = name.parse()?;
            let slot = category.position();
            if seen[slot] {
                return Err(MathError::InvalidInput(format!(
                    "Weight for {} given more than once",
                    category
                )));
            }
            seen[slot] = true;
            weights[category] = weight;
        }

        let missing: Vec<&str> = Category::ALL
            .iter()
            .zip(seen.iter())
            .filter(|(_, present)| !**present)
            .map(|(c, _)| c.name())
            .collect();
        if !missing.is_empty() {
            return Err(MathError::InvalidInput(format!(
                "Missing weights for: {}",
                missing.join(", ")
            )));
        }

        Ok(Self::new(weights))
    }

    /// Weight of a single category
    pub fn weight(&self, category: Category) -> f64 {
        self.weights[category]
    }

    /// All weights
    pub fn values(&self) -> &CategoryValues {
        &self.weights
    }

    /// Sum of all weights
    pub fn sum(&self) -> f64 {
        self.weights.iter().map(|(_, w)| w).sum()
    }

    /// Weighted sum of category values
    pub fn composite(&self, values: &CategoryValues) -> f64 {
        Category::ALL
            .iter()
            .map(|&c| values[c] * self.weights[c])
            .sum()
    }

    /// Check each weight lies in `[0, 1]` and that they sum to 1
    pub fn validate(&self) -> Vec<WeightIssue> {
        let mut issues: Vec<WeightIssue> = self
            .weights
            .iter()
            .filter(|(_, w)| !(0.0..=1.0).contains(w))
            .map(|(category, weight)| WeightIssue::OutOfRange { category, weight })
            .collect();

        let sum = self.sum();
        if (sum - 1.0).abs() >= WEIGHT_SUM_TOLERANCE || !sum.is_finite() {
            issues.push(WeightIssue::SumMismatch { sum });
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_values() -> CategoryValues {
        CategoryValues::from_array([0.8, 0.3, 0.6, 0.9, 0.1, 0.4, 0.7])
    }

    #[test]
    fn test_forecasting_weights_sum() {
        assert_relative_eq!(WeightMap::forecasting().sum(), 1.0, epsilon = 1e-9);
        assert_eq!(WeightMap::forecasting().weight(Category::Health), 0.19);
    }

    #[test]
    fn test_general_weights_differ_from_forecasting() {
        assert_ne!(WeightMap::general(), WeightMap::forecasting());
        assert_eq!(WeightMap::general().weight(Category::Housing), 0.2);
        assert!(WeightMap::general().validate().is_empty());
    }

    #[test]
    fn test_single_category_weight_isolates_value() {
        let weights = WeightMap::single(Category::Housing);
        let mut values = sample_values();
        assert_eq!(weights.composite(&values), 0.8);

        values[Category::Health] = 0.0;
        values[Category::Opportunity] = 1.0;
        assert_eq!(weights.composite(&values), 0.8);
    }

    #[test]
    fn test_composite_is_linear() {
        let weights = WeightMap::forecasting();
        let values = sample_values();
        let base = weights.composite(&values);

        for k in [0.0, 0.5, 2.0, 3.7] {
            assert_relative_eq!(weights.composite(&values.scale(k)), k * base, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_validate_sum_mismatch() {
        let weights = WeightMap::new(CategoryValues::splat(0.5 / 7.0));
        let issues = weights.validate();
        assert_eq!(issues.len(), 1);
        assert!(matches!(issues[0], WeightIssue::SumMismatch { sum } if (sum - 0.5).abs() < 1e-9));
    }

    #[test]
    fn test_validate_out_of_range() {
        let mut values = CategoryValues::splat(0.0);
        values[Category::Housing] = 1.5;
        values[Category::Health] = -0.5;
        let issues = WeightMap::new(values).validate();

        assert!(issues.contains(&WeightIssue::OutOfRange {
            category: Category::Housing,
            weight: 1.5
        }));
        assert!(issues.contains(&WeightIssue::OutOfRange {
            category: Category::Health,
            weight: -0.5
        }));
        // 1.5 - 0.5 sums to 1, so no sum issue
        assert_eq!(issues.len(), 2);
    }

    #[test]
    fn test_from_pairs() {
        let pairs = [
            ("Housing", 0.2),
            ("Transportation", 0.15),
            ("Environment", 0.15),
            ("Health", 0.2),
            ("Neighborhood", 0.1),
            ("Engagement", 0.1),
            ("Opportunity", 0.1),
        ];
        assert_eq!(WeightMap::from_pairs(pairs).unwrap(), WeightMap::general());
    }

    #[test]
    fn test_from_pairs_rejects_missing_and_unknown() {
        let missing = WeightMap::from_pairs([("Housing", 1.0)]);
        assert!(matches!(missing, Err(MathError::InvalidInput(msg)) if msg.contains("Health")));

        let unknown = WeightMap::from_pairs([("Crime", 1.0)]);
        assert!(matches!(unknown, Err(MathError::UnknownCategory(_))));

        let duplicate = WeightMap::from_pairs([("Housing", 0.5), ("housing", 0.5)]);
        assert!(duplicate.is_err());
    }
}
