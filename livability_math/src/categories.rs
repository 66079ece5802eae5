//! The fixed set of livability categories and per-category values
//!
//! Every indicator table row carries one normalized value per category.
//! Values are expected in `[0, 1]` with "higher is better" polarity, but the
//! range is not enforced here.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

/// One of the seven livability categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Housing,
    Transportation,
    Environment,
    Health,
    Neighborhood,
    Engagement,
    Opportunity,
}

impl Category {
    /// All categories in canonical column order
    pub const ALL: [Category; 7] = [
        Category::Housing,
        Category::Transportation,
        Category::Environment,
        Category::Health,
        Category::Neighborhood,
        Category::Engagement,
        Category::Opportunity,
    ];

    /// Number of categories
    pub const COUNT: usize = 7;

    /// Column name of the category in indicator tables
    pub fn name(&self) -> &'static str {
        match self {
            Category::Housing => "Housing",
            Category::Transportation => "Transportation",
            Category::Environment => "Environment",
            Category::Health => "Health",
            Category::Neighborhood => "Neighborhood",
            Category::Engagement => "Engagement",
            Category::Opportunity => "Opportunity",
        }
    }

    /// Name of the year-over-year delta regressor for this category
    pub fn delta_name(&self) -> String {
        format!("{}_delta", self.name())
    }

    pub(crate) fn position(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = MathError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| MathError::UnknownCategory(trimmed.to_string()))
    }
}

/// One value per category
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CategoryValues {
    pub housing: f64,
    pub transportation: f64,
    pub environment: f64,
    pub health: f64,
    pub neighborhood: f64,
    pub engagement: f64,
    pub opportunity: f64,
}

impl CategoryValues {
    /// Build values by evaluating `f` for each category
    pub fn from_fn<F: FnMut(Category) -> f64>(mut f: F) -> Self {
        let mut values = Self::default();
        for category in Category::ALL {
            values[category] = f(category);
        }
        values
    }

    /// Same value for every category
    pub fn splat(value: f64) -> Self {
        Self::from_fn(|_| value)
    }

    /// Build values from an array in canonical category order
    pub fn from_array(values: [f64; Category::COUNT]) -> Self {
        Self::from_fn(|c| values[c.position()])
    }

    /// Values as an array in canonical category order
    pub fn to_array(&self) -> [f64; Category::COUNT] {
        let mut out = [0.0; Category::COUNT];
        for category in Category::ALL {
            out[category.position()] = self[category];
        }
        out
    }

    /// Iterate `(category, value)` pairs in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (Category, f64)> + '_ {
        Category::ALL.iter().map(move |&c| (c, self[c]))
    }

    /// Multiply every value by `factor`
    pub fn scale(&self, factor: f64) -> Self {
        Self::from_fn(|c| self[c] * factor)
    }

    /// Element-wise difference `self - previous`
    pub fn delta_from(&self, previous: &CategoryValues) -> Self {
        Self::from_fn(|c| self[c] - previous[c])
    }

    /// True when every value is finite
    pub fn is_finite(&self) -> bool {
        self.iter().all(|(_, v)| v.is_finite())
    }

    /// Categories whose value falls outside `[0, 1]`
    pub fn out_of_unit_range(&self) -> Vec<Category> {
        self.iter()
            .filter(|(_, v)| !(0.0..=1.0).contains(v))
            .map(|(c, _)| c)
            .collect()
    }
}

impl Index<Category> for CategoryValues {
    type Output = f64;

    fn index(&self, category: Category) -> &f64 {
        match category {
            Category::Housing => &self.housing,
            Category::Transportation => &self.transportation,
            Category::Environment => &self.environment,
            Category::Health => &self.health,
            Category::Neighborhood => &self.neighborhood,
            Category::Engagement => &self.engagement,
            Category::Opportunity => &self.opportunity,
        }
    }
}

impl IndexMut<Category> for CategoryValues {
    fn index_mut(&mut self, category: Category) -> &mut f64 {
        match category {
            Category::Housing => &mut self.housing,
            Category::Transportation => &mut self.transportation,
            Category::Environment => &mut self.environment,
            Category::Health => &mut self.health,
            Category::Neighborhood => &mut self.neighborhood,
            Category::Engagement => &mut self.engagement,
            Category::Opportunity => &mut self.opportunity,
        }
    }
}
