//! Sub-indicator to category aggregation
//!
//! Scaled source tables carry dozens of indicator columns in `[0, 1]`. Each
//! category is the mean of its indicators, with "lower is better" indicators
//! inverted (`1 - v`) first so every category reads "higher is better".

use crate::data::{CITY_COLUMNS, RACE_COLUMN, SEX_COLUMN, YEAR_COLUMNS};
use crate::error::{ForecastError, Result};
use livability_math::Category;
use polars::prelude::*;

/// One source indicator feeding a category
#[derive(Debug, Clone, PartialEq)]
pub struct Indicator {
    /// Column name in the scaled source table
    pub column: String,
    /// Replace `v` with `1 - v` before averaging
    pub invert: bool,
}

/// Indicators making up one category
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryDefinition {
    pub category: Category,
    pub indicators: Vec<Indicator>,
}

impl CategoryDefinition {
    /// Build a definition from `(column, invert)` pairs
    pub fn new(category: Category, indicators: &[(&str, bool)]) -> Self {
        Self {
            category,
            indicators: indicators
                .iter()
                .map(|(column, invert)| Indicator {
                    column: column.to_string(),
                    invert: *invert,
                })
                .collect(),
        }
    }

    /// Mean of the present (possibly inverted) indicator values
    pub fn combine(&self, values: &[Option<f64>]) -> Option<f64> {
        let present: Vec<f64> = self
            .indicators
            .iter()
            .zip(values.iter())
            .filter_map(|(indicator, value)| {
                value.map(|v| if indicator.invert { 1.0 - v } else { v })
            })
            .collect();

        if present.is_empty() {
            None
        } else {
            Some(present.iter().sum::<f64>() / present.len() as f64)
        }
    }
}

/// Full mapping from source indicators to the seven categories
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryDefinitions {
    definitions: Vec<CategoryDefinition>,
}

impl Default for CategoryDefinitions {
    fn default() -> Self {
        Self::big_cities_health()
    }
}

impl CategoryDefinitions {
    /// Create from explicit definitions, one per category
    pub fn new(definitions: Vec<CategoryDefinition>) -> Result<Self> {
        for category in Category::ALL {
            let count = definitions.iter().filter(|d| d.category == category).count();
            if count != 1 {
                return Err(ForecastError::InvalidParameter(format!(
                    "Expected exactly one definition for {}, found {}",
                    category, count
                )));
            }
        }
        if let Some(empty) = definitions.iter().find(|d| d.indicators.is_empty()) {
            return Err(ForecastError::InvalidParameter(format!(
                "Category {} has no indicators",
                empty.category
            )));
        }
        Ok(Self { definitions })
    }

    /// Mapping for the Big Cities Health indicator set
    pub fn big_cities_health() -> Self {
        let definitions = vec![
            CategoryDefinition::new(
                Category::Housing,
                &[
                    ("Vacant.Housing.Units", true),
                    ("Single.Parent.Families", true),
                    ("Owner.Occupied.Housing", false),
                    ("Renters.vs..Owners", true),
                    ("Housing.Lead.Risk", true),
                ],
            ),
            CategoryDefinition::new(
                Category::Transportation,
                &[
                    ("Drives.Alone.to.Work", true),
                    ("Walking.to.Work", false),
                    ("Riding.Bike.to.Work", false),
                    ("Public.Transportation.Use", false),
                    ("Lack.of.Car", false),
                ],
            ),
            CategoryDefinition::new(
                Category::Environment,
                &[
                    ("Climate.related..Disasters", true),
                    ("Community.Social.Vulnerability.to.Climate.Disasters", true),
                ],
            ),
            CategoryDefinition::new(
                Category::Health,
                &[
                    ("Adult.Binge.Drinking", true),
                    ("Adult.Mental.Distress", true),
                    ("Adult.Obesity", true),
                    ("Adult.Physical.Inactivity", true),
                    ("Adult.Smoking", true),
                    ("All.Cancer.Deaths", true),
                    ("Breast.Cancer.Deaths", true),
                    ("Cardiovascular.Disease.Deaths", true),
                    ("Colorectal.Cancer.Deaths", true),
                    ("Diabetes", true),
                    ("Diabetes.Deaths", true),
                    ("Drug.Overdose.Deaths", true),
                    ("Flu.Vaccinations..Medicare", false),
                    ("Gun.Deaths..Firearms.", true),
                    ("HIV.Related.Deaths", true),
                    ("Heart.Disease.Deaths", true),
                    ("High.Blood.Pressure", true),
                    ("Homicides", true),
                    ("Injury.Deaths", true),
                    ("Lung.Cancer.Deaths", true),
                    ("Motor.Vehicle.Deaths", true),
                    ("New.Tuberculosis.Cases", true),
                    ("Pneumonia.or.Influenza.Deaths", true),
                    ("Prostate.Cancer.Deaths", true),
                    ("Suicide", true),
                    ("Syphilis..Newborns", true),
                    ("Teen.Births", true),
                ],
            ),
            CategoryDefinition::new(
                Category::Neighborhood,
                &[
                    ("Minority.Population", false),
                    ("Service.Workers", false),
                    ("Public.Assistance", false),
                    ("Poverty.in.All.Ages", true),
                    ("Poverty.in.Children", true),
                    ("Poverty.and.Near.Poverty.in.All.Ages", true),
                ],
            ),
            CategoryDefinition::new(
                Category::Engagement,
                &[
                    ("Preschool.Enrollment", false),
                    ("College.Graduates", false),
                    ("Foreign.Born.Population", false),
                ],
            ),
            CategoryDefinition::new(
                Category::Opportunity,
                &[
                    ("Household.Income.Inequality", true),
                    ("Households.with.Higher.Incomes", false),
                    ("Income.Inequality", true),
                    ("Per.capita.Household.Income", false),
                    ("Unemployment", true),
                ],
            ),
        ];
        Self { definitions }
    }

    /// Definition of a single category
    pub fn get(&self, category: Category) -> Option<&CategoryDefinition> {
        self.definitions.iter().find(|d| d.category == category)
    }

    /// Collapse a scaled indicator DataFrame into category columns.
    ///
    /// The result holds the key columns (city, year, strata) copied from the
    /// input followed by one `Float64` column per category. Every indicator
    /// column must be present; non-numeric cells count as missing.
    pub fn apply(&self, df: &DataFrame) -> Result<DataFrame> {
        let column_names = df.get_column_names();
        let mut columns: Vec<Series> = Vec::new();

        let key_columns: [&[&str]; 4] = [&CITY_COLUMNS, &YEAR_COLUMNS, &[RACE_COLUMN], &[SEX_COLUMN]];
        for candidates in key_columns {
            let name = candidates
                .iter()
                .find(|c| column_names.contains(*c))
                .ok_or_else(|| ForecastError::MissingColumn(candidates.join(" or ")))?;
            columns.push(df.column(name)?.clone());
        }

        for definition in &self.definitions {
            let mut indicator_values = Vec::with_capacity(definition.indicators.len());
            for indicator in &definition.indicators {
                if !column_names.contains(&indicator.column.as_str()) {
                    return Err(ForecastError::MissingColumn(indicator.column.clone()));
                }
                let series = df.column(&indicator.column)?.cast(&DataType::Float64)?;
                let values: Vec<Option<f64>> = series.f64()?.into_iter().collect();
                indicator_values.push(values);
            }

            let combined: Vec<Option<f64>> = (0..df.height())
                .map(|row| {
                    let row_values: Vec<Option<f64>> =
                        indicator_values.iter().map(|col| col[row]).collect();
                    definition.combine(&row_values)
                })
                .collect();

            columns.push(Series::new(definition.category.name(), combined));
        }

        Ok(DataFrame::new(columns)?)
    }
}
