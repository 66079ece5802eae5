//! Indicator table handling
//!
//! The input table holds one row per (city, year, race stratum, sex stratum)
//! with one normalized column per category. Loading goes through polars;
//! every value is then parsed with the explicit functions in this module so
//! callers can see which rows were dropped and why.

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Datelike, NaiveDate};
use livability_math::{Category, CategoryValues};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Accepted names for the city column, in order of preference
pub const CITY_COLUMNS: [&str; 2] = ["geo_label_citystate", "City"];
/// Accepted names for the year column, in order of preference
pub const YEAR_COLUMNS: [&str; 2] = ["Year", "date_label"];
/// Race stratum column
pub const RACE_COLUMN: &str = "strata_race_label";
/// Sex stratum column
pub const SEX_COLUMN: &str = "strata_sex_label";

/// Race stratum label of the city-wide aggregate slice
pub const AGGREGATE_RACE: &str = "All";
/// Sex stratum label of the city-wide aggregate slice
pub const AGGREGATE_SEX: &str = "Both";

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];

/// One row of the indicator table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRecord {
    /// City identifier (city and state)
    #[serde(rename = "geo_label_citystate")]
    pub city: String,
    /// Calendar year
    #[serde(rename = "date_label")]
    pub year: i32,
    /// Race stratum label
    #[serde(rename = "strata_race_label")]
    pub race: String,
    /// Sex stratum label
    #[serde(rename = "strata_sex_label")]
    pub sex: String,
    /// Normalized category values
    #[serde(flatten)]
    pub values: CategoryValues,
}

impl IndicatorRecord {
    /// Create a record
    pub fn new(
        city: impl Into<String>,
        year: i32,
        race: impl Into<String>,
        sex: impl Into<String>,
        values: CategoryValues,
    ) -> Self {
        Self {
            city: city.into(),
            year,
            race: race.into(),
            sex: sex.into(),
            values,
        }
    }

    /// Create a city-wide aggregate record (race "All", sex "Both")
    pub fn aggregate(city: impl Into<String>, year: i32, values: CategoryValues) -> Self {
        Self::new(city, year, AGGREGATE_RACE, AGGREGATE_SEX, values)
    }

    /// True for the city-wide aggregate slice
    pub fn is_aggregate(&self) -> bool {
        self.race == AGGREGATE_RACE && self.sex == AGGREGATE_SEX
    }
}

/// Outcome of parsing a year label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearParse {
    /// The label was an integer year
    Integer(i32),
    /// The label was parsed as a date and the year extracted
    DateFallback(i32),
    /// Neither parse succeeded
    Failed,
}

impl YearParse {
    /// Parsed year, if any
    pub fn year(&self) -> Option<i32> {
        match self {
            YearParse::Integer(y) | YearParse::DateFallback(y) => Some(*y),
            YearParse::Failed => None,
        }
    }
}

/// Parse a year label: integer first, then common date formats
pub fn parse_year(raw: &str) -> YearParse {
    let trimmed = raw.trim();
    if let Ok(year) = trimmed.parse::<i32>() {
        return YearParse::Integer(year);
    }
    // Integer-valued floats ("2020.0") come from numeric columns with nulls
    if let Ok(value) = trimmed.parse::<f64>() {
        if value.fract() == 0.0 && value.abs() < i32::MAX as f64 {
            return YearParse::Integer(value as i32);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return YearParse::DateFallback(date.year());
        }
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(trimmed) {
        return YearParse::DateFallback(datetime.year());
    }

    YearParse::Failed
}

/// Outcome of coercing a cell to a number
#[derive(Debug, Clone, PartialEq)]
pub enum NumericParse {
    /// Finite number
    Value(f64),
    /// Empty or null cell
    Missing,
    /// Text that is not a finite number
    NonNumeric(String),
}

/// Coerce a raw cell to a finite number
pub fn coerce_numeric(raw: Option<&str>) -> NumericParse {
    match raw.map(str::trim) {
        None | Some("") => NumericParse::Missing,
        Some(text) if text.eq_ignore_ascii_case("nan") || text.eq_ignore_ascii_case("na") => {
            NumericParse::Missing
        }
        Some(text) => match text.parse::<f64>() {
            Ok(value) if value.is_finite() => NumericParse::Value(value),
            _ => NumericParse::NonNumeric(text.to_string()),
        },
    }
}

/// Why a row was dropped while loading
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowIssueKind {
    /// A required cell was empty
    Missing,
    /// A numeric cell could not be parsed
    NonNumeric { value: String },
    /// The year label could not be parsed
    UnparsableYear { value: String },
}

/// A dropped input row and the column responsible
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowIssue {
    /// Zero-based data row index
    pub row: usize,
    /// Column that failed
    pub column: String,
    /// What went wrong
    pub kind: RowIssueKind,
}

/// Parsed indicator table
#[derive(Debug, Clone, Default)]
pub struct IndicatorTable {
    records: Vec<IndicatorRecord>,
    issues: Vec<RowIssue>,
    year_fallbacks: usize,
}

impl IndicatorTable {
    /// Build a table from already-parsed records
    pub fn from_records(records: Vec<IndicatorRecord>) -> Self {
        Self {
            records,
            issues: Vec::new(),
            year_fallbacks: 0,
        }
    }

    /// All parsed records in input order
    pub fn records(&self) -> &[IndicatorRecord] {
        &self.records
    }

    /// Rows dropped during parsing
    pub fn issues(&self) -> &[RowIssue] {
        &self.issues
    }

    /// Number of rows whose year came from the date fallback
    pub fn year_fallbacks(&self) -> usize {
        self.year_fallbacks
    }

    /// Records of the city-wide aggregate slice
    pub fn aggregate_records(&self) -> impl Iterator<Item = &IndicatorRecord> {
        self.records.iter().filter(|r| r.is_aggregate())
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of parsed records
    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// Data loader for indicator tables
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load an indicator table from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<IndicatorTable> {
        let df = Self::read_csv(path)?;
        Self::from_dataframe(&df)
    }

    /// Read a CSV file into a DataFrame without interpreting it
    pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;
        Ok(df)
    }

    /// Parse an indicator table from an existing DataFrame.
    ///
    /// Fails fast when a required column is absent; individual bad rows are
    /// dropped and reported through [`IndicatorTable::issues`].
    pub fn from_dataframe(df: &DataFrame) -> Result<IndicatorTable> {
        let city_column = Self::detect_column(df, &CITY_COLUMNS)?;
        let year_column = Self::detect_column(df, &YEAR_COLUMNS)?;
        let race_column = Self::detect_column(df, &[RACE_COLUMN])?;
        let sex_column = Self::detect_column(df, &[SEX_COLUMN])?;

        let cities = text_column(df, &city_column)?;
        let years = text_column(df, &year_column)?;
        let races = text_column(df, &race_column)?;
        let sexes = text_column(df, &sex_column)?;

        let mut category_columns = Vec::with_capacity(Category::COUNT);
        for category in Category::ALL {
            let name = Self::detect_column(df, &[category.name()])?;
            category_columns.push((category, text_column(df, &name)?));
        }

        let mut table = IndicatorTable::default();

        'rows: for row in 0..df.height() {
            let mut keys: [String; 3] = Default::default();
            for (slot, (column, values)) in [
                (&city_column, &cities),
                (&race_column, &races),
                (&sex_column, &sexes),
            ]
            .into_iter()
            .enumerate()
            {
                match values[row].as_deref().map(str::trim) {
                    Some(text) if !text.is_empty() => keys[slot] = text.to_string(),
                    _ => {
                        table.issues.push(RowIssue {
                            row,
                            column: column.clone(),
                            kind: RowIssueKind::Missing,
                        });
                        continue 'rows;
                    }
                }
            }

            let year = match years[row].as_deref() {
                None => {
                    table.issues.push(RowIssue {
                        row,
                        column: year_column.clone(),
                        kind: RowIssueKind::Missing,
                    });
                    continue;
                }
                Some(raw) => match parse_year(raw) {
                    YearParse::Integer(year) => year,
                    YearParse::DateFallback(year) => {
                        table.year_fallbacks += 1;
                        year
                    }
                    YearParse::Failed => {
                        table.issues.push(RowIssue {
                            row,
                            column: year_column.clone(),
                            kind: RowIssueKind::UnparsableYear {
                                value: raw.to_string(),
                            },
                        });
                        continue;
                    }
                },
            };

            let mut values = CategoryValues::default();
            for (category, column) in &category_columns {
                match coerce_numeric(column[row].as_deref()) {
                    NumericParse::Value(value) => values[*category] = value,
                    NumericParse::Missing => {
                        table.issues.push(RowIssue {
                            row,
                            column: category.name().to_string(),
                            kind: RowIssueKind::Missing,
                        });
                        continue 'rows;
                    }
                    NumericParse::NonNumeric(value) => {
                        table.issues.push(RowIssue {
                            row,
                            column: category.name().to_string(),
                            kind: RowIssueKind::NonNumeric { value },
                        });
                        continue 'rows;
                    }
                }
            }

            let [city, race, sex] = keys;
            table
                .records
                .push(IndicatorRecord::new(city, year, race, sex, values));
        }

        if !table.issues.is_empty() {
            log::warn!(
                "Dropped {} of {} input rows while parsing the indicator table",
                table.issues.len(),
                df.height()
            );
        }
        if table.year_fallbacks > 0 {
            log::debug!("{} year labels parsed as dates", table.year_fallbacks);
        }

        Ok(table)
    }

    /// Find the first candidate column present in a DataFrame
    fn detect_column(df: &DataFrame, candidates: &[&str]) -> Result<String> {
        let column_names = df.get_column_names();

        for candidate in candidates {
            if column_names.iter().any(|name| name == candidate) {
                return Ok(candidate.to_string());
            }
        }

        Err(ForecastError::MissingColumn(candidates.join(" or ")))
    }
}

/// Read a column as optional strings, whatever its stored type
fn text_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = df.column(name)?.cast(&DataType::Utf8)?;
    let values = series
        .utf8()?
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect();
    Ok(values)
}
