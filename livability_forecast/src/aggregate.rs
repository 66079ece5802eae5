//! Flattening per-city forecasts into one record stream

use crate::pipeline::ForecastResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One forecasted (city, year) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    #[serde(rename = "geo_label_citystate")]
    pub city: String,
    pub year: i32,
    pub forecast: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// Column-oriented forecast of one city, as served to clients
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CityForecastColumns {
    pub years: Vec<i32>,
    pub forecast: Vec<f64>,
    pub lower_bound: Vec<f64>,
    pub upper_bound: Vec<f64>,
}

/// Concatenate forecasts city by city, each city in chronological order
pub fn combine(forecasts: &BTreeMap<String, ForecastResult>) -> Vec<ForecastRecord> {
    forecasts
        .values()
        .flat_map(|result| {
            result.points().iter().map(move |point| ForecastRecord {
                city: result.city().to_string(),
                year: point.year,
                forecast: point.forecast,
                lower_bound: point.lower_bound,
                upper_bound: point.upper_bound,
            })
        })
        .collect()
}

/// Per-city column layout keyed by city
pub fn by_city(
    forecasts: &BTreeMap<String, ForecastResult>,
) -> BTreeMap<String, CityForecastColumns> {
    forecasts
        .iter()
        .map(|(city, result)| {
            let mut columns = CityForecastColumns::default();
            for point in result.points() {
                columns.years.push(point.year);
                columns.forecast.push(point.forecast);
                columns.lower_bound.push(point.lower_bound);
                columns.upper_bound.push(point.upper_bound);
            }
            (city.clone(), columns)
        })
        .collect()
}
