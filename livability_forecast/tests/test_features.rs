use approx::assert_relative_eq;
use livability_forecast::data::IndicatorRecord;
use livability_forecast::features::{CitySeries, FeatureBuilder};
use livability_forecast::ForecastError;
use livability_math::{Category, CategoryValues, WeightMap};
use pretty_assertions::assert_eq;

fn springfield() -> Vec<IndicatorRecord> {
    (2020..=2024)
        .map(|year| {
            let value = 0.1 + 0.2 * (year - 2020) as f64;
            IndicatorRecord::aggregate("Springfield", year, CategoryValues::splat(value))
        })
        .collect()
}

#[test]
fn test_builds_rising_series() {
    let features = FeatureBuilder::default()
        .build_from_records(&springfield())
        .unwrap();

    let series = features.get("Springfield").unwrap();
    assert_eq!(series.len(), 5);
    assert_eq!(series.last_year(), Some(2024));

    let scores: Vec<f64> = series.observations().iter().map(|o| o.score).collect();
    assert!(scores.windows(2).all(|pair| pair[1] > pair[0]));

    // The first year carries no delta and is not used for fitting
    assert!(series.observations()[0].deltas.is_none());
    assert_eq!(series.training_len(), 4);
    let delta = series.observations()[1].deltas.unwrap();
    assert_relative_eq!(delta[Category::Health], 0.2, epsilon = 1e-12);
}

#[test]
fn test_two_rows_yield_one_training_row() {
    let records = vec![
        IndicatorRecord::aggregate("Capital City", 2021, CategoryValues::splat(0.4)),
        IndicatorRecord::aggregate("Capital City", 2020, CategoryValues::splat(0.3)),
    ];
    let features = FeatureBuilder::default().build_from_records(&records).unwrap();
    let series = features.get("Capital City").unwrap();

    assert_eq!(series.training_len(), 1);
    assert_eq!(series.observations()[0].year, 2020);
}

#[test]
fn test_only_aggregate_slice_is_used() {
    let mut records = springfield();
    records.push(IndicatorRecord::new(
        "Springfield",
        2025,
        "Hispanic",
        "Both",
        CategoryValues::splat(0.0),
    ));
    records.push(IndicatorRecord::new(
        "Shelbyville",
        2020,
        "All",
        "Male",
        CategoryValues::splat(0.0),
    ));

    let features = FeatureBuilder::default().build_from_records(&records).unwrap();

    assert_eq!(features.series().len(), 1);
    assert_eq!(features.get("Springfield").unwrap().last_year(), Some(2024));
    assert!(features.get("Shelbyville").is_none());
}

#[test]
fn test_no_aggregate_rows_is_fatal() {
    let records = vec![IndicatorRecord::new(
        "Springfield",
        2020,
        "White",
        "Female",
        CategoryValues::splat(0.5),
    )];
    let result = FeatureBuilder::default().build_from_records(&records);
    assert!(matches!(result, Err(ForecastError::NoAggregateRows)));
}

#[test]
fn test_duplicate_year_rejects_only_that_city() {
    let mut records = springfield();
    records.push(IndicatorRecord::aggregate(
        "North Haverbrook",
        2020,
        CategoryValues::splat(0.2),
    ));
    records.push(IndicatorRecord::aggregate(
        "North Haverbrook",
        2020,
        CategoryValues::splat(0.3),
    ));

    let features = FeatureBuilder::default().build_from_records(&records).unwrap();

    assert!(features.get("Springfield").is_some());
    assert_eq!(features.rejected().len(), 1);
    let failure = &features.rejected()[0];
    assert_eq!(failure.city, "North Haverbrook");
    assert_eq!(failure.reason(), "duplicate year");
}

#[test]
fn test_deltas_use_sorted_adjacency_across_gaps() {
    let rows = vec![
        (2022, CategoryValues::splat(0.7)),
        (2018, CategoryValues::splat(0.2)),
        (2019, CategoryValues::splat(0.3)),
    ];
    let series = CitySeries::new("Brockway", rows, &WeightMap::forecasting()).unwrap();

    let years: Vec<i32> = series.observations().iter().map(|o| o.year).collect();
    assert_eq!(years, vec![2018, 2019, 2022]);

    let delta = series.observations()[2].deltas.unwrap();
    assert_relative_eq!(delta[Category::Housing], 0.4, epsilon = 1e-12);
}

#[test]
fn test_composite_score_is_linear() {
    let weights = WeightMap::forecasting();
    let values = CategoryValues::from_array([0.3, 0.9, 0.1, 0.5, 0.7, 0.2, 0.6]);
    let k = 2.5;

    assert_relative_eq!(
        weights.composite(&values.scale(k)),
        k * weights.composite(&values),
        epsilon = 1e-12
    );
}

#[test]
fn test_custom_weights_drive_score() {
    let builder = FeatureBuilder::new(WeightMap::single(Category::Housing));
    let records = vec![IndicatorRecord::aggregate(
        "Springfield",
        2020,
        CategoryValues::from_array([0.8, 0.1, 0.9, 0.3, 0.4, 0.2, 0.6]),
    )];
    let features = builder.build_from_records(&records).unwrap();

    assert_eq!(
        features.get("Springfield").unwrap().observations()[0].score,
        0.8
    );
}

#[test]
fn test_incomplete_rows_skipped_before_deltas() {
    let mut records = springfield();
    records[2].values[Category::Health] = f64::NAN;
    records.push(IndicatorRecord::aggregate(
        "Ogdenville",
        2020,
        CategoryValues::splat(f64::NAN),
    ));

    let features = FeatureBuilder::default().build_from_records(&records).unwrap();

    let series = features.get("Springfield").unwrap();
    let years: Vec<i32> = series.observations().iter().map(|o| o.year).collect();
    assert_eq!(years, vec![2020, 2021, 2023, 2024]);
    let delta = series.observations()[2].deltas.unwrap();
    assert_relative_eq!(delta[Category::Housing], 0.4, epsilon = 1e-12);

    assert_eq!(features.rejected().len(), 1);
    assert_eq!(features.rejected()[0].city, "Ogdenville");
    assert_eq!(features.rejected()[0].reason(), "insufficient data points");
}
