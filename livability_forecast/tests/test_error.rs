use livability_forecast::{CityFailure, ForecastError};
use livability_math::{Category, MathError, WeightIssue};
use std::io;

#[test]
fn test_error_display() {
    let err = ForecastError::MissingColumn("Housing".to_string());
    assert_eq!(err.to_string(), "Missing required column: Housing");

    let err = ForecastError::InsufficientData {
        city: "Springfield".to_string(),
        required: 2,
        found: 0,
    };
    assert_eq!(
        err.to_string(),
        "Insufficient data points for Springfield: need 2, found 0"
    );

    let err = ForecastError::InvalidWeights(vec![
        WeightIssue::OutOfRange {
            category: Category::Health,
            weight: 1.5,
        },
        WeightIssue::SumMismatch { sum: 2.0 },
    ]);
    let message = err.to_string();
    assert!(message.starts_with("Invalid weights: "));
    assert!(message.contains("; "));
}

#[test]
fn test_reason_strings() {
    let cases = [
        (
            ForecastError::InsufficientData {
                city: "a".to_string(),
                required: 2,
                found: 1,
            },
            "insufficient data points",
        ),
        (
            ForecastError::DegenerateRegressors {
                city: "a".to_string(),
            },
            "degenerate regressors",
        ),
        (
            ForecastError::SingularFit {
                city: "a".to_string(),
                detail: "pivot".to_string(),
            },
            "singular fit",
        ),
        (
            ForecastError::DuplicateYear {
                city: "a".to_string(),
                year: 2020,
            },
            "duplicate year",
        ),
        (ForecastError::NoAggregateRows, "no aggregate rows"),
        (
            ForecastError::ValidationError("x".to_string()),
            "forecast failed",
        ),
    ];

    for (err, reason) in cases {
        assert_eq!(err.reason(), reason);
    }
}

#[test]
fn test_city_failure_display() {
    let failure = CityFailure::new(
        "Cypress Creek",
        ForecastError::InsufficientData {
            city: "Cypress Creek".to_string(),
            required: 2,
            found: 0,
        },
    );
    let text = failure.to_string();
    assert!(text.starts_with("Cypress Creek: insufficient data points"));
}

#[test]
fn test_error_conversion() {
    let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
    let err: ForecastError = io_error.into();
    assert!(matches!(err, ForecastError::IoError(_)));

    let math_error = MathError::UnknownCategory("Parks".to_string());
    let err: ForecastError = math_error.into();
    assert!(matches!(err, ForecastError::Math(_)));
}
