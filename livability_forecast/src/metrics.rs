//! Accuracy metrics for fitted and forecasted series

use crate::error::{ForecastError, Result};
use serde::Serialize;

/// Forecast accuracy metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastAccuracy {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error over non-zero actuals
    pub mape: f64,
}

/// Compare predictions with actual values
pub fn forecast_accuracy(forecast: &[f64], actual: &[f64]) -> Result<ForecastAccuracy> {
    if forecast.len() != actual.len() || forecast.is_empty() {
        return Err(ForecastError::ValidationError(
            "Forecast and actual values must have the same non-zero length".to_string(),
        ));
    }

    let n = forecast.len() as f64;
    let errors: Vec<f64> = forecast
        .iter()
        .zip(actual.iter())
        .map(|(&f, &a)| a - f)
        .collect();

    let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
    let mse = errors.iter().map(|e| e.powi(2)).sum::<f64>() / n;
    let rmse = mse.sqrt();

    let nonzero: Vec<f64> = actual
        .iter()
        .zip(errors.iter())
        .filter(|(&a, _)| a != 0.0)
        .map(|(&a, &e)| (e.abs() / a.abs()) * 100.0)
        .collect();
    let mape = if nonzero.is_empty() {
        0.0
    } else {
        nonzero.iter().sum::<f64>() / nonzero.len() as f64
    };

    Ok(ForecastAccuracy {
        mae,
        mse,
        rmse,
        mape,
    })
}

/// In-sample fit quality of one city's model
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitSummary {
    /// Number of training rows
    pub observations: usize,
    /// Accuracy of the fitted values
    pub accuracy: ForecastAccuracy,
    /// Residual standard deviation in score units
    pub noise_scale: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_forecast_accuracy() {
        let accuracy = forecast_accuracy(&[1.0, 2.0, 3.0], &[1.5, 2.0, 2.0]).unwrap();
        assert_relative_eq!(accuracy.mae, 0.5);
        assert_relative_eq!(accuracy.mse, 1.25 / 3.0);
        assert_relative_eq!(accuracy.rmse, (1.25_f64 / 3.0).sqrt());
        // (0.5/1.5 + 0 + 1/2) / 3 * 100
        assert_relative_eq!(accuracy.mape, (1.0 / 3.0 + 0.5) / 3.0 * 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_forecast_accuracy_length_mismatch() {
        assert!(forecast_accuracy(&[1.0], &[1.0, 2.0]).is_err());
        assert!(forecast_accuracy(&[], &[]).is_err());
    }
}
