//! Dense linear algebra for small regression problems
//!
//! Matrices are square, row-major `Vec<f64>` of size `n * n`. The systems
//! solved here have one row per regressor (at most a few dozen), so a plain
//! Cholesky factorisation is sufficient.

use crate::{MathError, Result};

/// Smallest pivot accepted during factorisation
const PIVOT_EPSILON: f64 = 1e-12;

/// Cholesky factorisation `A = L Lᵀ` of a symmetric positive-definite matrix
#[derive(Debug, Clone)]
pub struct Cholesky {
    n: usize,
    lower: Vec<f64>,
}

impl Cholesky {
    /// Factorise a symmetric positive-definite matrix
    pub fn decompose(matrix: &[f64], n: usize) -> Result<Self> {
        if n == 0 {
            return Err(MathError::InvalidInput(
                "Cannot factorise an empty matrix".to_string(),
            ));
        }
        if matrix.len() != n * n {
            return Err(MathError::InvalidInput(format!(
                "Matrix has {} entries, expected {}",
                matrix.len(),
                n * n
            )));
        }

        let mut lower = vec![0.0; n * n];
        for i in 0..n {
            for j in 0..=i {
                let mut sum = matrix[i * n + j];
                for k in 0..j {
                    sum -= lower[i * n + k] * lower[j * n + k];
                }

                if i == j {
                    if !sum.is_finite() || sum <= PIVOT_EPSILON {
                        return Err(MathError::NotPositiveDefinite(i));
                    }
                    lower[i * n + i] = sum.sqrt();
                } else {
                    lower[i * n + j] = sum / lower[j * n + j];
                }
            }
        }

        Ok(Self { n, lower })
    }

    /// Dimension of the factorised matrix
    pub fn dim(&self) -> usize {
        self.n
    }

    /// Solve `A x = b`
    pub fn solve(&self, b: &[f64]) -> Result<Vec<f64>> {
        let n = self.n;
        if b.len() != n {
            return Err(MathError::InvalidInput(format!(
                "Right-hand side has {} entries, expected {}",
                b.len(),
                n
            )));
        }

        // Forward substitution: L y = b
        let mut y = vec![0.0; n];
        for i in 0..n {
            let mut sum = b[i];
            for k in 0..i {
                sum -= self.lower[i * n + k] * y[k];
            }
            y[i] = sum / self.lower[i * n + i];
        }

        // Back substitution: Lᵀ x = y
        let mut x = vec![0.0; n];
        for i in (0..n).rev() {
            let mut sum = y[i];
            for k in (i + 1)..n {
                sum -= self.lower[k * n + i] * x[k];
            }
            x[i] = sum / self.lower[i * n + i];
        }

        if x.iter().any(|v| !v.is_finite()) {
            return Err(MathError::CalculationError(
                "Solution contains non-finite values".to_string(),
            ));
        }

        Ok(x)
    }

    /// Inverse of the factorised matrix, row-major
    pub fn inverse(&self) -> Result<Vec<f64>> {
        let n = self.n;
        let mut inverse = vec![0.0; n * n];
        let mut unit = vec![0.0; n];

        for col in 0..n {
            unit.iter_mut().for_each(|v| *v = 0.0);
            unit[col] = 1.0;
            let x = self.solve(&unit)?;
            for row in 0..n {
                inverse[row * n + col] = x[row];
            }
        }

        Ok(inverse)
    }
}

/// `xᵀ M x` for a square row-major matrix
pub fn quadratic_form(matrix: &[f64], x: &[f64]) -> f64 {
    let n = x.len();
    let mut total = 0.0;
    for i in 0..n {
        for j in 0..n {
            total += x[i] * matrix[i * n + j] * x[j];
        }
    }
    total
}

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator), `None` below two values
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_solve_identity() {
        let chol = Cholesky::decompose(&[1.0, 0.0, 0.0, 1.0], 2).unwrap();
        let x = chol.solve(&[3.0, -2.0]).unwrap();
        assert_relative_eq!(x[0], 3.0);
        assert_relative_eq!(x[1], -2.0);
    }

    #[test]
    fn test_solve_spd_system() {
        // A = [[4, 2], [2, 3]], b = [2, 1] -> x = [0.5, 0]
        let chol = Cholesky::decompose(&[4.0, 2.0, 2.0, 3.0], 2).unwrap();
        let x = chol.solve(&[2.0, 1.0]).unwrap();
        assert_relative_eq!(x[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(x[1], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_inverse() {
        let a = [4.0, 2.0, 2.0, 3.0];
        let inv = Cholesky::decompose(&a, 2).unwrap().inverse().unwrap();
        // inverse = 1/8 * [[3, -2], [-2, 4]]
        assert_relative_eq!(inv[0], 0.375, epsilon = 1e-12);
        assert_relative_eq!(inv[1], -0.25, epsilon = 1e-12);
        assert_relative_eq!(inv[2], -0.25, epsilon = 1e-12);
        assert_relative_eq!(inv[3], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_singular() {
        let result = Cholesky::decompose(&[1.0, 1.0, 1.0, 1.0], 2);
        assert_eq!(result.unwrap_err(), MathError::NotPositiveDefinite(1));
    }

    #[test]
    fn test_rejects_bad_shape() {
        assert!(Cholesky::decompose(&[1.0, 2.0, 3.0], 2).is_err());
        assert!(Cholesky::decompose(&[], 0).is_err());
    }

    #[test]
    fn test_quadratic_form() {
        let m = [2.0, 0.0, 0.0, 3.0];
        assert_relative_eq!(quadratic_form(&m, &[1.0, 2.0]), 14.0);
    }

    #[test]
    fn test_mean_and_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(mean(&values).unwrap(), 5.0);
        assert_relative_eq!(sample_std(&values).unwrap(), (32.0f64 / 7.0).sqrt());
        assert!(mean(&[]).is_none());
        assert!(sample_std(&[1.0]).is_none());
    }
}
