//! Regression metrics for evaluating forecast accuracy
//!
//! Single-output metrics operate on slices of `f64`. Multi-output variants take
//! row-major matrices and average the per-column score uniformly.

use crate::{MathError, Result};

fn check_lengths(actual: &[f64], predicted: &[f64]) -> Result<()> {
    if actual.is_empty() || actual.len() != predicted.len() {
        return Err(MathError::InvalidInput(format!(
            "Actual ({}) and predicted ({}) values must have the same non-zero length",
            actual.len(),
            predicted.len()
        )));
    }
    Ok(())
}

/// Mean absolute error between actual and predicted values
pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;

    let sum: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).abs())
        .sum();

    Ok(sum / actual.len() as f64)
}

/// Mean squared error between actual and predicted values
pub fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;

    let sum: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum();

    Ok(sum / actual.len() as f64)
}

/// Coefficient of determination (R²)
///
/// A constant `actual` series has no variance to explain: the score is 1.0 when
/// the prediction is exact and 0.0 otherwise.
pub fn r2_score(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;

    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_res: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }

    Ok(1.0 - ss_res / ss_tot)
}

/// Extract column `j` of a row-major matrix
fn column(rows: &[Vec<f64>], j: usize) -> Result<Vec<f64>> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            row.get(j).copied().ok_or_else(|| {
                MathError::InvalidInput(format!("Row {} has no column {}", i, j))
            })
        })
        .collect()
}

fn uniform_average<F>(actual: &[Vec<f64>], predicted: &[Vec<f64>], metric: F) -> Result<f64>
where
    F: Fn(&[f64], &[f64]) -> Result<f64>,
{
    if actual.is_empty() || actual.len() != predicted.len() {
        return Err(MathError::InvalidInput(format!(
            "Actual ({}) and predicted ({}) rows must have the same non-zero length",
            actual.len(),
            predicted.len()
        )));
    }

    let n_outputs = actual[0].len();
    if n_outputs == 0 {
        return Err(MathError::InvalidInput(
            "Rows must have at least one output column".to_string(),
        ));
    }

    let mut total = 0.0;
    for j in 0..n_outputs {
        total += metric(&column(actual, j)?, &column(predicted, j)?)?;
    }

    Ok(total / n_outputs as f64)
}

/// Mean absolute error averaged uniformly over all output columns
pub fn multioutput_mae(actual: &[Vec<f64>], predicted: &[Vec<f64>]) -> Result<f64> {
    uniform_average(actual, predicted, mean_absolute_error)
}

/// R² averaged uniformly over all output columns
pub fn multioutput_r2(actual: &[Vec<f64>], predicted: &[Vec<f64>]) -> Result<f64> {
    uniform_average(actual, predicted, r2_score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_regression_metrics() {
        let actual = vec![10.0, 20.0, 30.0, 40.0, 50.0];
        let predicted = vec![12.0, 18.0, 33.0, 37.0, 52.0];

        assert_relative_eq!(mean_absolute_error(&actual, &predicted).unwrap(), 2.4, epsilon = 1e-12);
        assert_relative_eq!(mean_squared_error(&actual, &predicted).unwrap(), 6.0, epsilon = 1e-12);
        // ss_res = 30, ss_tot = 1000
        assert_relative_eq!(r2_score(&actual, &predicted).unwrap(), 0.97, epsilon = 1e-12);
    }

    #[test]
    fn test_constant_target_r2() {
        let actual = vec![3.0, 3.0, 3.0];
        assert_relative_eq!(r2_score(&actual, &actual).unwrap(), 1.0);
        assert_relative_eq!(r2_score(&actual, &[3.0, 3.0, 4.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_mismatched_lengths() {
        assert!(mean_absolute_error(&[1.0, 2.0], &[1.0]).is_err());
        assert!(r2_score(&[], &[]).is_err());
    }
}
