//! # Weather Math
//!
//! Numerical building blocks for the weather forecasting engine.
//! This crate provides regression metrics and a multi-output random forest
//! regressor that predicts a vector of targets per input row.

use thiserror::Error;

pub mod forest;
pub mod metrics;
mod tree;

pub use forest::{ForestParams, RandomForestRegressor};

/// Errors that can occur in regression and metric calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for weather math operations
pub type Result<T> = std::result::Result<T, MathError>;

/// Check that a design matrix and target matrix are rectangular, finite and aligned.
///
/// Returns `(n_features, n_outputs)` on success.
pub(crate) fn check_matrices(x: &[Vec<f64>], y: &[Vec<f64>]) -> Result<(usize, usize)> {
    if x.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot fit on an empty feature matrix".to_string(),
        ));
    }
    if x.len() != y.len() {
        return Err(MathError::InvalidInput(format!(
            "Feature rows ({}) don't match target rows ({})",
            x.len(),
            y.len()
        )));
    }

    let n_features = x[0].len();
    let n_outputs = y[0].len();
    if n_features == 0 || n_outputs == 0 {
        return Err(MathError::InvalidInput(
            "Feature and target rows must have at least one column".to_string(),
        ));
    }

    for (i, (row, target)) in x.iter().zip(y.iter()).enumerate() {
        if row.len() != n_features || target.len() != n_outputs {
            return Err(MathError::InvalidInput(format!("Ragged row at index {}", i)));
        }
        if row.iter().chain(target.iter()).any(|v| !v.is_finite()) {
            return Err(MathError::InvalidInput(format!(
                "Non-finite value at row {}",
                i
            )));
        }
    }

    Ok((n_features, n_outputs))
}
