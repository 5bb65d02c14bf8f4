//! Error types for the weather_forecast crate

use polars::prelude::PolarsError;
use thiserror::Error;
use weather_math::MathError;

/// Custom error types for the weather_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Too few usable feature rows to train a model
    #[error("Insufficient data: {rows} usable rows, at least {required} required")]
    InsufficientData { rows: usize, required: usize },

    /// A required raw column is absent from the input schema
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// Forecast requested from a model that never completed training
    #[error("Model has not been trained")]
    UntrainedModel,

    /// Not enough trailing history to seed the lag buffer
    #[error("Insufficient history to seed forecast: {available} rows available, {required} required")]
    ShortBuffer { available: usize, required: usize },

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error related to parameter validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Numeric failure while fitting the regressor
    #[error("Training error: {0}")]
    Training(String),

    /// Error from the regression library
    #[error("Math error: {0}")]
    MathError(#[from] MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error decoding JSON payloads
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error decoding a configuration file
    #[error("Config error: {0}")]
    ConfigError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl From<toml::de::Error> for ForecastError {
    fn from(err: toml::de::Error) -> Self {
        ForecastError::ConfigError(err.to_string())
    }
}
