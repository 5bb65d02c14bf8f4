//! # Weather Forecast
//!
//! Recursive multi-horizon forecasting of hourly weather variables from
//! historical observations.
//!
//! ## Features
//!
//! - Observation ingestion from CSV, polars DataFrames and Open-Meteo JSON
//! - Calendar and 24-hour lag features for temperature, wind speed and humidity
//! - Multi-output random forest training with a chronological 80/20 hold-out
//! - Autoregressive rollout that feeds each prediction back as lag history
//!
//! ## Pipeline
//!
//! ```text
//! ObservationTable -> FeatureBuilder -> ModelTrainer -> RecursiveForecaster -> Vec<ForecastPoint>
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use weather_forecast::{
//!     FeatureBuilder, ModelTrainer, ObservationTable, RecursiveForecaster,
//! };
//!
//! # fn main() -> weather_forecast::error::Result<()> {
//! // Load two years of hourly history
//! let table = ObservationTable::from_csv("history.csv")?;
//! let observations = table.to_observations()?;
//!
//! // Build features and train
//! let features = FeatureBuilder::new().build(&observations);
//! let outcome = ModelTrainer::new().train(&features);
//! println!("r2 = {:?}", outcome.metrics.r2);
//!
//! // Forecast the next 7 days hour by hour
//! let forecaster = RecursiveForecaster::new(&outcome.production_model);
//! if let Some(points) = forecaster.forecast(7 * 24, &observations)? {
//!     for point in points.iter().take(3) {
//!         println!("{}: {:.1} °C", point.time, point.predicted_temperature_2m);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod features;
pub mod forecaster;
pub mod pipeline;
pub mod trainer;
pub mod utils;

// Re-export commonly used types
pub use crate::config::PipelineConfig;
pub use crate::data::{Observation, ObservationTable};
pub use crate::error::ForecastError;
pub use crate::features::{FeatureBuilder, FeatureRow, FeatureSet, LagAlignment, TargetRow};
pub use crate::forecaster::{ForecastPoint, RecursiveForecaster, RollingBuffer};
pub use crate::pipeline::{PredictionReport, WeatherPipeline};
pub use crate::trainer::{ModelTrainer, TrainingMetrics, TrainingOutcome, WeatherModel};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
