//! # Weather Forecast Workspace
//!
//! Umbrella crate re-exporting the workspace members:
//!
//! - [`weather_math`]: multi-output random forest regression and error metrics
//! - [`weather_forecast`]: observation ingestion, feature building, training and
//!   recursive forecasting
//!
//! ## Example
//!
//! ```
//! use weather_forecast_workspace::weather_forecast::PipelineConfig;
//!
//! let config = PipelineConfig::default();
//! assert_eq!(config.horizon_hours(2).unwrap(), 48);
//! ```

pub use weather_forecast;
pub use weather_math;
