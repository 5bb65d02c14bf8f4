//! Configuration for the prediction pipeline
//!
//! Only request bounds and the lag alignment are configurable. Model
//! hyperparameters are fixed in [`crate::trainer`].

use crate::error::{ForecastError, Result};
use crate::features::LagAlignment;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Hard upper bound on the forecast length in days
pub const MAX_FORECAST_DAYS_LIMIT: u32 = 16;

/// Settings for [`crate::pipeline::WeatherPipeline`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Longest forecast a caller may request, in days
    #[serde(default = "default_max_forecast_days")]
    pub max_forecast_days: u32,

    /// How lag features find their source observation
    #[serde(default)]
    pub lag_alignment: LagAlignment,
}

fn default_max_forecast_days() -> u32 {
    14
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_forecast_days: default_max_forecast_days(),
            lag_alignment: LagAlignment::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_forecast_days == 0 || self.max_forecast_days > MAX_FORECAST_DAYS_LIMIT {
            return Err(ForecastError::ConfigError(format!(
                "max_forecast_days must be between 1 and {}, got {}",
                MAX_FORECAST_DAYS_LIMIT, self.max_forecast_days
            )));
        }
        Ok(())
    }

    /// Convert a requested number of days into forecast hours
    pub fn horizon_hours(&self, days: u32) -> Result<usize> {
        if days == 0 || days > self.max_forecast_days {
            return Err(ForecastError::ValidationError(format!(
                "days must be between 1 and {}, got {}",
                self.max_forecast_days, days
            )));
        }
        Ok(days as usize * 24)
    }
}
