//! Request-scoped train-then-forecast pipeline
//!
//! Every call builds features, trains a fresh model and forecasts from the
//! same observations. Nothing is kept between calls.

use crate::config::PipelineConfig;
use crate::data::ObservationTable;
use crate::error::{ForecastError, Result};
use crate::features::FeatureBuilder;
use crate::forecaster::{ForecastPoint, RecursiveForecaster};
use crate::trainer::{ModelTrainer, TrainingMetrics};
use serde::{Deserialize, Serialize};

/// Training diagnostics and the forecast for one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionReport {
    pub model_performance: TrainingMetrics,
    pub prediction: Vec<ForecastPoint>,
}

/// Builds, trains and forecasts for a single request
#[derive(Debug, Clone, Default)]
pub struct WeatherPipeline {
    config: PipelineConfig,
}

impl WeatherPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Train on `history` and forecast `days * 24` hours past its last observation
    pub fn predict(&self, history: &ObservationTable, days: u32) -> Result<PredictionReport> {
        let horizon = self.config.horizon_hours(days)?;
        let observations = history.to_observations()?;

        log::info!(
            "Predicting {} hours from {} observations",
            horizon,
            observations.len()
        );

        let features =
            FeatureBuilder::with_alignment(self.config.lag_alignment).build(&observations);
        let outcome = ModelTrainer::new().train(&features);
        let (model, metrics) = outcome.into_result()?;

        let prediction = RecursiveForecaster::new(&model)
            .forecast(horizon, &observations)?
            .ok_or(ForecastError::UntrainedModel)?;

        Ok(PredictionReport {
            model_performance: metrics,
            prediction,
        })
    }
}
