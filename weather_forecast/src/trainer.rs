//! Model training and hold-out evaluation
//!
//! Training fits a multi-output random forest twice: once on the chronologically
//! earliest 80% of rows to measure error on the held-out tail, and once on all
//! rows to produce the model used for forecasting. Both fits are returned as
//! separate immutable [`WeatherModel`] values, so the reported metrics always
//! describe the evaluation artifact and never an overwritten fit state.

use crate::error::{ForecastError, Result};
use crate::features::{FeatureRow, FeatureSet, TargetRow, FEATURE_NAMES};
use crate::utils::chronological_split;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use weather_math::metrics::{multioutput_mae, multioutput_r2};
use weather_math::{ForestParams, RandomForestRegressor};

/// Trees in the forest
pub const N_ESTIMATORS: usize = 100;
/// Seed for bootstrap sampling
pub const RANDOM_SEED: u64 = 42;
/// Fewest feature rows accepted for training
pub const MIN_TRAINING_ROWS: usize = 100;
/// Share of rows, from the start, used for the evaluation fit
pub const TRAIN_FRACTION: f64 = 0.8;

/// A fitted (or never fitted) weather regressor
#[derive(Debug, Clone, Default)]
pub struct WeatherModel {
    forest: Option<RandomForestRegressor>,
}

impl WeatherModel {
    /// A model that has not completed training
    pub fn untrained() -> Self {
        Self::default()
    }

    fn fit(params: &ForestParams, features: &[FeatureRow], targets: &[TargetRow]) -> Result<Self> {
        let x: Vec<Vec<f64>> = features.iter().map(FeatureRow::to_vec).collect();
        let y: Vec<Vec<f64>> = targets.iter().map(TargetRow::to_vec).collect();
        let forest = params.fit(&x, &y)?;
        Ok(Self {
            forest: Some(forest),
        })
    }

    pub fn is_trained(&self) -> bool {
        self.forest.is_some()
    }

    /// Predict all targets for one feature row
    pub fn predict(&self, row: &FeatureRow) -> Result<TargetRow> {
        let forest = self.forest.as_ref().ok_or(ForecastError::UntrainedModel)?;
        let values = forest.predict_row(&row.to_vec())?;
        TargetRow::from_slice(&values)
    }

    pub fn predict_batch(&self, rows: &[FeatureRow]) -> Result<Vec<TargetRow>> {
        rows.iter().map(|row| self.predict(row)).collect()
    }

    /// Relative contribution of each feature to the fit, keyed by feature name.
    ///
    /// Empty for an untrained model.
    pub fn feature_importance(&self) -> BTreeMap<String, f64> {
        match &self.forest {
            Some(forest) => FEATURE_NAMES
                .iter()
                .zip(forest.feature_importances())
                .map(|(name, value)| (name.to_string(), *value))
                .collect(),
            None => BTreeMap::new(),
        }
    }
}

/// Outcome of a training run as reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainingStatus {
    Success,
    Error,
}

/// Hold-out metrics and diagnostics of a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub status: TrainingStatus,
    /// R² on the held-out block, averaged over targets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r2: Option<f64>,
    /// Mean absolute error on the held-out block, averaged over targets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mae: Option<f64>,
    /// Feature importance of the production (full-data) fit
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub feature_importance: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub train_rows: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_rows: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TrainingMetrics {
    fn error(message: String) -> Self {
        Self {
            status: TrainingStatus::Error,
            r2: None,
            mae: None,
            feature_importance: BTreeMap::new(),
            train_rows: None,
            test_rows: None,
            message: Some(message),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == TrainingStatus::Success
    }
}

/// Why a training run produced no model
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrainingFailure {
    #[error("Insufficient data: {rows} rows, need {required}")]
    InsufficientData { rows: usize, required: usize },

    #[error("Model fitting failed: {0}")]
    Numerical(String),
}

impl From<TrainingFailure> for ForecastError {
    fn from(failure: TrainingFailure) -> Self {
        match failure {
            TrainingFailure::InsufficientData { rows, required } => {
                ForecastError::InsufficientData { rows, required }
            }
            TrainingFailure::Numerical(msg) => ForecastError::Training(msg),
        }
    }
}

/// Everything a training run produces
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub metrics: TrainingMetrics,
    /// Fit on the leading training block; the metrics describe this model
    pub evaluation_model: WeatherModel,
    /// Fit on every row; use this one for forecasting
    pub production_model: WeatherModel,
    pub failure: Option<TrainingFailure>,
}

impl TrainingOutcome {
    fn failed(failure: TrainingFailure) -> Self {
        Self {
            metrics: TrainingMetrics::error(failure.to_string()),
            evaluation_model: WeatherModel::untrained(),
            production_model: WeatherModel::untrained(),
            failure: Some(failure),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// The production model and metrics, or the failure as an error
    pub fn into_result(self) -> Result<(WeatherModel, TrainingMetrics)> {
        match self.failure {
            Some(failure) => Err(failure.into()),
            None => Ok((self.production_model, self.metrics)),
        }
    }
}

/// Fits weather models with fixed hyperparameters
#[derive(Debug, Clone)]
pub struct ModelTrainer {
    params: ForestParams,
}

impl Default for ModelTrainer {
    fn default() -> Self {
        Self {
            params: ForestParams {
                n_estimators: N_ESTIMATORS,
                seed: RANDOM_SEED,
                ..ForestParams::default()
            },
        }
    }
}

impl ModelTrainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Train on a built feature set
    pub fn train(&self, set: &FeatureSet) -> TrainingOutcome {
        self.train_rows(set.features(), set.targets())
    }

    /// Train on aligned feature and target rows in chronological order.
    ///
    /// Never panics or returns `Err`: failures are reported through the
    /// outcome's `status` and `failure` fields.
    pub fn train_rows(&self, features: &[FeatureRow], targets: &[TargetRow]) -> TrainingOutcome {
        let rows = features.len();
        if rows < MIN_TRAINING_ROWS {
            log::warn!(
                "Not enough data to train: {} rows, need {}",
                rows,
                MIN_TRAINING_ROWS
            );
            return TrainingOutcome::failed(TrainingFailure::InsufficientData {
                rows,
                required: MIN_TRAINING_ROWS,
            });
        }
        if targets.len() != rows {
            return TrainingOutcome::failed(TrainingFailure::Numerical(format!(
                "Feature rows ({}) don't match target rows ({})",
                rows,
                targets.len()
            )));
        }

        match self.fit_and_evaluate(features, targets) {
            Ok(outcome) => outcome,
            Err(e) => {
                log::warn!("Training failed: {}", e);
                TrainingOutcome::failed(TrainingFailure::Numerical(e.to_string()))
            }
        }
    }

    fn fit_and_evaluate(
        &self,
        features: &[FeatureRow],
        targets: &[TargetRow],
    ) -> Result<TrainingOutcome> {
        let (train_x, test_x) = chronological_split(features, TRAIN_FRACTION);
        let (train_y, test_y) = chronological_split(targets, TRAIN_FRACTION);

        let evaluation_model = WeatherModel::fit(&self.params, train_x, train_y)?;

        let actual: Vec<Vec<f64>> = test_y.iter().map(TargetRow::to_vec).collect();
        let predicted: Vec<Vec<f64>> = evaluation_model
            .predict_batch(test_x)?
            .iter()
            .map(TargetRow::to_vec)
            .collect();
        let r2 = multioutput_r2(&actual, &predicted)?;
        let mae = multioutput_mae(&actual, &predicted)?;
        if !r2.is_finite() || !mae.is_finite() {
            return Err(ForecastError::Training(
                "Evaluation produced non-finite metrics".to_string(),
            ));
        }

        let production_model = WeatherModel::fit(&self.params, features, targets)?;
        let feature_importance = production_model.feature_importance();

        log::info!(
            "Trained on {} rows ({} train / {} held out): r2={:.4}, mae={:.4}",
            features.len(),
            train_x.len(),
            test_x.len(),
            r2,
            mae
        );

        Ok(TrainingOutcome {
            metrics: TrainingMetrics {
                status: TrainingStatus::Success,
                r2: Some(r2),
                mae: Some(mae),
                feature_importance,
                train_rows: Some(train_x.len()),
                test_rows: Some(test_x.len()),
                message: None,
            },
            evaluation_model,
            production_model,
            failure: None,
        })
    }
}
