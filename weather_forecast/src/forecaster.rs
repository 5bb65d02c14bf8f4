//! Recursive multi-step forecasting
//!
//! The regressor only predicts one hour ahead from lags 24 hours back. To
//! forecast further, every prediction is appended to a rolling buffer so that
//! step `i` supplies the lag features of step `i + 24`. Beyond the first day the
//! lag inputs are model outputs rather than observations, and errors compound
//! with horizon depth.

use crate::data::{Observation, ObservationTable};
use crate::error::{ForecastError, Result};
use crate::features::{FeatureRow, TargetRow, LAG_HOURS};
use crate::trainer::WeatherModel;
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One predicted hour
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub time: NaiveDateTime,
    pub predicted_temperature_2m: f64,
    pub predicted_wind_speed_10m: f64,
    pub predicted_relative_humidity_2m: f64,
}

impl ForecastPoint {
    pub fn new(time: NaiveDateTime, prediction: TargetRow) -> Self {
        Self {
            time,
            predicted_temperature_2m: prediction.temperature_2m,
            predicted_wind_speed_10m: prediction.wind_speed_10m,
            predicted_relative_humidity_2m: prediction.relative_humidity_2m,
        }
    }

    pub fn values(&self) -> [f64; 3] {
        [
            self.predicted_temperature_2m,
            self.predicted_wind_speed_10m,
            self.predicted_relative_humidity_2m,
        ]
    }
}

/// A forecast point together with the features it was predicted from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastStep {
    pub step_index: usize,
    pub features: FeatureRow,
    pub point: ForecastPoint,
}

/// Lag history for the rollout: observed values first, then predictions
#[derive(Debug, Clone, PartialEq)]
pub struct RollingBuffer {
    temperature: Vec<f64>,
    wind: Vec<f64>,
    humidity: Vec<f64>,
}

impl RollingBuffer {
    /// Seed from the last 24 of `history`, which must be sorted by time.
    ///
    /// Fails with `ShortBuffer` when fewer than 24 rows exist and with
    /// `DataError` when any seed value is missing.
    pub fn seed(history: &[Observation]) -> Result<Self> {
        if history.len() < LAG_HOURS {
            return Err(ForecastError::ShortBuffer {
                available: history.len(),
                required: LAG_HOURS,
            });
        }

        let window = &history[history.len() - LAG_HOURS..];
        if let Some(bad) = window.iter().find(|o| !o.is_complete()) {
            return Err(ForecastError::DataError(format!(
                "Missing value in seed history at {}",
                bad.time
            )));
        }

        Ok(Self {
            temperature: window.iter().map(|o| o.temperature_2m).collect(),
            wind: window.iter().map(|o| o.wind_speed_10m).collect(),
            humidity: window.iter().map(|o| o.relative_humidity_2m).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.temperature.len()
    }

    pub fn is_empty(&self) -> bool {
        self.temperature.is_empty()
    }

    /// Values 24 positions before the end of the buffer, `[temperature, wind, humidity]`
    pub fn lags(&self) -> [f64; 3] {
        let idx = self.len() - LAG_HOURS;
        [self.temperature[idx], self.wind[idx], self.humidity[idx]]
    }

    /// Append one step's prediction
    pub fn push(&mut self, prediction: &TargetRow) {
        self.temperature.push(prediction.temperature_2m);
        self.wind.push(prediction.wind_speed_10m);
        self.humidity.push(prediction.relative_humidity_2m);
    }

    pub fn temperature(&self) -> &[f64] {
        &self.temperature
    }

    pub fn wind(&self) -> &[f64] {
        &self.wind
    }

    pub fn humidity(&self) -> &[f64] {
        &self.humidity
    }
}

/// The forecast state machine.
///
/// Yields exactly `horizon` steps in time order, then `None`. A prediction
/// error is yielded once and ends the rollout.
#[derive(Debug)]
pub struct Rollout<'a> {
    model: &'a WeatherModel,
    buffer: RollingBuffer,
    last_observed: NaiveDateTime,
    step_index: usize,
    horizon: usize,
    failed: bool,
}

impl Rollout<'_> {
    pub fn buffer(&self) -> &RollingBuffer {
        &self.buffer
    }

    /// Index of the next step to produce
    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn last_observed(&self) -> NaiveDateTime {
        self.last_observed
    }
}

impl Iterator for Rollout<'_> {
    type Item = Result<ForecastStep>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.step_index >= self.horizon {
            return None;
        }

        let time = self.last_observed + Duration::hours(self.step_index as i64 + 1);
        let features = FeatureRow::new(time, self.buffer.lags());

        let prediction = match self.model.predict(&features) {
            Ok(prediction) => prediction,
            Err(e) => {
                self.failed = true;
                return Some(Err(e));
            }
        };

        self.buffer.push(&prediction);

        let step = ForecastStep {
            step_index: self.step_index,
            features,
            point: ForecastPoint::new(time, prediction),
        };
        self.step_index += 1;

        Some(Ok(step))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.failed {
            0
        } else {
            self.horizon - self.step_index
        };
        (0, Some(remaining))
    }
}

/// Turns a trained one-step model into an hourly sequence forecast
#[derive(Debug, Clone, Copy)]
pub struct RecursiveForecaster<'a> {
    model: &'a WeatherModel,
}

impl<'a> RecursiveForecaster<'a> {
    pub fn new(model: &'a WeatherModel) -> Self {
        Self { model }
    }

    /// Start a rollout of `horizon_hours` steps after the last row of `history`.
    ///
    /// `history` is stably sorted by time before seeding.
    pub fn rollout(&self, horizon_hours: usize, history: &[Observation]) -> Result<Rollout<'a>> {
        if !self.model.is_trained() {
            return Err(ForecastError::UntrainedModel);
        }
        if horizon_hours == 0 {
            return Err(ForecastError::ValidationError(
                "Forecast horizon must be at least one hour".to_string(),
            ));
        }

        let mut sorted = history.to_vec();
        sorted.sort_by_key(|o| o.time);

        let buffer = RollingBuffer::seed(&sorted)?;
        let last_observed = sorted[sorted.len() - 1].time;

        Ok(Rollout {
            model: self.model,
            buffer,
            last_observed,
            step_index: 0,
            horizon: horizon_hours,
            failed: false,
        })
    }

    /// Forecast `horizon_hours` hourly points after the last observation.
    ///
    /// Returns `Ok(None)` when the model is untrained.
    pub fn forecast(
        &self,
        horizon_hours: usize,
        history: &[Observation],
    ) -> Result<Option<Vec<ForecastPoint>>> {
        if !self.model.is_trained() {
            log::warn!("Forecast requested from an untrained model");
            return Ok(None);
        }

        let points = self
            .rollout(horizon_hours, history)?
            .map(|step| step.map(|s| s.point))
            .collect::<Result<Vec<_>>>()?;

        log::debug!("Forecast {} hourly points", points.len());
        Ok(Some(points))
    }

    /// Forecast from a raw table, failing with `MissingColumn` when a required
    /// column is absent
    pub fn forecast_table(
        &self,
        horizon_hours: usize,
        table: &ObservationTable,
    ) -> Result<Option<Vec<ForecastPoint>>> {
        if !self.model.is_trained() {
            log::warn!("Forecast requested from an untrained model");
            return Ok(None);
        }

        let history = table.to_observations()?;
        self.forecast(horizon_hours, &history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn history(len: usize) -> Vec<Observation> {
        let start = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        (0..len)
            .map(|i| {
                let v = i as f64;
                Observation::new(start + Duration::hours(i as i64), v, v + 100.0, v + 200.0)
            })
            .collect()
    }

    #[test]
    fn test_seed_uses_last_day() {
        let buffer = RollingBuffer::seed(&history(30)).unwrap();
        assert_eq!(buffer.len(), LAG_HOURS);
        assert_eq!(buffer.temperature()[0], 6.0);
        assert_eq!(buffer.lags(), [6.0, 106.0, 206.0]);
    }

    #[test]
    fn test_push_shifts_lag_window() {
        let mut buffer = RollingBuffer::seed(&history(24)).unwrap();
        buffer.push(&TargetRow::new(-1.0, -2.0, -3.0));
        assert_eq!(buffer.len(), 25);
        assert_eq!(buffer.lags(), [1.0, 101.0, 201.0]);
        assert_eq!(buffer.humidity().last(), Some(&-3.0));
        assert_eq!(buffer.wind().len(), 25);
    }

    #[test]
    fn test_short_history_fails() {
        match RollingBuffer::seed(&history(10)) {
            Err(ForecastError::ShortBuffer {
                available,
                required,
            }) => {
                assert_eq!(available, 10);
                assert_eq!(required, 24);
            }
            other => panic!("Expected ShortBuffer, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_seed_value_fails() {
        let mut rows = history(24);
        rows[5].wind_speed_10m = f64::NAN;
        assert!(matches!(
            RollingBuffer::seed(&rows),
            Err(ForecastError::DataError(_))
        ));
    }

    #[test]
    fn test_untrained_model_yields_none() {
        let model = WeatherModel::untrained();
        let forecaster = RecursiveForecaster::new(&model);
        assert_eq!(forecaster.forecast(24, &history(48)).unwrap(), None);
        assert!(matches!(
            forecaster.rollout(24, &history(48)),
            Err(ForecastError::UntrainedModel)
        ));
    }
}
