//! Feature construction for the hourly weather regressor
//!
//! Each feature row combines calendar features of its own timestamp with the
//! three weather variables observed 24 hours earlier. The target row is the
//! weather observed at the same timestamp.

use crate::data::{Observation, ObservationTable, REQUIRED_COLUMNS};
use crate::error::{ForecastError, Result};
use chrono::{Datelike, Duration, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Distance between a row and its lag source, in hourly rows
pub const LAG_HOURS: usize = 24;

/// Feature names in regressor column order
pub const FEATURE_NAMES: [&str; 6] = [
    "hour",
    "month",
    "day_of_year",
    "temp_lag_24h",
    "wind_lag_24h",
    "hum_lag_24h",
];

/// Target names in regressor output order
pub const TARGET_NAMES: [&str; 3] = REQUIRED_COLUMNS;

/// Input row for the regressor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    /// Hour of day (0-23)
    pub hour: u32,
    /// Month (1-12)
    pub month: u32,
    /// Ordinal day within the year (1-366)
    pub day_of_year: u32,
    pub temp_lag_24h: f64,
    pub wind_lag_24h: f64,
    pub hum_lag_24h: f64,
}

impl FeatureRow {
    /// Calendar features of `time` plus lagged `[temperature, wind, humidity]`
    pub fn new(time: NaiveDateTime, lags: [f64; 3]) -> Self {
        Self {
            hour: time.hour(),
            month: time.month(),
            day_of_year: time.ordinal(),
            temp_lag_24h: lags[0],
            wind_lag_24h: lags[1],
            hum_lag_24h: lags[2],
        }
    }

    /// Values in [`FEATURE_NAMES`] order
    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            self.hour as f64,
            self.month as f64,
            self.day_of_year as f64,
            self.temp_lag_24h,
            self.wind_lag_24h,
            self.hum_lag_24h,
        ]
    }
}

/// Regression targets for one row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetRow {
    pub temperature_2m: f64,
    pub wind_speed_10m: f64,
    pub relative_humidity_2m: f64,
}

impl TargetRow {
    pub fn new(temperature_2m: f64, wind_speed_10m: f64, relative_humidity_2m: f64) -> Self {
        Self {
            temperature_2m,
            wind_speed_10m,
            relative_humidity_2m,
        }
    }

    /// Build from a regressor output vector in [`TARGET_NAMES`] order
    pub fn from_slice(values: &[f64]) -> Result<Self> {
        match values {
            [temperature, wind, humidity] => Ok(Self::new(*temperature, *wind, *humidity)),
            _ => Err(ForecastError::ValidationError(format!(
                "Expected {} target values, got {}",
                TARGET_NAMES.len(),
                values.len()
            ))),
        }
    }

    /// Values in [`TARGET_NAMES`] order
    pub fn values(&self) -> [f64; 3] {
        [
            self.temperature_2m,
            self.wind_speed_10m,
            self.relative_humidity_2m,
        ]
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.values().to_vec()
    }
}

impl From<&Observation> for TargetRow {
    fn from(observation: &Observation) -> Self {
        Self::new(
            observation.temperature_2m,
            observation.wind_speed_10m,
            observation.relative_humidity_2m,
        )
    }
}

/// How a row finds the observation its lag features come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LagAlignment {
    /// The row 24 positions earlier in time-sorted order. Only equals
    /// "24 hours ago" for a gapless hourly series.
    #[default]
    Positional,
    /// The observation stamped exactly 24 hours earlier; rows without one are dropped
    Calendar,
}

/// Aligned feature and target tables
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureSet {
    features: Vec<FeatureRow>,
    targets: Vec<TargetRow>,
    times: Vec<NaiveDateTime>,
}

impl FeatureSet {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn features(&self) -> &[FeatureRow] {
        &self.features
    }

    pub fn targets(&self) -> &[TargetRow] {
        &self.targets
    }

    /// Timestamp of the observation each row was derived from
    pub fn times(&self) -> &[NaiveDateTime] {
        &self.times
    }

    pub fn into_parts(self) -> (Vec<FeatureRow>, Vec<TargetRow>) {
        (self.features, self.targets)
    }

    /// Row-major feature matrix for the regressor
    pub fn feature_matrix(&self) -> Vec<Vec<f64>> {
        self.features.iter().map(FeatureRow::to_vec).collect()
    }

    /// Row-major target matrix for the regressor
    pub fn target_matrix(&self) -> Vec<Vec<f64>> {
        self.targets.iter().map(TargetRow::to_vec).collect()
    }
}

/// Derives features and targets from raw observations
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureBuilder {
    alignment: LagAlignment,
}

impl FeatureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_alignment(alignment: LagAlignment) -> Self {
        Self { alignment }
    }

    pub fn alignment(&self) -> LagAlignment {
        self.alignment
    }

    /// Build features from typed observations.
    ///
    /// Observations are stably sorted by time first, so duplicated timestamps
    /// keep their input order. Rows without a lag source, or with a missing
    /// value in their targets or lags, are dropped.
    pub fn build(&self, observations: &[Observation]) -> FeatureSet {
        let mut sorted = observations.to_vec();
        sorted.sort_by_key(|o| o.time);

        let lag_sources = match self.alignment {
            LagAlignment::Positional => positional_lags(sorted.len()),
            LagAlignment::Calendar => calendar_lags(&sorted),
        };

        let mut set = FeatureSet::default();
        for (observation, lag_idx) in sorted.iter().zip(lag_sources) {
            let Some(lag_idx) = lag_idx else {
                continue;
            };
            let lag = &sorted[lag_idx];
            if !observation.is_complete() || !lag.is_complete() {
                continue;
            }

            set.features.push(FeatureRow::new(observation.time, lag.values()));
            set.targets.push(TargetRow::from(observation));
            set.times.push(observation.time);
        }

        log::debug!(
            "Built {} feature rows from {} observations ({:?} lag alignment)",
            set.len(),
            sorted.len(),
            self.alignment
        );

        set
    }

    /// Build features from a raw table, returning an empty set when a required
    /// column is absent from its schema
    pub fn build_table(&self, table: &ObservationTable) -> FeatureSet {
        match self.try_build_table(table) {
            Ok(set) => set,
            Err(e) => {
                log::warn!("Cannot build features: {}", e);
                FeatureSet::default()
            }
        }
    }

    /// Like [`FeatureBuilder::build_table`] but surfaces the missing column as an error
    pub fn try_build_table(&self, table: &ObservationTable) -> Result<FeatureSet> {
        let observations = table.to_observations()?;
        Ok(self.build(&observations))
    }
}

fn positional_lags(len: usize) -> Vec<Option<usize>> {
    (0..len).map(|i| i.checked_sub(LAG_HOURS)).collect()
}

fn calendar_lags(sorted: &[Observation]) -> Vec<Option<usize>> {
    let mut index: HashMap<NaiveDateTime, usize> = HashMap::with_capacity(sorted.len());
    for (i, observation) in sorted.iter().enumerate() {
        index.entry(observation.time).or_insert(i);
    }

    let lag = Duration::hours(LAG_HOURS as i64);
    sorted
        .iter()
        .map(|o| index.get(&(o.time - lag)).copied())
        .collect()
}
