//! Hourly weather observations and their ingestion from tabular sources
//!
//! [`ObservationTable`] is the columnar shape handed over by the observation
//! store: a time column plus one optional column per weather variable, so an
//! absent column in the source schema stays visible. It is validated once into
//! fixed-schema [`Observation`] records before any feature work happens.

use crate::error::{ForecastError, Result};
use crate::utils::parse_timestamp;
use chrono::{DateTime, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Name of the timestamp column
pub const TIME_COLUMN: &str = "time";
/// Air temperature at 2 m (°C)
pub const TEMPERATURE_COLUMN: &str = "temperature_2m";
/// Wind speed at 10 m (km/h)
pub const WIND_SPEED_COLUMN: &str = "wind_speed_10m";
/// Relative humidity at 2 m (%)
pub const HUMIDITY_COLUMN: &str = "relative_humidity_2m";

/// Weather variables every observation must carry, in target order
pub const REQUIRED_COLUMNS: [&str; 3] = [TEMPERATURE_COLUMN, WIND_SPEED_COLUMN, HUMIDITY_COLUMN];

/// A single hourly observation.
///
/// A missing cell in the source table is carried as `f64::NAN`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub time: NaiveDateTime,
    pub temperature_2m: f64,
    pub wind_speed_10m: f64,
    pub relative_humidity_2m: f64,
}

impl Observation {
    pub fn new(
        time: NaiveDateTime,
        temperature_2m: f64,
        wind_speed_10m: f64,
        relative_humidity_2m: f64,
    ) -> Self {
        Self {
            time,
            temperature_2m,
            wind_speed_10m,
            relative_humidity_2m,
        }
    }

    /// Weather values in [`REQUIRED_COLUMNS`] order
    pub fn values(&self) -> [f64; 3] {
        [
            self.temperature_2m,
            self.wind_speed_10m,
            self.relative_humidity_2m,
        ]
    }

    /// True when every weather value is present and finite
    pub fn is_complete(&self) -> bool {
        self.values().iter().all(|v| v.is_finite())
    }
}

/// Columnar observations as supplied by the observation store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationTable {
    time: Vec<NaiveDateTime>,
    temperature_2m: Option<Vec<f64>>,
    wind_speed_10m: Option<Vec<f64>>,
    relative_humidity_2m: Option<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
struct HourlyBlock {
    time: Vec<String>,
    #[serde(default)]
    temperature_2m: Option<Vec<Option<f64>>>,
    #[serde(default)]
    wind_speed_10m: Option<Vec<Option<f64>>>,
    #[serde(default)]
    relative_humidity_2m: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OpenMeteoPayload {
    Response { hourly: HourlyBlock },
    Hourly(HourlyBlock),
}

fn fill_nulls(column: Option<Vec<Option<f64>>>) -> Option<Vec<f64>> {
    column.map(|values| values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

impl ObservationTable {
    /// Create a table from columns, checking that every present column has one value per timestamp
    pub fn new(
        time: Vec<NaiveDateTime>,
        temperature_2m: Option<Vec<f64>>,
        wind_speed_10m: Option<Vec<f64>>,
        relative_humidity_2m: Option<Vec<f64>>,
    ) -> Result<Self> {
        let columns = [
            (TEMPERATURE_COLUMN, &temperature_2m),
            (WIND_SPEED_COLUMN, &wind_speed_10m),
            (HUMIDITY_COLUMN, &relative_humidity_2m),
        ];
        for (name, column) in columns {
            if let Some(values) = column {
                if values.len() != time.len() {
                    return Err(ForecastError::ValidationError(format!(
                        "Column '{}' has {} values but there are {} timestamps",
                        name,
                        values.len(),
                        time.len()
                    )));
                }
            }
        }

        Ok(Self {
            time,
            temperature_2m,
            wind_speed_10m,
            relative_humidity_2m,
        })
    }

    /// Build a complete table from typed observations
    pub fn from_observations(observations: &[Observation]) -> Self {
        Self {
            time: observations.iter().map(|o| o.time).collect(),
            temperature_2m: Some(observations.iter().map(|o| o.temperature_2m).collect()),
            wind_speed_10m: Some(observations.iter().map(|o| o.wind_speed_10m).collect()),
            relative_humidity_2m: Some(
                observations.iter().map(|o| o.relative_humidity_2m).collect(),
            ),
        }
    }

    /// Load observations from a CSV file with a header row
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        Self::from_dataframe(&df)
    }

    /// Extract observations from an existing DataFrame.
    ///
    /// The time column may be text, `Datetime` or `Date`. Numeric columns of any
    /// integer or float type are cast to `f64`; nulls become `NaN`.
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        let names = df.get_column_names();
        if !names.contains(&TIME_COLUMN) {
            return Err(ForecastError::MissingColumn(TIME_COLUMN.to_string()));
        }

        let time = Self::time_column(df.column(TIME_COLUMN)?)?;
        let temperature_2m = Self::optional_f64_column(df, &names, TEMPERATURE_COLUMN)?;
        let wind_speed_10m = Self::optional_f64_column(df, &names, WIND_SPEED_COLUMN)?;
        let relative_humidity_2m = Self::optional_f64_column(df, &names, HUMIDITY_COLUMN)?;

        Self::new(time, temperature_2m, wind_speed_10m, relative_humidity_2m)
    }

    /// Decode an Open-Meteo archive response, or just its `hourly` block
    pub fn from_open_meteo_json(payload: &str) -> Result<Self> {
        let hourly = match serde_json::from_str::<OpenMeteoPayload>(payload)? {
            OpenMeteoPayload::Response { hourly } => hourly,
            OpenMeteoPayload::Hourly(hourly) => hourly,
        };

        let time = hourly
            .time
            .iter()
            .map(|t| parse_timestamp(t))
            .collect::<Result<Vec<_>>>()?;

        Self::new(
            time,
            fill_nulls(hourly.temperature_2m),
            fill_nulls(hourly.wind_speed_10m),
            fill_nulls(hourly.relative_humidity_2m),
        )
    }

    fn time_column(series: &Series) -> Result<Vec<NaiveDateTime>> {
        match series.dtype() {
            DataType::Utf8 => series
                .utf8()?
                .into_iter()
                .enumerate()
                .map(|(i, value)| match value {
                    Some(s) => parse_timestamp(s),
                    None => Err(ForecastError::DataError(format!(
                        "Null timestamp at row {}",
                        i
                    ))),
                })
                .collect(),
            DataType::Datetime(_, _) | DataType::Date => {
                let millis = series.cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
                millis
                    .datetime()?
                    .into_iter()
                    .enumerate()
                    .map(|(i, value)| {
                        value
                            .and_then(DateTime::from_timestamp_millis)
                            .map(|dt| dt.naive_utc())
                            .ok_or_else(|| {
                                ForecastError::DataError(format!("Invalid timestamp at row {}", i))
                            })
                    })
                    .collect()
            }
            other => Err(ForecastError::DataError(format!(
                "Unsupported type for '{}' column: {}",
                TIME_COLUMN, other
            ))),
        }
    }

    fn optional_f64_column(
        df: &DataFrame,
        names: &[&str],
        column_name: &str,
    ) -> Result<Option<Vec<f64>>> {
        if !names.contains(&column_name) {
            return Ok(None);
        }

        let casted = df.column(column_name)?.cast(&DataType::Float64)?;
        let values = casted
            .f64()?
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect();

        Ok(Some(values))
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Timestamps in source order
    pub fn times(&self) -> &[NaiveDateTime] {
        &self.time
    }

    /// Required weather columns absent from the schema
    pub fn missing_columns(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.temperature_2m.is_none() {
            missing.push(TEMPERATURE_COLUMN);
        }
        if self.wind_speed_10m.is_none() {
            missing.push(WIND_SPEED_COLUMN);
        }
        if self.relative_humidity_2m.is_none() {
            missing.push(HUMIDITY_COLUMN);
        }
        missing
    }

    pub fn has_required_columns(&self) -> bool {
        self.missing_columns().is_empty()
    }

    /// Validate the schema and convert to fixed-schema records in source order.
    ///
    /// Fails with `MissingColumn` naming the first absent weather column.
    pub fn to_observations(&self) -> Result<Vec<Observation>> {
        let (Some(temperature), Some(wind), Some(humidity)) = (
            &self.temperature_2m,
            &self.wind_speed_10m,
            &self.relative_humidity_2m,
        ) else {
            let missing = self.missing_columns();
            let first = missing.first().copied().unwrap_or(TEMPERATURE_COLUMN);
            return Err(ForecastError::MissingColumn(first.to_string()));
        };

        Ok(self
            .time
            .iter()
            .enumerate()
            .map(|(i, &time)| Observation::new(time, temperature[i], wind[i], humidity[i]))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_new_rejects_ragged_columns() {
        let result = ObservationTable::new(vec![at(0), at(1)], Some(vec![1.0]), None, None);
        assert!(matches!(result, Err(ForecastError::ValidationError(_))));
    }

    #[test]
    fn test_missing_column_is_reported() {
        let table = ObservationTable::new(
            vec![at(0)],
            Some(vec![1.0]),
            None,
            Some(vec![80.0]),
        )
        .unwrap();

        assert_eq!(table.missing_columns(), vec![WIND_SPEED_COLUMN]);
        match table.to_observations() {
            Err(ForecastError::MissingColumn(name)) => assert_eq!(name, WIND_SPEED_COLUMN),
            other => panic!("Expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_round_trip_through_observations() {
        let observations = vec![
            Observation::new(at(0), 1.0, 2.0, 3.0),
            Observation::new(at(1), 4.0, 5.0, 6.0),
        ];
        let table = ObservationTable::from_observations(&observations);
        assert!(table.has_required_columns());
        assert_eq!(table.to_observations().unwrap(), observations);
    }

    #[test]
    fn test_open_meteo_payload_with_nulls() {
        let payload = r#"{
            "latitude": 52.52,
            "hourly": {
                "time": ["2024-01-01T00:00", "2024-01-01T01:00"],
                "temperature_2m": [1.5, null],
                "wind_speed_10m": [10.0, 12.0],
                "relative_humidity_2m": [90, 91]
            }
        }"#;
        let table = ObservationTable::from_open_meteo_json(payload).unwrap();
        let observations = table.to_observations().unwrap();

        assert_eq!(observations.len(), 2);
        assert_eq!(observations[1].time, at(1));
        assert!(observations[1].temperature_2m.is_nan());
        assert!(!observations[1].is_complete());
        assert_eq!(observations[0].relative_humidity_2m, 90.0);
    }

    #[test]
    fn test_bare_hourly_block_without_humidity() {
        let payload = r#"{"time": ["2024-01-01T00:00"], "temperature_2m": [3.0], "wind_speed_10m": [4.0]}"#;
        let table = ObservationTable::from_open_meteo_json(payload).unwrap();
        assert_eq!(table.missing_columns(), vec![HUMIDITY_COLUMN]);
    }
}
