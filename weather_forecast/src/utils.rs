//! Utility functions for the weather_forecast crate

use crate::error::{ForecastError, Result};
use chrono::{DateTime, NaiveDateTime};

/// Timestamp layouts accepted for the `time` column
pub const TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// Parse an hourly timestamp.
///
/// Open-Meteo emits local wall-clock times without an offset (`2024-01-01T13:00`).
/// RFC 3339 strings with an offset are accepted too and keep their local wall time.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    let value = value.trim();
    for format in TIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(ts);
        }
    }

    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.naive_local())
        .map_err(|_| ForecastError::DataError(format!("Unparseable timestamp: '{}'", value)))
}

/// Number of leading rows that go to the training block: `floor(len * train_fraction)`
pub fn split_index(len: usize, train_fraction: f64) -> usize {
    ((len as f64) * train_fraction).floor() as usize
}

/// Split rows into a leading training block and a trailing held-out block.
///
/// Order is preserved, no shuffling.
pub fn chronological_split<T>(rows: &[T], train_fraction: f64) -> (&[T], &[T]) {
    let idx = split_index(rows.len(), train_fraction).min(rows.len());
    rows.split_at(idx)
}
