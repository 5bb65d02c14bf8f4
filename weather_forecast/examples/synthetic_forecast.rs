use chrono::{Datelike, Duration, NaiveDate, Timelike};
use weather_forecast::{Observation, ObservationTable, PipelineConfig, WeatherPipeline};

// Sixty days of hourly weather with a daily temperature cycle and a slow seasonal drift
fn synthetic_history() -> Vec<Observation> {
    let start = NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();

    (0..60 * 24)
        .map(|i| {
            let time = start + Duration::hours(i);
            let daily = (time.hour() as f64 / 24.0 * std::f64::consts::TAU).sin();
            let seasonal = time.ordinal() as f64 * 0.1;
            Observation::new(
                time,
                8.0 + seasonal + 5.0 * daily,
                12.0 + 3.0 * daily.abs(),
                70.0 - 10.0 * daily,
            )
        })
        .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let table = ObservationTable::from_observations(&synthetic_history());
    println!("Loaded {} hourly observations", table.len());

    let report = WeatherPipeline::new(PipelineConfig::default()).predict(&table, 3)?;

    println!(
        "Hold-out r2: {:.3}, mae: {:.3}",
        report.model_performance.r2.unwrap_or(f64::NAN),
        report.model_performance.mae.unwrap_or(f64::NAN)
    );
    for (name, importance) in &report.model_performance.feature_importance {
        println!("  {:<12} {:.3}", name, importance);
    }

    for point in report.prediction.iter().step_by(6) {
        println!(
            "{}  temp {:>6.2} °C  wind {:>6.2} km/h  humidity {:>6.2} %",
            point.time,
            point.predicted_temperature_2m,
            point.predicted_wind_speed_10m,
            point.predicted_relative_humidity_2m
        );
    }

    Ok(())
}
