use chrono::{Duration, NaiveDate};
use rstest::rstest;
use weather_forecast::trainer::TrainingStatus;
use weather_forecast::{
    ForecastError, LagAlignment, Observation, ObservationTable, PipelineConfig, WeatherPipeline,
};

fn history_table(hours: usize) -> ObservationTable {
    let start = NaiveDate::from_ymd_opt(2024, 1, 10)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let observations: Vec<Observation> = (0..hours)
        .map(|i| {
            let phase = (i % 24) as f64 / 24.0 * std::f64::consts::TAU;
            Observation::new(
                start + Duration::hours(i as i64),
                2.0 + 4.0 * phase.sin(),
                20.0 + 5.0 * phase.cos(),
                80.0 - 10.0 * phase.sin(),
            )
        })
        .collect();
    ObservationTable::from_observations(&observations)
}

#[test]
fn test_predict_end_to_end() {
    let table = history_table(24 * 8);
    let last = *table.times().last().unwrap();

    let report = WeatherPipeline::default().predict(&table, 2).unwrap();

    assert_eq!(report.model_performance.status, TrainingStatus::Success);
    assert_eq!(report.prediction.len(), 48);
    assert_eq!(report.prediction[0].time, last + Duration::hours(1));
    assert_eq!(report.prediction[47].time, last + Duration::hours(48));
}

#[test]
fn test_report_serializes_for_the_api_layer() {
    let table = history_table(24 * 8);
    let report = WeatherPipeline::default().predict(&table, 1).unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["model_performance"]["status"], "success");
    assert!(json["model_performance"]["r2"].is_number());
    assert!(json["model_performance"]["feature_importance"]["temp_lag_24h"].is_number());
    assert_eq!(json["prediction"].as_array().unwrap().len(), 24);
    assert_eq!(json["prediction"][0]["time"], "2024-01-18T00:00:00");
    assert!(json["prediction"][0]["predicted_relative_humidity_2m"].is_number());
}

#[rstest]
#[case(0)]
#[case(15)]
fn test_days_out_of_range(#[case] days: u32) {
    let table = history_table(24 * 8);
    assert!(matches!(
        WeatherPipeline::default().predict(&table, days),
        Err(ForecastError::ValidationError(_))
    ));
}

#[test]
fn test_insufficient_history() {
    let table = history_table(50);
    assert!(matches!(
        WeatherPipeline::default().predict(&table, 1),
        Err(ForecastError::InsufficientData { .. })
    ));
}

#[test]
fn test_missing_column() {
    let full = history_table(24 * 8);
    let observations = full.to_observations().unwrap();
    let table = ObservationTable::new(
        full.times().to_vec(),
        None,
        Some(observations.iter().map(|o| o.wind_speed_10m).collect()),
        Some(observations.iter().map(|o| o.relative_humidity_2m).collect()),
    )
    .unwrap();

    assert!(matches!(
        WeatherPipeline::default().predict(&table, 1),
        Err(ForecastError::MissingColumn(_))
    ));
}

#[test]
fn test_calendar_alignment_config() {
    let config = PipelineConfig::from_toml_str(
        r#"
        max_forecast_days = 16
        lag_alignment = "calendar"
        "#,
    )
    .unwrap();
    assert_eq!(config.lag_alignment, LagAlignment::Calendar);

    let pipeline = WeatherPipeline::new(config);
    let report = pipeline.predict(&history_table(24 * 8), 16).unwrap();
    assert_eq!(report.prediction.len(), 16 * 24);
    assert_eq!(pipeline.config().max_forecast_days, 16);
}
