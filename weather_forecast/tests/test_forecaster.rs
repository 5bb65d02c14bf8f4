use chrono::{Duration, NaiveDate};
use weather_forecast::data::HUMIDITY_COLUMN;
use weather_forecast::forecaster::ForecastStep;
use weather_forecast::{
    FeatureBuilder, ForecastError, ModelTrainer, Observation, ObservationTable,
    RecursiveForecaster, WeatherModel,
};

fn weather_history(hours: usize) -> Vec<Observation> {
    let start = NaiveDate::from_ymd_opt(2024, 9, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    (0..hours)
        .map(|i| {
            let phase = (i % 24) as f64 / 24.0 * std::f64::consts::TAU;
            Observation::new(
                start + Duration::hours(i as i64),
                18.0 + 7.0 * phase.sin(),
                9.0 + 3.0 * phase.cos(),
                55.0 - 20.0 * phase.sin(),
            )
        })
        .collect()
}

fn trained_model(history: &[Observation]) -> WeatherModel {
    let set = FeatureBuilder::new().build(history);
    let outcome = ModelTrainer::new().train(&set);
    assert!(outcome.is_success());
    outcome.production_model
}

#[test]
fn test_forecast_length_and_hourly_ordering() {
    let history = weather_history(24 * 8);
    let model = trained_model(&history);
    let last = history.last().unwrap().time;

    let points = RecursiveForecaster::new(&model)
        .forecast(50, &history)
        .unwrap()
        .unwrap();

    assert_eq!(points.len(), 50);
    assert_eq!(points[0].time, last + Duration::hours(1));
    for pair in points.windows(2) {
        assert_eq!(pair[1].time - pair[0].time, Duration::hours(1));
    }
    assert!(points
        .iter()
        .all(|p| p.values().iter().all(|v| v.is_finite())));
}

#[test]
fn test_first_day_lags_come_from_observations() {
    let history = weather_history(24 * 8);
    let model = trained_model(&history);

    let steps: Vec<ForecastStep> = RecursiveForecaster::new(&model)
        .rollout(24, &history)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    let seed = &history[history.len() - 24..];
    for (step, observed) in steps.iter().zip(seed) {
        assert_eq!(step.features.temp_lag_24h.to_bits(), observed.temperature_2m.to_bits());
        assert_eq!(step.features.wind_lag_24h.to_bits(), observed.wind_speed_10m.to_bits());
        assert_eq!(
            step.features.hum_lag_24h.to_bits(),
            observed.relative_humidity_2m.to_bits()
        );
    }
}

#[test]
fn test_later_lags_are_earlier_predictions() {
    let history = weather_history(24 * 8);
    let model = trained_model(&history);

    let steps: Vec<ForecastStep> = RecursiveForecaster::new(&model)
        .rollout(72, &history)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(steps.len(), 72);
    for i in 24..steps.len() {
        let fed_back = steps[i - 24].point;
        let features = steps[i].features;
        assert_eq!(steps[i].step_index, i);
        assert_eq!(
            features.temp_lag_24h.to_bits(),
            fed_back.predicted_temperature_2m.to_bits()
        );
        assert_eq!(
            features.wind_lag_24h.to_bits(),
            fed_back.predicted_wind_speed_10m.to_bits()
        );
        assert_eq!(
            features.hum_lag_24h.to_bits(),
            fed_back.predicted_relative_humidity_2m.to_bits()
        );
    }
}

#[test]
fn test_rollout_buffer_grows_by_one_per_step() {
    let history = weather_history(24 * 8);
    let model = trained_model(&history);

    let mut rollout = RecursiveForecaster::new(&model).rollout(5, &history).unwrap();
    assert_eq!(rollout.buffer().len(), 24);
    assert_eq!(rollout.last_observed(), history.last().unwrap().time);

    rollout.next().unwrap().unwrap();
    rollout.next().unwrap().unwrap();
    assert_eq!(rollout.step_index(), 2);
    assert_eq!(rollout.buffer().len(), 26);

    assert_eq!(rollout.by_ref().count(), 3);
    assert!(rollout.next().is_none());
}

#[test]
fn test_short_tail_fails_explicitly() {
    let history = weather_history(24 * 8);
    let model = trained_model(&history);
    let tail = &history[history.len() - 10..];

    let result = RecursiveForecaster::new(&model).forecast(24, tail);
    assert!(matches!(
        result,
        Err(ForecastError::ShortBuffer {
            available: 10,
            required: 24
        })
    ));
}

#[test]
fn test_untrained_model_returns_none() {
    let model = WeatherModel::untrained();
    let history = weather_history(48);

    let forecaster = RecursiveForecaster::new(&model);
    assert!(forecaster.forecast(24, &history).unwrap().is_none());

    let table = ObservationTable::from_observations(&history);
    assert!(forecaster.forecast_table(24, &table).unwrap().is_none());
}

#[test]
fn test_missing_column_is_a_hard_failure() {
    let history = weather_history(24 * 8);
    let model = trained_model(&history);

    let table = ObservationTable::new(
        history.iter().map(|o| o.time).collect(),
        Some(history.iter().map(|o| o.temperature_2m).collect()),
        Some(history.iter().map(|o| o.wind_speed_10m).collect()),
        None,
    )
    .unwrap();

    match RecursiveForecaster::new(&model).forecast_table(24, &table) {
        Err(ForecastError::MissingColumn(name)) => assert_eq!(name, HUMIDITY_COLUMN),
        other => panic!("Expected MissingColumn, got {:?}", other),
    }
}

#[test]
fn test_zero_horizon_is_rejected() {
    let history = weather_history(24 * 8);
    let model = trained_model(&history);
    assert!(matches!(
        RecursiveForecaster::new(&model).forecast(0, &history),
        Err(ForecastError::ValidationError(_))
    ));
}

#[test]
fn test_unsorted_tail_is_sorted_first() {
    let history = weather_history(24 * 8);
    let model = trained_model(&history);
    let mut shuffled = history.clone();
    shuffled.reverse();

    let forecaster = RecursiveForecaster::new(&model);
    assert_eq!(
        forecaster.forecast(30, &shuffled).unwrap(),
        forecaster.forecast(30, &history).unwrap()
    );
}

#[test]
fn test_concurrent_forecasts_share_a_read_only_model() {
    let history = weather_history(24 * 8);
    let model = trained_model(&history);
    let expected = RecursiveForecaster::new(&model)
        .forecast(48, &history)
        .unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    RecursiveForecaster::new(&model)
                        .forecast(48, &history)
                        .unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
