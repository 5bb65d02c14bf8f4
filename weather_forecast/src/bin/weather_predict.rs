use argh::FromArgs;
use std::process;
use weather_forecast::error::Result;
use weather_forecast::{ObservationTable, PipelineConfig, WeatherPipeline};

#[derive(FromArgs)]
/// Train on hourly observations and forecast the following days as JSON
struct Args {
    /// CSV file with time, temperature_2m, wind_speed_10m and relative_humidity_2m columns
    #[argh(positional)]
    csv_path: String,

    /// number of days to forecast
    #[argh(positional, default = "7")]
    days: u32,

    /// path to a TOML pipeline configuration
    #[argh(option, short = 'c')]
    config: Option<String>,
}

fn run(args: &Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };

    log::info!("Loading observations from {}", args.csv_path);
    let history = ObservationTable::from_csv(&args.csv_path)?;

    let report = WeatherPipeline::new(config).predict(&history, args.days)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

fn main() {
    let env = env_logger::Env::default().default_filter_or("info");
    env_logger::init_from_env(env);

    let args: Args = argh::from_env();

    if let Err(e) = run(&args) {
        log::error!("Prediction failed: {}", e);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> std::result::Result<Args, argh::EarlyExit> {
        Args::from_args(&["weather_predict"], args)
    }

    #[test]
    fn test_days_default_to_a_week() {
        let args = parse(&["history.csv"]).unwrap();
        assert_eq!(args.csv_path, "history.csv");
        assert_eq!(args.days, 7);
        assert!(args.config.is_none());
    }

    #[test]
    fn test_days_and_config() {
        let args = parse(&["history.csv", "3", "-c", "pipeline.toml"]).unwrap();
        assert_eq!(args.days, 3);
        assert_eq!(args.config.as_deref(), Some("pipeline.toml"));

        let args = parse(&["--config", "pipeline.toml", "history.csv"]).unwrap();
        assert_eq!(args.days, 7);
        assert_eq!(args.config.as_deref(), Some("pipeline.toml"));
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["history.csv", "three"]).is_err());
    }
}
