//! `weather_extract`: pull historic daily weather for a list of locations from the Open-Meteo
//! archive, write it to a CSV file, then insert it into MongoDB.

use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;
use log::info;
use std::path::PathBuf;
use weather_extract::{
    CsvSink, DailyMetricSet, LocationTable, MongoConfig, MongoSink, TableSink, WeatherExtractor,
    DEFAULT_CONFIG_PATH, DEFAULT_CSV_PATH,
};

const DEFAULT_CITIES_PATH: &str = "data/us-state-capitals.csv";

#[derive(Debug, Parser)]
#[command(name = "weather_extract", version, about = "Historic daily weather extract")]
struct Cli {
    /// First day to fetch (YYYY-MM-DD).
    #[arg(short, long)]
    start_date: NaiveDate,

    /// Last day to fetch, inclusive (YYYY-MM-DD).
    #[arg(short, long)]
    end_date: NaiveDate,

    /// CSV with `description`, `name`, `latitude` and `longitude` columns.
    #[arg(short, long, default_value = DEFAULT_CITIES_PATH)]
    cities: PathBuf,

    /// Comma-separated daily metrics, in output column order.
    #[arg(short, long, value_parser = DailyMetricSet::parse)]
    metrics: Option<DailyMetricSet>,

    /// YAML file holding the `mongo` section.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[arg(long, default_value = DEFAULT_CSV_PATH)]
    output: PathBuf,

    /// Where archive responses are cached. Defaults to the platform cache directory.
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Stop after writing the CSV file.
    #[arg(long)]
    skip_mongo: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let locations = LocationTable::load(&cli.cities)
        .await
        .with_context(|| format!("Loading locations from {}", cli.cities.display()))?;

    let extractor = match cli.cache_dir {
        Some(dir) => WeatherExtractor::with_cache_folder(dir).await?,
        None => WeatherExtractor::new().await?,
    };

    let table = extractor
        .extract()
        .locations(&locations)
        .start_date(cli.start_date)
        .end_date(cli.end_date)
        .maybe_metrics(cli.metrics)
        .call()
        .await
        .context("Extracting archive data")?;

    let csv = CsvSink::new(&cli.output);
    extractor.export(&table, &[&csv]).await?;

    if cli.skip_mongo {
        info!("Skipping MongoDB write");
        return Ok(());
    }

    let config = MongoConfig::from_yaml_file(&cli.config).await?;
    let mongo = MongoSink::connect(&config).await?;
    info!("Connected to {}", mongo.name());
    extractor.export(&table, &[&mongo]).await?;

    Ok(())
}
