mod archive;
mod config;
mod error;
mod extractor;
mod locations;
mod reshape;
mod sinks;
mod types;
mod utils;

pub use error::WeatherExtractError;
pub use extractor::*;

pub use archive::cache::ResponseCache;
pub use archive::client::{ArchiveClient, ARCHIVE_URL};
pub use archive::request::RequestPreferences;
pub use archive::response::{LocationWeatherResponse, DAILY_INTERVAL_SECONDS};
pub use archive::retry::RetryPolicy;

pub use config::mongo_config::{MongoConfig, DEFAULT_CONFIG_PATH};

pub use locations::location_table::LocationTable;

pub use reshape::reshaper::{reshape_all, reshape_location};

pub use sinks::csv_sink::{to_dataframe, CsvSink, DEFAULT_CSV_PATH};
pub use sinks::mongo_sink::{to_documents, MongoSink};
pub use sinks::TableSink;

pub use types::daily_metric::{DailyMetric, DailyMetricSet, MetricSetError};
pub use types::location::Location;
pub use types::output_table::OutputTable;
pub use types::units::{PrecipitationUnit, TemperatureUnit, WindSpeedUnit};
pub use types::weather_row::WeatherRow;

pub use utils::{default_cache_dir, CACHE_DIR_NAME};

pub use archive::error::ArchiveError;
pub use config::error::ConfigError;
pub use locations::error::LocationError;
pub use reshape::error::ReshapeError;
pub use sinks::error::SinkError;
