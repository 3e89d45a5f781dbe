use crate::archive::error::ArchiveError;
use crate::config::error::ConfigError;
use crate::locations::error::LocationError;
use crate::reshape::error::ReshapeError;
use crate::sinks::error::SinkError;
use crate::types::daily_metric::MetricSetError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeatherExtractError {
    #[error(transparent)]
    Location(#[from] LocationError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Reshape(#[from] ReshapeError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    MetricSet(#[from] MetricSetError),

    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to determine cache directory")]
    CacheDirResolution,
}
