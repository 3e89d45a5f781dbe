//! The main entry point: fetch daily archive data for a table of locations, reshape it into
//! one long-format table, and hand that table to any number of sinks.

use crate::archive::client::ArchiveClient;
use crate::error::WeatherExtractError;
use crate::locations::location_table::LocationTable;
use crate::reshape::reshaper::reshape_all;
use crate::sinks::TableSink;
use crate::types::daily_metric::DailyMetricSet;
use crate::types::output_table::OutputTable;
use crate::utils::{default_cache_dir, ensure_cache_dir_exists};
use bon::bon;
use chrono::NaiveDate;
use log::info;
use std::path::PathBuf;

/// Runs the extract pipeline on top of an [`ArchiveClient`].
///
/// Create one with [`WeatherExtractor::new`] (platform cache directory),
/// [`WeatherExtractor::with_cache_folder`], or [`WeatherExtractor::from_client`] when the
/// archive client needs custom settings.
///
/// ```no_run
/// # use weather_extract::{CsvSink, LocationTable, WeatherExtractError, WeatherExtractor};
/// # use chrono::NaiveDate;
/// # use std::path::Path;
/// # async fn run() -> Result<(), WeatherExtractError> {
/// let extractor = WeatherExtractor::new().await?;
/// let locations = LocationTable::load(Path::new("data/us-state-capitals.csv")).await?;
/// let table = extractor
///     .extract()
///     .locations(&locations)
///     .start_date(NaiveDate::from_ymd_opt(2023, 1, 1).unwrap())
///     .end_date(NaiveDate::from_ymd_opt(2023, 1, 31).unwrap())
///     .call()
///     .await?;
/// extractor.export(&table, &[&CsvSink::default()]).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct WeatherExtractor {
    archive: ArchiveClient,
}

#[bon]
impl WeatherExtractor {
    /// Uses `cache_folder` for archive responses, creating it if needed.
    pub async fn with_cache_folder(cache_folder: PathBuf) -> Result<Self, WeatherExtractError> {
        ensure_cache_dir_exists(&cache_folder)
            .await
            .map_err(|e| WeatherExtractError::CacheDirCreation(cache_folder.clone(), e))?;
        let archive = ArchiveClient::builder().cache_dir(cache_folder).build()?;
        Ok(Self { archive })
    }

    /// Uses the platform cache directory (for example `~/.cache/weather_extract_cache`).
    pub async fn new() -> Result<Self, WeatherExtractError> {
        let cache_folder = default_cache_dir().ok_or(WeatherExtractError::CacheDirResolution)?;
        Self::with_cache_folder(cache_folder).await
    }

    pub fn from_client(archive: ArchiveClient) -> Self {
        Self { archive }
    }

    pub fn archive(&self) -> &ArchiveClient {
        &self.archive
    }

    /// Fetches `start_date..=end_date` for every location and reshapes the result.
    ///
    /// `metrics` defaults to [`DailyMetricSet::default`]. Rows come out grouped by location
    /// in table order, dates ascending within each location. Any failure, from the request
    /// down to a single malformed series, fails the whole call.
    #[builder]
    pub async fn extract(
        &self,
        locations: &LocationTable,
        start_date: NaiveDate,
        end_date: NaiveDate,
        metrics: Option<DailyMetricSet>,
    ) -> Result<OutputTable, WeatherExtractError> {
        let metrics = metrics.unwrap_or_default();
        info!(
            "Extracting {} daily metrics for {} locations from {} to {}",
            metrics.len(),
            locations.len(),
            start_date,
            end_date
        );

        let responses = self
            .archive
            .fetch(locations.as_slice(), start_date, end_date, &metrics)
            .await?;
        let table = reshape_all(locations.as_slice(), &responses, &metrics)?;

        info!("Assembled {} rows", table.len());
        Ok(table)
    }

    /// Writes `table` to each sink in turn, stopping at the first failure.
    ///
    /// Sinks that already finished keep their output.
    pub async fn export(
        &self,
        table: &OutputTable,
        sinks: &[&dyn TableSink],
    ) -> Result<(), WeatherExtractError> {
        for sink in sinks {
            let rows = sink.write(table).await?;
            info!("Sink {} wrote {} rows", sink.name(), rows);
        }
        Ok(())
    }
}
