use crate::archive::error::ArchiveError;
use crate::types::daily_metric::DailyMetricSet;
use crate::types::location::Location;
use crate::types::units::{PrecipitationUnit, TemperatureUnit, WindSpeedUnit};
use chrono::NaiveDate;
use reqwest::Url;

/// Unit and timezone preferences shared by every location in a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPreferences {
    pub temperature_unit: TemperatureUnit,
    pub wind_speed_unit: WindSpeedUnit,
    pub precipitation_unit: PrecipitationUnit,
    /// IANA timezone name used by the service to delimit days.
    pub timezone: String,
}

impl Default for RequestPreferences {
    fn default() -> Self {
        Self {
            temperature_unit: TemperatureUnit::default(),
            wind_speed_unit: WindSpeedUnit::default(),
            precipitation_unit: PrecipitationUnit::default(),
            timezone: "America/New_York".to_string(),
        }
    }
}

/// A single batched archive request for many locations.
///
/// Coordinates travel as two parallel comma-separated lists; the `i`-th latitude and the
/// `i`-th longitude belong to the `i`-th location.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveRequest {
    url: Url,
}

impl ArchiveRequest {
    pub fn new(
        endpoint: &str,
        locations: &[Location],
        start_date: NaiveDate,
        end_date: NaiveDate,
        metrics: &DailyMetricSet,
        preferences: &RequestPreferences,
    ) -> Result<Self, ArchiveError> {
        let latitudes = join(locations.iter().map(|l| l.latitude));
        let longitudes = join(locations.iter().map(|l| l.longitude));

        let params = [
            ("latitude", latitudes),
            ("longitude", longitudes),
            ("start_date", start_date.format("%Y-%m-%d").to_string()),
            ("end_date", end_date.format("%Y-%m-%d").to_string()),
            ("daily", metrics.query_value()),
            (
                "temperature_unit",
                preferences.temperature_unit.query_value().to_string(),
            ),
            (
                "wind_speed_unit",
                preferences.wind_speed_unit.query_value().to_string(),
            ),
            (
                "precipitation_unit",
                preferences.precipitation_unit.query_value().to_string(),
            ),
            ("timezone", preferences.timezone.clone()),
        ];

        let url = Url::parse_with_params(endpoint, &params)
            .map_err(|e| ArchiveError::InvalidEndpoint(endpoint.to_string(), e.to_string()))?;
        Ok(Self { url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Identity of the request for caching: the full URL, every parameter in order.
    pub fn signature(&self) -> &str {
        self.url.as_str()
    }
}

fn join(values: impl Iterator<Item = f64>) -> String {
    values.map(|v| v.to_string()).collect::<Vec<_>>().join(",")
}
