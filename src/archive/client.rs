use crate::archive::cache::ResponseCache;
use crate::archive::error::ArchiveError;
use crate::archive::request::{ArchiveRequest, RequestPreferences};
use crate::archive::response::{decode_body, error_reason, LocationWeatherResponse};
use crate::archive::retry::RetryPolicy;
use crate::types::daily_metric::DailyMetricSet;
use crate::types::location::Location;
use crate::types::units::{PrecipitationUnit, TemperatureUnit, WindSpeedUnit};
use bon::bon;
use chrono::NaiveDate;
use log::{debug, info, warn};
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;

/// The public Open-Meteo historical weather endpoint.
pub const ARCHIVE_URL: &str = "https://archive-api.open-meteo.com/v1/archive";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_REASON_LEN: usize = 200;

/// Client for the Open-Meteo historical archive.
///
/// Each call to [`ArchiveClient::fetch`] issues one batched request for all given
/// locations, retried on transient failures according to the client's [`RetryPolicy`],
/// and answered from the on-disk [`ResponseCache`] when an identical request was made
/// before.
#[derive(Debug, Clone)]
pub struct ArchiveClient {
    http: Client,
    endpoint: String,
    preferences: RequestPreferences,
    retry: RetryPolicy,
    cache: Option<ResponseCache>,
}

#[bon]
impl ArchiveClient {
    /// Creates a client. Every argument is optional.
    ///
    /// * `.endpoint(String)`: archive URL, defaults to [`ARCHIVE_URL`].
    /// * `.cache_dir(PathBuf)`: where responses are cached. Without it nothing is cached.
    /// * `.retry(RetryPolicy)`: defaults to [`RetryPolicy::default`].
    /// * `.timeout(Duration)`: per-attempt timeout, defaults to 60 seconds.
    /// * `.temperature_unit(..)`, `.wind_speed_unit(..)`, `.precipitation_unit(..)`,
    ///   `.timezone(String)`: request preferences, defaulting to Fahrenheit, mph, inches
    ///   and `America/New_York`.
    ///
    /// ```no_run
    /// # use weather_extract::{ArchiveClient, ArchiveError, RetryPolicy};
    /// # fn run() -> Result<(), ArchiveError> {
    /// let client = ArchiveClient::builder()
    ///     .cache_dir(std::env::temp_dir().join("weather_extract_cache"))
    ///     .retry(RetryPolicy::default())
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub fn new(
        endpoint: Option<String>,
        cache_dir: Option<PathBuf>,
        retry: Option<RetryPolicy>,
        timeout: Option<Duration>,
        temperature_unit: Option<TemperatureUnit>,
        wind_speed_unit: Option<WindSpeedUnit>,
        precipitation_unit: Option<PrecipitationUnit>,
        timezone: Option<String>,
    ) -> Result<Self, ArchiveError> {
        let http = Client::builder()
            .timeout(timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()
            .map_err(ArchiveError::ClientBuild)?;

        let defaults = RequestPreferences::default();
        let preferences = RequestPreferences {
            temperature_unit: temperature_unit.unwrap_or(defaults.temperature_unit),
            wind_speed_unit: wind_speed_unit.unwrap_or(defaults.wind_speed_unit),
            precipitation_unit: precipitation_unit.unwrap_or(defaults.precipitation_unit),
            timezone: timezone.unwrap_or(defaults.timezone),
        };

        Ok(Self {
            http,
            endpoint: endpoint.unwrap_or_else(|| ARCHIVE_URL.to_string()),
            preferences,
            retry: retry.unwrap_or_default(),
            cache: cache_dir.as_deref().map(ResponseCache::new),
        })
    }

    pub fn cache(&self) -> Option<&ResponseCache> {
        self.cache.as_ref()
    }

    pub fn preferences(&self) -> &RequestPreferences {
        &self.preferences
    }

    /// Fetches daily series for every location in one batched request.
    ///
    /// The result holds exactly one response per location, in the same order as
    /// `locations`. Responses carry no location labels, only grid-snapped coordinates, so
    /// callers must match them to locations by position.
    ///
    /// An empty `locations` slice returns an empty result without any network traffic.
    pub async fn fetch(
        &self,
        locations: &[Location],
        start_date: NaiveDate,
        end_date: NaiveDate,
        metrics: &DailyMetricSet,
    ) -> Result<Vec<LocationWeatherResponse>, ArchiveError> {
        if end_date < start_date {
            return Err(ArchiveError::InvalidDateRange {
                start: start_date,
                end: end_date,
            });
        }
        if locations.is_empty() {
            info!("No locations given, skipping archive request");
            return Ok(Vec::new());
        }

        let request = ArchiveRequest::new(
            &self.endpoint,
            locations,
            start_date,
            end_date,
            metrics,
            &self.preferences,
        )?;

        if let Some(cache) = &self.cache {
            if let Some(responses) = cache.get(request.signature()).await? {
                match check_responses(locations.len(), &responses, metrics) {
                    Ok(()) => return Ok(responses),
                    Err(e) => warn!("Ignoring unusable cache entry: {e}"),
                }
            }
            warn!(
                "Cache miss for {} locations from {} to {}. Downloading.",
                locations.len(),
                start_date,
                end_date
            );
        }

        let body = self.send_with_retry(&request).await?;
        let responses = decode_body(&body)?;
        // Only well-formed responses reach the cache, which never expires.
        check_responses(locations.len(), &responses, metrics)?;
        info!(
            "Received daily data for {} locations from {}",
            responses.len(),
            self.endpoint
        );

        if let Some(cache) = &self.cache {
            cache.put(request.signature(), &responses).await?;
        }
        Ok(responses)
    }

    /// Sends the request, retrying transient failures with exponential backoff.
    async fn send_with_retry(&self, request: &ArchiveRequest) -> Result<String, ArchiveError> {
        let url = request.url().as_str();
        let max_attempts = self.retry.max_attempts();
        let mut attempt = 1;

        loop {
            debug!("Archive request attempt {attempt}/{max_attempts}: {url}");
            match self.send_once(request).await {
                Ok(body) => return Ok(body),
                Err(failure) if failure.is_retryable() && attempt < max_attempts => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        "Archive request attempt {attempt}/{max_attempts} failed ({failure}), retrying in {delay:?}"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(failure) => return Err(failure.into_error(url, attempt)),
            }
        }
    }

    async fn send_once(&self, request: &ArchiveRequest) -> Result<String, AttemptFailure> {
        let response = self
            .http
            .get(request.url().clone())
            .send()
            .await
            .map_err(AttemptFailure::Transport)?;

        let status = response.status();
        let body = response.text().await.map_err(AttemptFailure::Transport)?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(AttemptFailure::Status { status, body })
        }
    }
}

fn check_responses(
    expected: usize,
    responses: &[LocationWeatherResponse],
    metrics: &DailyMetricSet,
) -> Result<(), ArchiveError> {
    if expected != responses.len() {
        return Err(ArchiveError::ResponseCountMismatch {
            expected,
            found: responses.len(),
        });
    }
    responses
        .iter()
        .enumerate()
        .try_for_each(|(idx, response)| response.check_shape(idx, metrics.len()))
}

/// Why a single attempt failed.
#[derive(Debug)]
enum AttemptFailure {
    Transport(reqwest::Error),
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

impl AttemptFailure {
    fn is_retryable(&self) -> bool {
        match self {
            AttemptFailure::Transport(e) => RetryPolicy::is_retryable_error(e),
            AttemptFailure::Status { status, .. } => RetryPolicy::is_retryable_status(*status),
        }
    }

    fn into_error(self, url: &str, attempts: u32) -> ArchiveError {
        match self {
            AttemptFailure::Transport(source) => ArchiveError::NetworkRequest {
                url: url.to_string(),
                attempts,
                source,
            },
            AttemptFailure::Status { status, body } => ArchiveError::HttpStatus {
                url: url.to_string(),
                status,
                attempts,
                reason: error_reason(&body).unwrap_or_else(|| truncate(&body)),
            },
        }
    }
}

impl std::fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptFailure::Transport(e) => write!(f, "{e}"),
            AttemptFailure::Status { status, .. } => write!(f, "status {status}"),
        }
    }
}

fn truncate(body: &str) -> String {
    match body.char_indices().nth(MAX_REASON_LEN) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ARCHIVE_PATH: &str = "/v1/archive";

    fn body_for(coords: &[(f64, f64)]) -> serde_json::Value {
        let blocks: Vec<_> = coords
            .iter()
            .map(|(lat, lon)| {
                json!({
                    "latitude": lat,
                    "longitude": lon,
                    "utc_offset_seconds": -18000,
                    "daily": {
                        "time": ["2020-01-01", "2020-01-02"],
                        "temperature_2m_max": [40.0, 41.0],
                        "rain_sum": [0.0, null]
                    }
                })
            })
            .collect();
        json!(blocks)
    }

    fn locations() -> Vec<Location> {
        vec![
            Location::new("CityA", "StateA", 10.0, 20.0),
            Location::new("CityB", "StateB", 30.0, 40.0),
        ]
    }

    fn metrics() -> DailyMetricSet {
        DailyMetricSet::parse("temperature_2m_max,rain_sum").unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, d).unwrap()
    }

    fn client(server: &MockServer, cache_dir: Option<PathBuf>) -> ArchiveClient {
        ArchiveClient::builder()
            .endpoint(format!("{}{}", server.uri(), ARCHIVE_PATH))
            .maybe_cache_dir(cache_dir)
            .retry(RetryPolicy::new(2, Duration::ZERO))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn fetch_sends_one_batched_request() -> Result<(), ArchiveError> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ARCHIVE_PATH))
            .and(query_param("latitude", "10,30"))
            .and(query_param("longitude", "20,40"))
            .and(query_param("daily", "temperature_2m_max,rain_sum"))
            .and(query_param("start_date", "2020-01-01"))
            .and(query_param("end_date", "2020-01-02"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(body_for(&[(10.0, 20.0), (30.0, 40.0)])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let responses = client(&server, None)
            .fetch(&locations(), day(1), day(2), &metrics())
            .await?;
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[1].latitude, 30.0);
        assert_eq!(responses[0].series[1], vec![Some(0.0), None]);
        Ok(())
    }

    #[tokio::test]
    async fn transient_failures_are_retried() -> Result<(), ArchiveError> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ARCHIVE_PATH))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(ARCHIVE_PATH))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(body_for(&[(10.0, 20.0), (30.0, 40.0)])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let responses = client(&server, None)
            .fetch(&locations(), day(1), day(2), &metrics())
            .await?;
        assert_eq!(responses.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn exhausted_retries_fail_the_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ARCHIVE_PATH))
            .respond_with(ResponseTemplate::new(502))
            .expect(3)
            .mount(&server)
            .await;

        let err = client(&server, None)
            .fetch(&locations(), day(1), day(2), &metrics())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::HttpStatus { attempts: 3, status, .. } if status == reqwest::StatusCode::BAD_GATEWAY
        ));
    }

    #[tokio::test]
    async fn client_errors_are_not_retried_and_keep_the_reason() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ARCHIVE_PATH))
            .respond_with(ResponseTemplate::new(400).set_body_json(
                json!({ "error": true, "reason": "Cannot initialize WeatherVariable from invalid String value" }),
            ))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server, None)
            .fetch(&locations(), day(1), day(2), &metrics())
            .await
            .unwrap_err();
        match err {
            ArchiveError::HttpStatus {
                attempts, reason, ..
            } => {
                assert_eq!(attempts, 1);
                assert!(reason.starts_with("Cannot initialize"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn identical_requests_are_served_from_cache() -> Result<(), ArchiveError> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ARCHIVE_PATH))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(body_for(&[(10.0, 20.0), (30.0, 40.0)])),
            )
            .expect(1)
            .mount(&server)
            .await;
        let cache_dir = tempfile::tempdir().unwrap();
        let client = client(&server, Some(cache_dir.path().to_path_buf()));

        let first = client.fetch(&locations(), day(1), day(2), &metrics()).await?;
        let second = client.fetch(&locations(), day(1), day(2), &metrics()).await?;
        assert_eq!(first, second);
        Ok(())
    }

    #[tokio::test]
    async fn response_count_must_match_location_count() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ARCHIVE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(body_for(&[(10.0, 20.0)])))
            .mount(&server)
            .await;

        let err = client(&server, None)
            .fetch(&locations(), day(1), day(2), &metrics())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::ResponseCountMismatch {
                expected: 2,
                found: 1
            }
        ));
    }

    #[tokio::test]
    async fn malformed_responses_are_not_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ARCHIVE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "latitude": 10.0,
                "longitude": 20.0,
                "daily": {
                    "time": ["2020-01-01", "2020-01-02"],
                    "temperature_2m_max": [1.0, 2.0],
                    "rain_sum": [0.0]
                }
            })))
            // Both calls reach the network: nothing was cached by the first.
            .expect(2)
            .mount(&server)
            .await;
        let cache_dir = tempfile::tempdir().unwrap();
        let client = client(&server, Some(cache_dir.path().to_path_buf()));
        let one = [Location::new("CityA", "StateA", 10.0, 20.0)];

        for _ in 0..2 {
            let err = client
                .fetch(&one, day(1), day(2), &metrics())
                .await
                .unwrap_err();
            assert!(matches!(err, ArchiveError::MalformedResponse { location: 0, .. }));
        }
        assert_eq!(std::fs::read_dir(cache_dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn series_count_must_match_metric_count() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ARCHIVE_PATH))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(body_for(&[(10.0, 20.0), (30.0, 40.0)])),
            )
            .mount(&server)
            .await;

        let err = client(&server, None)
            .fetch(
                &locations(),
                day(1),
                day(2),
                &DailyMetricSet::parse("temperature_2m_max").unwrap(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ArchiveError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn empty_locations_skip_the_network() -> Result<(), ArchiveError> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let responses = client(&server, None)
            .fetch(&[], day(1), day(2), &metrics())
            .await?;
        assert!(responses.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn reversed_dates_are_rejected() {
        let server = MockServer::start().await;
        let err = client(&server, None)
            .fetch(&locations(), day(3), day(1), &metrics())
            .await
            .unwrap_err();
        assert!(matches!(err, ArchiveError::InvalidDateRange { .. }));
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(500);
        let reason = truncate(&body);
        assert_eq!(reason.len(), MAX_REASON_LEN + 3);
        assert_eq!(truncate("short"), "short");
    }
}
