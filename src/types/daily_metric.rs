//! Defines the daily weather metrics that can be requested from the Open-Meteo archive,
//! and the ordered [`DailyMetricSet`] that binds each metric to a value series by position.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A single daily aggregate offered by the Open-Meteo historical archive.
///
/// The variant names are Rust-friendly; [`DailyMetric::api_name`] gives the exact
/// parameter name the service expects in the `daily` query parameter, which is also
/// used as the column name in every output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DailyMetric {
    /// Maximum air temperature at 2 meters.
    TemperatureMax,
    /// Minimum air temperature at 2 meters.
    TemperatureMin,
    /// Mean air temperature at 2 meters.
    TemperatureMean,
    /// Seconds of daylight.
    DaylightDuration,
    /// Seconds of sunshine.
    SunshineDuration,
    /// Sum of daily precipitation (rain, showers and snowfall).
    PrecipitationSum,
    /// Sum of daily rain.
    RainSum,
    /// Sum of daily snowfall.
    SnowfallSum,
    /// Maximum wind speed at 10 meters.
    WindSpeedMax,
    /// Maximum wind gusts at 10 meters.
    WindGustsMax,
    /// Dominant wind direction at 10 meters, in degrees.
    WindDirectionDominant,
}

impl DailyMetric {
    /// Every metric, in the default request order.
    pub const ALL: [DailyMetric; 11] = [
        DailyMetric::TemperatureMax,
        DailyMetric::TemperatureMin,
        DailyMetric::TemperatureMean,
        DailyMetric::DaylightDuration,
        DailyMetric::SunshineDuration,
        DailyMetric::PrecipitationSum,
        DailyMetric::RainSum,
        DailyMetric::SnowfallSum,
        DailyMetric::WindSpeedMax,
        DailyMetric::WindGustsMax,
        DailyMetric::WindDirectionDominant,
    ];

    pub fn api_name(&self) -> &'static str {
        match self {
            DailyMetric::TemperatureMax => "temperature_2m_max",
            DailyMetric::TemperatureMin => "temperature_2m_min",
            DailyMetric::TemperatureMean => "temperature_2m_mean",
            DailyMetric::DaylightDuration => "daylight_duration",
            DailyMetric::SunshineDuration => "sunshine_duration",
            DailyMetric::PrecipitationSum => "precipitation_sum",
            DailyMetric::RainSum => "rain_sum",
            DailyMetric::SnowfallSum => "snowfall_sum",
            DailyMetric::WindSpeedMax => "wind_speed_10m_max",
            DailyMetric::WindGustsMax => "wind_gusts_10m_max",
            DailyMetric::WindDirectionDominant => "wind_direction_10m_dominant",
        }
    }
}

/// Formats a `DailyMetric` using its service parameter name.
///
/// # Examples
///
/// ```
/// use weather_extract::DailyMetric;
///
/// assert_eq!(DailyMetric::RainSum.to_string(), "rain_sum");
/// ```
impl fmt::Display for DailyMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetricSetError {
    #[error("Unknown daily metric '{0}'")]
    UnknownMetric(String),

    #[error("Daily metric '{0}' requested more than once")]
    Duplicate(DailyMetric),

    #[error("At least one daily metric must be requested")]
    Empty,
}

impl FromStr for DailyMetric {
    type Err = MetricSetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        DailyMetric::ALL
            .into_iter()
            .find(|metric| metric.api_name() == trimmed)
            .ok_or_else(|| MetricSetError::UnknownMetric(trimmed.to_string()))
    }
}

/// The ordered list of daily metrics requested for every location.
///
/// Order is the contract here. The archive answers with one value series per requested
/// metric, in request order, and nothing in the response names the series. Index `k` of
/// this set is therefore the only thing tying the `k`-th series of a response to a metric,
/// so the same `DailyMetricSet` must be used to build the request and to reshape its
/// responses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DailyMetricSet(Vec<DailyMetric>);

impl DailyMetricSet {
    /// Creates a set from an ordered list. Duplicates and empty lists are rejected,
    /// since either would make the positional binding ambiguous.
    pub fn new(metrics: Vec<DailyMetric>) -> Result<Self, MetricSetError> {
        if metrics.is_empty() {
            return Err(MetricSetError::Empty);
        }
        for (i, metric) in metrics.iter().enumerate() {
            if metrics[..i].contains(metric) {
                return Err(MetricSetError::Duplicate(*metric));
            }
        }
        Ok(Self(metrics))
    }

    /// Parses a comma-separated list of service parameter names, keeping their order.
    ///
    /// ```
    /// use weather_extract::{DailyMetric, DailyMetricSet};
    ///
    /// let set = DailyMetricSet::parse("rain_sum, temperature_2m_max").unwrap();
    /// assert_eq!(set.as_slice(), &[DailyMetric::RainSum, DailyMetric::TemperatureMax]);
    /// ```
    pub fn parse(names: &str) -> Result<Self, MetricSetError> {
        let metrics = names
            .split(',')
            .filter(|name| !name.trim().is_empty())
            .map(DailyMetric::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(metrics)
    }

    pub fn as_slice(&self) -> &[DailyMetric] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &DailyMetric> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Position of `metric` in this set, which is also the index of its value series.
    pub fn position(&self, metric: DailyMetric) -> Option<usize> {
        self.0.iter().position(|m| *m == metric)
    }

    /// The `daily` query parameter value: names joined by commas, in set order.
    pub(crate) fn query_value(&self) -> String {
        self.0
            .iter()
            .map(DailyMetric::api_name)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl Default for DailyMetricSet {
    fn default() -> Self {
        Self(DailyMetric::ALL.to_vec())
    }
}
