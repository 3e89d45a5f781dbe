//! Per-location archive responses and their decoding from the service's JSON.

use crate::archive::error::ArchiveError;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Seconds between two daily samples.
pub const DAILY_INTERVAL_SECONDS: i64 = 86_400;

const KEY_TIME: &str = "time";

/// The daily block of one location, as returned by the archive.
///
/// `series[k]` is the value series of the `k`-th metric *in the order the service emitted
/// it*, which is the order the metrics were requested in. No metric names are kept here.
/// Every series is expected to hold `(end - start) / interval` values, one per sampling
/// interval in `[start, end)`; the reshaper enforces this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationWeatherResponse {
    /// Latitude echoed by the service (grid-snapped, not the requested value).
    pub latitude: f64,
    /// Longitude echoed by the service.
    pub longitude: f64,
    pub utc_offset_seconds: i64,
    /// Unix seconds of the first sample.
    pub start: i64,
    /// Unix seconds one interval past the last sample (exclusive).
    pub end: i64,
    /// Seconds between samples.
    pub interval: i64,
    pub series: Vec<Vec<Option<f64>>>,
}

impl LocationWeatherResponse {
    /// Checks that the response holds one series per requested metric, each with exactly
    /// one value per sampling interval in `[start, end)`.
    pub(crate) fn check_shape(
        &self,
        location: usize,
        metric_count: usize,
    ) -> Result<(), ArchiveError> {
        let malformed = |message: String| ArchiveError::MalformedResponse { location, message };

        let span = self.end - self.start;
        if self.interval <= 0 || span < 0 || span % self.interval != 0 {
            return Err(malformed(format!(
                "span {span}s is not a whole number of {}s intervals",
                self.interval
            )));
        }
        if self.series.len() != metric_count {
            return Err(malformed(format!(
                "expected {metric_count} series, found {}",
                self.series.len()
            )));
        }
        let count = (span / self.interval) as usize;
        if let Some((k, series)) = self
            .series
            .iter()
            .enumerate()
            .find(|(_, series)| series.len() != count)
        {
            return Err(malformed(format!(
                "series {k} has {} values, expected {count}",
                series.len()
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct WireLocation {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    utc_offset_seconds: i64,
    #[serde(default)]
    daily: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct WireError {
    error: bool,
    reason: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireBody {
    Error(WireError),
    Many(Vec<WireLocation>),
    One(WireLocation),
}

/// Extracts the `reason` from an archive error body, if the body is one.
pub(crate) fn error_reason(body: &str) -> Option<String> {
    serde_json::from_str::<WireError>(body)
        .ok()
        .filter(|e| e.error)
        .map(|e| e.reason)
}

/// Decodes a JSON archive body into one response per location, in body order.
///
/// A single location comes back as a bare object, several as an array.
pub(crate) fn decode_body(body: &str) -> Result<Vec<LocationWeatherResponse>, ArchiveError> {
    let wire = match serde_json::from_str::<WireBody>(body) {
        Ok(WireBody::Error(e)) if e.error => return Err(ArchiveError::Api(e.reason)),
        Ok(WireBody::Many(locations)) => locations,
        Ok(WireBody::One(location)) => vec![location],
        // Either a `reason` with the error flag unset, or no match at all. Re-parse strictly
        // as locations to surface a precise serde error instead of the untagged one.
        Ok(WireBody::Error(_)) | Err(_) => match serde_json::from_str::<Vec<WireLocation>>(body) {
            Ok(locations) => locations,
            Err(_) => vec![serde_json::from_str::<WireLocation>(body)?],
        },
    };

    wire.into_iter()
        .enumerate()
        .map(|(idx, location)| decode_location(idx, location))
        .collect()
}

fn decode_location(
    idx: usize,
    wire: WireLocation,
) -> Result<LocationWeatherResponse, ArchiveError> {
    let malformed = |message: String| ArchiveError::MalformedResponse {
        location: idx,
        message,
    };

    let daily = wire
        .daily
        .ok_or_else(|| malformed("no daily block in response".to_string()))?;

    let mut times = None;
    let mut series = Vec::with_capacity(daily.len().saturating_sub(1));
    // Map iteration follows document order (serde_json `preserve_order`), which keeps
    // the series in the positions the service emitted them.
    for (key, value) in daily {
        if key == KEY_TIME {
            times = Some(decode_times(value).map_err(malformed)?);
        } else {
            series.push(
                decode_series(value)
                    .map_err(|message| malformed(format!("series '{key}': {message}")))?,
            );
        }
    }
    let times = times.ok_or_else(|| malformed("daily block has no time axis".to_string()))?;

    // Dates are local calendar days; each row is stamped with local midnight in UTC.
    let start = match times.first() {
        Some(first) => {
            first.and_time(NaiveTime::MIN).and_utc().timestamp() - wire.utc_offset_seconds
        }
        None => 0,
    };
    for (i, date) in times.iter().enumerate() {
        let expected = times[0] + chrono::Days::new(i as u64);
        if *date != expected {
            return Err(malformed(format!(
                "time axis is not a run of consecutive days: expected {expected} at position {i}, found {date}"
            )));
        }
    }
    let end = start + times.len() as i64 * DAILY_INTERVAL_SECONDS;

    Ok(LocationWeatherResponse {
        latitude: wire.latitude,
        longitude: wire.longitude,
        utc_offset_seconds: wire.utc_offset_seconds,
        start,
        end,
        interval: DAILY_INTERVAL_SECONDS,
        series,
    })
}

fn decode_times(value: Value) -> Result<Vec<NaiveDate>, String> {
    let Value::Array(items) = value else {
        return Err("time axis is not an array".to_string());
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::String(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                .map_err(|e| format!("invalid date '{s}': {e}")),
            other => Err(format!("invalid date {other}")),
        })
        .collect()
}

fn decode_series(value: Value) -> Result<Vec<Option<f64>>, String> {
    let Value::Array(items) = value else {
        return Err("not an array".to_string());
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::Null => Ok(None),
            Value::Number(n) => n
                .as_f64()
                .map(Some)
                .ok_or_else(|| format!("value {n} is not representable as f64")),
            other => Err(format!("unexpected value {other}")),
        })
        .collect()
}
