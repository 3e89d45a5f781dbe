//! Turns per-location archive responses into long-format [`WeatherRow`]s.

use crate::archive::response::LocationWeatherResponse;
use crate::reshape::error::ReshapeError;
use crate::types::daily_metric::DailyMetricSet;
use crate::types::location::Location;
use crate::types::output_table::OutputTable;
use crate::types::weather_row::WeatherRow;
use chrono::DateTime;
use log::info;

/// Reshapes one location's response into one row per sampling interval in `[start, end)`.
///
/// Row `i` is stamped `start + i * interval` and takes index `i` of every series. The
/// `k`-th series is bound to the `k`-th metric of `metrics` purely by position, so
/// `metrics` must be the set the request was built from.
///
/// The response is fully validated before any row is produced: the span must be a whole
/// number of intervals, and there must be exactly one series per metric, each with exactly
/// one value per interval. Labels and coordinates come from `location`, never from the
/// response's coordinate echo.
///
/// `location_idx` is only used to make errors point at the offending input row.
pub fn reshape_location(
    location_idx: usize,
    location: &Location,
    response: &LocationWeatherResponse,
    metrics: &DailyMetricSet,
) -> Result<Vec<WeatherRow>, ReshapeError> {
    let count = interval_count(location_idx, response)?;

    if response.series.len() != metrics.len() {
        return Err(ReshapeError::SeriesCount {
            location: location_idx,
            expected: metrics.len(),
            found: response.series.len(),
        });
    }
    for (metric, series) in metrics.iter().zip(&response.series) {
        if series.len() != count {
            return Err(ReshapeError::SeriesLength {
                location: location_idx,
                metric: metric.to_string(),
                expected: count,
                found: series.len(),
            });
        }
    }

    (0..count)
        .map(|i| {
            let timestamp = response.start + i as i64 * response.interval;
            let date = DateTime::from_timestamp(timestamp, 0).ok_or(
                ReshapeError::TimestampOutOfRange {
                    location: location_idx,
                    timestamp,
                },
            )?;
            Ok(WeatherRow {
                index: i,
                date,
                values: response.series.iter().map(|series| series[i]).collect(),
                description: location.description.clone(),
                name: location.name.clone(),
                latitude: location.latitude,
                longitude: location.longitude,
            })
        })
        .collect()
}

/// Number of whole sampling intervals in `[start, end)`.
fn interval_count(
    location_idx: usize,
    response: &LocationWeatherResponse,
) -> Result<usize, ReshapeError> {
    let LocationWeatherResponse {
        start,
        end,
        interval,
        ..
    } = *response;

    if interval <= 0 {
        return Err(ReshapeError::NonPositiveInterval {
            location: location_idx,
            interval,
        });
    }
    if end < start {
        return Err(ReshapeError::EndBeforeStart {
            location: location_idx,
            start,
            end,
        });
    }
    let span = end - start;
    if span % interval != 0 {
        return Err(ReshapeError::NonIntegralIntervalCount {
            location: location_idx,
            span,
            interval,
        });
    }
    Ok((span / interval) as usize)
}

/// Pairs the `i`-th location with the `i`-th response, reshapes each pair, and assembles
/// the results into one table in location order.
///
/// Responses are matched by position only. Their coordinates are grid-snapped by the
/// service and would not reliably match the requested ones, so no lookup by coordinate is
/// attempted. Any malformed response fails the whole batch and no table is returned.
pub fn reshape_all(
    locations: &[Location],
    responses: &[LocationWeatherResponse],
    metrics: &DailyMetricSet,
) -> Result<OutputTable, ReshapeError> {
    if locations.len() != responses.len() {
        return Err(ReshapeError::Alignment {
            locations: locations.len(),
            responses: responses.len(),
        });
    }

    let groups = locations
        .iter()
        .zip(responses)
        .enumerate()
        .map(|(idx, (location, response))| {
            info!(
                "Coordinates {}°N {}°E ({}, {})",
                response.latitude, response.longitude, location.description, location.name
            );
            reshape_location(idx, location, response, metrics)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(OutputTable::assemble(metrics.clone(), groups))
}
