use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReshapeError {
    #[error("{responses} responses cannot be aligned with {locations} locations")]
    Alignment { locations: usize, responses: usize },

    #[error("Response for location {location} has a non-positive sampling interval ({interval}s)")]
    NonPositiveInterval { location: usize, interval: i64 },

    #[error("Response for location {location} ends ({end}) before it starts ({start})")]
    EndBeforeStart {
        location: usize,
        start: i64,
        end: i64,
    },

    #[error("Response for location {location} spans {span}s, which is not a whole number of {interval}s intervals")]
    NonIntegralIntervalCount {
        location: usize,
        span: i64,
        interval: i64,
    },

    #[error("Response for location {location} has {found} value series, expected one per requested metric ({expected})")]
    SeriesCount {
        location: usize,
        expected: usize,
        found: usize,
    },

    #[error("Series '{metric}' for location {location} has {found} values, expected {expected}")]
    SeriesLength {
        location: usize,
        metric: String,
        expected: usize,
        found: usize,
    },

    #[error("Timestamp {timestamp} for location {location} is out of range")]
    TimestampOutOfRange { location: usize, timestamp: i64 },
}
