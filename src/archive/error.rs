use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Invalid archive endpoint '{0}': {1}")]
    InvalidEndpoint(String, String),

    #[error("End date {end} is before start date {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Network request failed for {url} after {attempts} attempt(s)")]
    NetworkRequest {
        url: String,
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP request failed for {url} with status {status} after {attempts} attempt(s): {reason}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        attempts: u32,
        reason: String,
    },

    #[error("Archive rejected the request: {0}")]
    Api(String),

    #[error("Failed to parse archive response")]
    JsonParse(#[from] serde_json::Error),

    #[error("Malformed archive response for location {location}: {message}")]
    MalformedResponse { location: usize, message: String },

    #[error("Archive returned {found} responses for {expected} locations")]
    ResponseCountMismatch { expected: usize, found: usize },

    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to read cache file '{0}'")]
    CacheRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to write cache file '{0}'")]
    CacheWrite(PathBuf, #[source] std::io::Error),

    #[error("Failed to decode cache data from '{0}'")]
    CacheDecode(PathBuf, #[source] Box<bincode::error::DecodeError>),

    #[error("Failed to encode cache data")]
    CacheEncode(#[source] Box<bincode::error::EncodeError>),

    #[error("Failed to delete cache '{0}'")]
    CacheDeletion(PathBuf, #[source] std::io::Error),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
