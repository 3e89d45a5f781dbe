use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to build output frame")]
    Frame(#[source] PolarsError),

    #[error("Failed to create output file '{0}'")]
    FileCreate(PathBuf, #[source] std::io::Error),

    #[error("Failed to write CSV file '{0}'")]
    CsvWrite(PathBuf, #[source] PolarsError),

    #[error("Failed to connect to MongoDB cluster '{cluster}'")]
    Connect {
        cluster: String,
        #[source]
        source: mongodb::error::Error,
    },

    #[error("Failed to insert {rows} documents into '{database}.{collection}'")]
    Insert {
        database: String,
        collection: String,
        rows: usize,
        #[source]
        source: mongodb::error::Error,
    },

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
