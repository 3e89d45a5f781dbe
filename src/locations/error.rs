use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LocationError {
    #[error("Location file '{0}' does not exist")]
    NotFound(PathBuf),

    #[error("Failed to read location file '{0}'")]
    CsvRead(PathBuf, #[source] PolarsError),

    #[error("Location file '{path}' is missing required column '{column}'")]
    MissingColumn {
        path: PathBuf,
        column: &'static str,
        #[source]
        source: PolarsError,
    },

    #[error("Column '{column}' in '{path}' could not be read as {expected}")]
    ColumnType {
        path: PathBuf,
        column: &'static str,
        expected: &'static str,
        #[source]
        source: PolarsError,
    },

    #[error("Row {row} of '{path}' has no value for '{column}'")]
    MissingValue {
        path: PathBuf,
        row: usize,
        column: &'static str,
    },

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
