use crate::locations::error::LocationError;
use crate::types::location::Location;
use log::info;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tokio::task;

const COL_DESCRIPTION: &str = "description";
const COL_NAME: &str = "name";
const COL_LATITUDE: &str = "latitude";
const COL_LONGITUDE: &str = "longitude";

/// The ordered list of locations for a run.
///
/// Row order is significant: the archive answers a batched request with one response per
/// coordinate pair, in request order, and the `i`-th response is matched to the `i`-th
/// location purely by that position.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LocationTable {
    locations: Vec<Location>,
}

impl LocationTable {
    pub fn new(locations: Vec<Location>) -> Self {
        Self { locations }
    }

    /// Loads a location table from a CSV file on a blocking task.
    ///
    /// The file must have a header with at least `description`, `name`, `latitude` and
    /// `longitude`. Additional columns are ignored.
    pub async fn load(path: &Path) -> Result<Self, LocationError> {
        let path_buf = path.to_path_buf();
        task::spawn_blocking(move || Self::from_csv(&path_buf)).await?
    }

    /// Synchronous variant of [`LocationTable::load`].
    pub fn from_csv(path: &Path) -> Result<Self, LocationError> {
        if !path.exists() {
            return Err(LocationError::NotFound(path.to_path_buf()));
        }

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .map_err(|e| LocationError::CsvRead(path.to_path_buf(), e))?
            .finish()
            .map_err(|e| LocationError::CsvRead(path.to_path_buf(), e))?;

        let table = Self::from_dataframe(&df, path)?;
        info!(
            "Loaded {} locations from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    fn from_dataframe(df: &DataFrame, path: &Path) -> Result<Self, LocationError> {
        let descriptions = typed_column(df, path, COL_DESCRIPTION, DataType::String)?;
        let names = typed_column(df, path, COL_NAME, DataType::String)?;
        let latitudes = typed_column(df, path, COL_LATITUDE, DataType::Float64)?;
        let longitudes = typed_column(df, path, COL_LONGITUDE, DataType::Float64)?;

        let descriptions = as_str(&descriptions, path, COL_DESCRIPTION)?;
        let names = as_str(&names, path, COL_NAME)?;
        let latitudes = as_f64(&latitudes, path, COL_LATITUDE)?;
        let longitudes = as_f64(&longitudes, path, COL_LONGITUDE)?;

        let missing = |row: usize, column: &'static str| LocationError::MissingValue {
            path: path.to_path_buf(),
            row,
            column,
        };

        let mut locations = Vec::with_capacity(df.height());
        for row in 0..df.height() {
            locations.push(Location {
                description: descriptions
                    .get(row)
                    .ok_or_else(|| missing(row, COL_DESCRIPTION))?
                    .to_string(),
                name: names
                    .get(row)
                    .ok_or_else(|| missing(row, COL_NAME))?
                    .to_string(),
                latitude: latitudes
                    .get(row)
                    .ok_or_else(|| missing(row, COL_LATITUDE))?,
                longitude: longitudes
                    .get(row)
                    .ok_or_else(|| missing(row, COL_LONGITUDE))?,
            });
        }
        Ok(Self { locations })
    }

    pub fn as_slice(&self) -> &[Location] {
        &self.locations
    }

    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        self.locations.iter()
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

impl From<Vec<Location>> for LocationTable {
    fn from(locations: Vec<Location>) -> Self {
        Self::new(locations)
    }
}

/// Fetches `column` and strictly casts it, so unparseable cells fail instead of turning null.
fn typed_column(
    df: &DataFrame,
    path: &Path,
    column: &'static str,
    dtype: DataType,
) -> Result<Series, LocationError> {
    let raw = df
        .column(column)
        .map_err(|e| LocationError::MissingColumn {
            path: path.to_path_buf(),
            column,
            source: e,
        })?;
    raw.as_materialized_series()
        .strict_cast(&dtype)
        .map_err(|e| column_type_error(path, column, &dtype, e))
}

fn as_str<'a>(
    series: &'a Series,
    path: &Path,
    column: &'static str,
) -> Result<&'a StringChunked, LocationError> {
    series
        .str()
        .map_err(|e| column_type_error(path, column, &DataType::String, e))
}

fn as_f64<'a>(
    series: &'a Series,
    path: &Path,
    column: &'static str,
) -> Result<&'a Float64Chunked, LocationError> {
    series
        .f64()
        .map_err(|e| column_type_error(path, column, &DataType::Float64, e))
}

fn column_type_error(
    path: &Path,
    column: &'static str,
    dtype: &DataType,
    source: PolarsError,
) -> LocationError {
    LocationError::ColumnType {
        path: PathBuf::from(path),
        column,
        expected: if *dtype == DataType::Float64 {
            "a number"
        } else {
            "text"
        },
        source,
    }
}
