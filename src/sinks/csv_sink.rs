use crate::sinks::error::SinkError;
use crate::sinks::TableSink;
use crate::types::output_table::OutputTable;
use async_trait::async_trait;
use log::info;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tokio::task;

/// Default output path, relative to the working directory.
pub const DEFAULT_CSV_PATH: &str = "weather_data.csv";

pub(crate) const COL_INDEX: &str = "index";
pub(crate) const COL_DATE: &str = "date";
pub(crate) const COL_CITY: &str = "City";
pub(crate) const COL_STATE: &str = "State";
pub(crate) const COL_LATITUDE: &str = "Latitude";
pub(crate) const COL_LONGITUDE: &str = "Longitude";

/// Date format shared by every sink that writes dates as text.
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%:z";

/// Writes the table to a CSV file, replacing any existing file.
///
/// Columns: a leading `index` (the row's position within its location), `date`, one
/// column per metric in metric-set order, then `City`, `State`, `Latitude`, `Longitude`.
/// Missing values are left empty. An empty table produces a header-only file.
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for CsvSink {
    fn default() -> Self {
        Self::new(Path::new(DEFAULT_CSV_PATH))
    }
}

/// Lays the table out column by column.
pub fn to_dataframe(table: &OutputTable) -> PolarsResult<DataFrame> {
    let rows = table.rows();
    let mut columns = Vec::with_capacity(table.metrics().len() + 6);

    columns.push(Column::new(
        COL_INDEX.into(),
        rows.iter().map(|r| r.index as u64).collect::<Vec<_>>(),
    ));
    columns.push(Column::new(
        COL_DATE.into(),
        rows.iter()
            .map(|r| r.date.format(DATE_FORMAT).to_string())
            .collect::<Vec<_>>(),
    ));
    for (k, metric) in table.metrics().iter().enumerate() {
        columns.push(Column::new(
            metric.api_name().into(),
            rows.iter()
                .map(|r| r.values.get(k).copied().flatten())
                .collect::<Vec<Option<f64>>>(),
        ));
    }
    columns.push(Column::new(
        COL_CITY.into(),
        rows.iter()
            .map(|r| r.description.as_str())
            .collect::<Vec<_>>(),
    ));
    columns.push(Column::new(
        COL_STATE.into(),
        rows.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
    ));
    columns.push(Column::new(
        COL_LATITUDE.into(),
        rows.iter().map(|r| r.latitude).collect::<Vec<_>>(),
    ));
    columns.push(Column::new(
        COL_LONGITUDE.into(),
        rows.iter().map(|r| r.longitude).collect::<Vec<_>>(),
    ));

    DataFrame::new(columns)
}

#[async_trait]
impl TableSink for CsvSink {
    fn name(&self) -> String {
        format!("csv:{}", self.path.display())
    }

    async fn write(&self, table: &OutputTable) -> Result<usize, SinkError> {
        let mut df = to_dataframe(table).map_err(SinkError::Frame)?;
        let rows = df.height();
        let path = self.path.clone();

        task::spawn_blocking(move || {
            let mut file = std::fs::File::create(&path)
                .map_err(|e| SinkError::FileCreate(path.clone(), e))?;
            CsvWriter::new(&mut file)
                .include_header(true)
                .finish(&mut df)
                .map_err(|e| SinkError::CsvWrite(path, e))
        })
        .await??;

        info!("Wrote {} rows to {}", rows, self.path.display());
        Ok(rows)
    }
}
