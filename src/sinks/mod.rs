//! Persistence targets for an [`OutputTable`].

pub mod csv_sink;
pub mod error;
pub mod mongo_sink;

use crate::sinks::error::SinkError;
use crate::types::output_table::OutputTable;
use async_trait::async_trait;

/// A destination an [`OutputTable`] can be written to.
///
/// Sinks only read the table. Writes to different sinks are independent: one may succeed
/// while a later one fails.
#[async_trait]
pub trait TableSink: Send + Sync {
    /// Short human-readable name used in logs.
    fn name(&self) -> String;

    /// Writes every row of `table`, returning the number of rows written.
    async fn write(&self, table: &OutputTable) -> Result<usize, SinkError>;
}
