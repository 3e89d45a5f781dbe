//! The long-format table produced by a run and handed to every sink.

use crate::types::daily_metric::{DailyMetric, DailyMetricSet};
use crate::types::weather_row::WeatherRow;

/// All [`WeatherRow`]s of a run, grouped by location in input order and ordered by
/// ascending date within a location.
///
/// The table carries its [`DailyMetricSet`] so that each row's positional `values`
/// can be labelled when written out.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTable {
    metrics: DailyMetricSet,
    rows: Vec<WeatherRow>,
}

impl OutputTable {
    /// An empty table for the given metric set.
    pub fn empty(metrics: DailyMetricSet) -> Self {
        Self {
            metrics,
            rows: Vec::new(),
        }
    }

    /// Concatenates per-location row groups, first group first.
    ///
    /// Rows are kept exactly as given: no sorting, deduplication or merging across groups.
    pub fn assemble<I>(metrics: DailyMetricSet, groups: I) -> Self
    where
        I: IntoIterator<Item = Vec<WeatherRow>>,
    {
        let mut rows = Vec::new();
        for group in groups {
            rows.extend(group);
        }
        Self { metrics, rows }
    }

    pub fn metrics(&self) -> &DailyMetricSet {
        &self.metrics
    }

    pub fn rows(&self) -> &[WeatherRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Looks up a row's value for `metric` through the table's metric order.
    pub fn value(&self, row: &WeatherRow, metric: DailyMetric) -> Option<f64> {
        self.metrics
            .position(metric)
            .and_then(|idx| row.values.get(idx).copied().flatten())
    }
}
