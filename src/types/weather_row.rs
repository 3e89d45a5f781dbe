use chrono::{DateTime, Utc};

/// One reshaped daily observation for one location.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherRow {
    /// Position of this row within its own location's series (restarts at 0 per location).
    pub index: usize,
    /// Start of the sampling interval, UTC.
    pub date: DateTime<Utc>,
    /// One value per metric, in [`crate::DailyMetricSet`] order. `None` where upstream has no value.
    pub values: Vec<Option<f64>>,
    /// Location description (the city), copied from the input file.
    pub description: String,
    /// Location name (the state), copied from the input file.
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}
