//! A named query point.

/// A named point to fetch weather for.
///
/// `description` and `name` are free labels (for the bundled list of US state capitals,
/// the city and the state). They are never sent to the archive; they only tag output rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub description: String,
    pub name: String,
    /// Latitude in decimal degrees (positive for North).
    pub latitude: f64,
    /// Longitude in decimal degrees (positive for East).
    pub longitude: f64,
}

impl Location {
    pub fn new(
        description: impl Into<String>,
        name: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            description: description.into(),
            name: name.into(),
            latitude,
            longitude,
        }
    }
}
