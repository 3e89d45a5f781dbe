//! Unit preferences sent along with every archive request.

use std::fmt;

/// Temperature unit for the `temperature_unit` request parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TemperatureUnit {
    Celsius,
    #[default]
    Fahrenheit,
}

/// Wind speed unit for the `wind_speed_unit` request parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WindSpeedUnit {
    KilometersPerHour,
    MetersPerSecond,
    #[default]
    MilesPerHour,
    Knots,
}

/// Precipitation unit for the `precipitation_unit` request parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrecipitationUnit {
    Millimeters,
    #[default]
    Inches,
}

impl TemperatureUnit {
    pub(crate) fn query_value(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "celsius",
            TemperatureUnit::Fahrenheit => "fahrenheit",
        }
    }
}

impl WindSpeedUnit {
    pub(crate) fn query_value(&self) -> &'static str {
        match self {
            WindSpeedUnit::KilometersPerHour => "kmh",
            WindSpeedUnit::MetersPerSecond => "ms",
            WindSpeedUnit::MilesPerHour => "mph",
            WindSpeedUnit::Knots => "kn",
        }
    }
}

impl PrecipitationUnit {
    pub(crate) fn query_value(&self) -> &'static str {
        match self {
            PrecipitationUnit::Millimeters => "mm",
            PrecipitationUnit::Inches => "inch",
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.query_value())
    }
}

impl fmt::Display for WindSpeedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.query_value())
    }
}

impl fmt::Display for PrecipitationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.query_value())
    }
}
