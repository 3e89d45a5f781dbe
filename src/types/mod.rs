pub mod daily_metric;
pub mod location;
pub mod output_table;
pub mod units;
pub mod weather_row;
