//! Pipeline configuration
//!
//! The production run is a fixed batch job; its constants (date range, model
//! orders, pollutant list, reference values) live here as an explicit
//! configuration structure passed into the forecaster and reporter rather
//! than as ambient globals. `Default` carries the production values; tests
//! construct shorter ranges.

use crate::data::Pollutant;
use crate::models::sarima::SarimaOrder;
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;

/// Configuration for a full forecasting run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// First date of the reconstructed daily grid.
    pub range_start: NaiveDate,
    /// Last date of the reconstructed daily grid.
    pub range_end: NaiveDate,
    /// SARIMA orders used for every pollutant.
    pub order: SarimaOrder,
    /// Pollutants to forecast, in reporting order.
    pub pollutants: Vec<Pollutant>,
    /// Known observed values for the forecast date, for comparison output.
    pub reference: HashMap<Pollutant, f64>,
}

impl PipelineConfig {
    /// The date being forecast: the day after the grid ends.
    pub fn forecast_date(&self) -> NaiveDate {
        self.range_end + Duration::days(1)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            range_start: NaiveDate::from_ymd_opt(2013, 12, 31).expect("valid calendar date"),
            range_end: NaiveDate::from_ymd_opt(2023, 6, 8).expect("valid calendar date"),
            order: SarimaOrder::new(1, 1, 1).with_seasonal(1, 0, 0, 7),
            pollutants: Pollutant::ALL.to_vec(),
            reference: HashMap::from([
                (Pollutant::Pm25, 98.0),
                (Pollutant::Pm10, 31.0),
                (Pollutant::O3, 41.0),
                (Pollutant::No2, 22.0),
            ]),
        }
    }
}
