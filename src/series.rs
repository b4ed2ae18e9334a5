//! Contiguous daily series reconstruction

use crate::data::{DailyReading, Pollutant};
use crate::error::{ForecastError, Result};
use chrono::{Duration, NaiveDate};

/// Date format used by the source data.
pub const DATE_FORMAT: &str = "%Y/%m/%d";

/// A single pollutant's values on a gapless daily grid.
///
/// Every date between the start and end bound has exactly one slot; dates the
/// source data never mentions hold `None`. The grid is contiguous and free of
/// duplicates regardless of gaps or duplicate dates in the raw input.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySeries {
    start: NaiveDate,
    values: Vec<Option<f64>>,
}

impl DailySeries {
    /// Reindex raw readings for one pollutant onto the range `start..=end`.
    ///
    /// Reading dates must match `%Y/%m/%d`; anything else is fatal. Dates
    /// outside the range are dropped. Duplicate dates overwrite earlier
    /// entries, so the last occurrence wins.
    pub fn from_readings(
        readings: &[DailyReading],
        pollutant: Pollutant,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Self> {
        if end < start {
            return Err(ForecastError::ValidationError(format!(
                "series range end {} precedes start {}",
                end, start
            )));
        }

        let len = (end - start).num_days() as usize + 1;
        let mut values = vec![None; len];

        for reading in readings {
            let date = NaiveDate::parse_from_str(&reading.date, DATE_FORMAT).map_err(|_| {
                ForecastError::DataError(format!(
                    "unparsable date '{}', expected YYYY/MM/DD",
                    reading.date
                ))
            })?;

            let offset = (date - start).num_days();
            if offset < 0 || offset as usize >= len {
                continue;
            }
            values[offset as usize] = pollutant.value_in(reading);
        }

        Ok(Self { start, values })
    }

    /// First date on the grid.
    pub fn start_date(&self) -> NaiveDate {
        self.start
    }

    /// Last date on the grid.
    pub fn end_date(&self) -> NaiveDate {
        self.start + Duration::days(self.values.len() as i64 - 1)
    }

    /// Number of daily slots, observed or not.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The full grid in date order, `None` where no reading exists.
    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    /// Value for a date, `None` if missing or outside the grid.
    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        let offset = (date - self.start).num_days();
        if offset < 0 || offset as usize >= self.values.len() {
            return None;
        }
        self.values[offset as usize]
    }

    /// Number of slots holding an actual observation.
    pub fn observed_count(&self) -> usize {
        self.values.iter().flatten().count()
    }
}
