//! Pollutant readings and CSV ingestion

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// One calendar day of pollutant measurements as read from the source file.
///
/// The date is kept in its raw string form at this stage; calendar semantics
/// are applied when a [`crate::series::DailySeries`] is built. A `None` field
/// means the reading was missing or unmeasured that day, never zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReading {
    pub date: String,
    pub pm25: Option<f64>,
    pub pm10: Option<f64>,
    pub o3: Option<f64>,
    pub no2: Option<f64>,
}

/// The four pollutants measured in the source data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pollutant {
    Pm25,
    Pm10,
    O3,
    No2,
}

impl Pollutant {
    /// All pollutants in the order the source file lays out its columns.
    pub const ALL: [Pollutant; 4] = [
        Pollutant::Pm25,
        Pollutant::Pm10,
        Pollutant::O3,
        Pollutant::No2,
    ];

    /// Column name of this pollutant in the source and output files.
    pub fn name(&self) -> &'static str {
        match self {
            Pollutant::Pm25 => "pm25",
            Pollutant::Pm10 => "pm10",
            Pollutant::O3 => "o3",
            Pollutant::No2 => "no2",
        }
    }

    /// This pollutant's value within a reading.
    pub fn value_in(&self, reading: &DailyReading) -> Option<f64> {
        match self {
            Pollutant::Pm25 => reading.pm25,
            Pollutant::Pm10 => reading.pm10,
            Pollutant::O3 => reading.o3,
            Pollutant::No2 => reading.no2,
        }
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Loader for daily air-quality CSV files
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load readings from a CSV file with columns `date, pm25, pm10, o3, no2`.
    ///
    /// The header line is skipped unconditionally. Input order is preserved
    /// exactly; nothing is sorted or deduplicated. A blank numeric cell
    /// becomes `None`; a non-blank cell that is not a number is fatal, as is
    /// a row with fewer than five columns.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Vec<DailyReading>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;

        let mut readings = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record = record?;
            // header occupies line 1
            let line = index + 2;
            if record.len() < 5 {
                return Err(ForecastError::DataError(format!(
                    "line {}: expected 5 columns, found {}",
                    line,
                    record.len()
                )));
            }

            readings.push(DailyReading {
                date: record[0].to_string(),
                pm25: parse_cell(&record, 1, "pm25", line)?,
                pm10: parse_cell(&record, 2, "pm10", line)?,
                o3: parse_cell(&record, 3, "o3", line)?,
                no2: parse_cell(&record, 4, "no2", line)?,
            });
        }

        Ok(readings)
    }
}

fn parse_cell(
    record: &csv::StringRecord,
    index: usize,
    column: &str,
    line: usize,
) -> Result<Option<f64>> {
    let cell = record[index].trim();
    if cell.is_empty() {
        return Ok(None);
    }

    cell.parse::<f64>().map(Some).map_err(|_| {
        ForecastError::DataError(format!(
            "line {}, column {}: '{}' is not a number",
            line, column, cell
        ))
    })
}
