//! Prediction output and comparison reporting

use crate::config::PipelineConfig;
use crate::data::Pollutant;
use crate::error::{ForecastError, Result};
use serde::Deserialize;
use std::path::Path;

/// Header of the predictions file.
pub const PREDICTIONS_HEADER: [&str; 2] = ["Variable", "Predicted Value"];

#[derive(Debug, Deserialize)]
struct PredictionRow {
    #[serde(rename = "Variable")]
    variable: String,
    #[serde(rename = "Predicted Value")]
    predicted: f64,
}

/// Write predictions as a two-column CSV, one row per pollutant in the
/// order they were computed.
pub fn write_predictions<P: AsRef<Path>>(
    path: P,
    predictions: &[(Pollutant, f64)],
) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(PREDICTIONS_HEADER)?;
    for (pollutant, value) in predictions {
        writer.write_record([pollutant.name().to_string(), value.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a predictions file back into (variable, value) pairs.
pub fn read_predictions<P: AsRef<Path>>(path: P) -> Result<Vec<(String, f64)>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for row in reader.deserialize::<PredictionRow>() {
        let row = row?;
        rows.push((row.variable, row.predicted));
    }
    Ok(rows)
}

/// Comparison of each prediction against its configured reference value,
/// one line per pollutant, preceded by a heading naming the forecast date.
///
/// A pollutant with no reference entry is a fatal error; the reference table
/// is presumed complete for the configured pollutant set.
pub fn comparison_lines(
    predictions: &[(Pollutant, f64)],
    config: &PipelineConfig,
) -> Result<Vec<String>> {
    let mut lines = Vec::with_capacity(predictions.len() + 1);
    lines.push(format!(
        "Predicted values for {}:",
        config.forecast_date().format("%Y/%-m/%-d")
    ));

    for (pollutant, predicted) in predictions {
        let reference = config.reference.get(pollutant).ok_or_else(|| {
            ForecastError::DataError(format!("no reference value for {}", pollutant))
        })?;
        lines.push(format!(
            "{}: Predicted={:.1}, Real={}",
            pollutant, predicted, reference
        ));
    }

    Ok(lines)
}

/// Print the comparison table to stdout.
pub fn print_comparison(predictions: &[(Pollutant, f64)], config: &PipelineConfig) -> Result<()> {
    for line in comparison_lines(predictions, config)? {
        println!("{line}");
    }
    Ok(())
}
