//! Per-pollutant forecasting pipeline

use crate::config::PipelineConfig;
use crate::data::{DailyReading, Pollutant};
use crate::error::{ForecastError, Result};
use crate::models::sarima::SarimaModel;
use crate::models::{ForecastModel, TrainedForecastModel};
use crate::series::DailySeries;

/// Runs the reconstruct-fit-forecast sequence for each pollutant.
///
/// Every pollutant is fit independently and from scratch; no state is shared
/// between fits beyond the read-only reading sequence.
#[derive(Debug)]
pub struct Forecaster {
    config: PipelineConfig,
}

impl Forecaster {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// One-step-ahead point forecast for a single pollutant.
    pub fn forecast(&self, readings: &[DailyReading], pollutant: Pollutant) -> Result<f64> {
        let series = DailySeries::from_readings(
            readings,
            pollutant,
            self.config.range_start,
            self.config.range_end,
        )?;

        let model = SarimaModel::new(self.config.order.clone())?;
        let trained = model.train(&series)?;
        let forecast = trained.forecast(1)?;

        let value = forecast.values().first().copied().ok_or_else(|| {
            ForecastError::ForecastingError(format!("{}: empty forecast", pollutant))
        })?;
        if !value.is_finite() {
            return Err(ForecastError::ForecastingError(format!(
                "{}: forecast is not finite",
                pollutant
            )));
        }
        Ok(value)
    }

    /// Forecast every configured pollutant, in configuration order.
    pub fn forecast_all(&self, readings: &[DailyReading]) -> Result<Vec<(Pollutant, f64)>> {
        let mut predictions = Vec::with_capacity(self.config.pollutants.len());
        for &pollutant in &self.config.pollutants {
            let value = self.forecast(readings, pollutant)?;
            predictions.push((pollutant, value));
        }
        Ok(predictions)
    }
}
