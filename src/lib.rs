//! # Air Forecast
//!
//! A Rust library for forecasting daily air-quality time series with
//! seasonal ARIMA models.
//!
//! ## Features
//!
//! - Daily pollutant CSV ingestion with explicit missing-value semantics
//! - Reconstruction of sparse dated readings onto a gapless daily grid
//! - SARIMA estimation via Kalman-filter state space, tolerant of missing
//!   observations
//! - One-step-ahead point forecasts and comparison reporting
//!
//! ## Quick Start
//!
//! ```no_run
//! use air_forecast::config::PipelineConfig;
//! use air_forecast::data::DataLoader;
//! use air_forecast::forecaster::Forecaster;
//! use air_forecast::report;
//!
//! # fn main() -> air_forecast::error::Result<()> {
//! // Load readings
//! let readings = DataLoader::from_csv("paris-air-quality.csv")?;
//!
//! // Forecast every configured pollutant one day past the grid
//! let forecaster = Forecaster::new(PipelineConfig::default());
//! let predictions = forecaster.forecast_all(&readings)?;
//!
//! // Persist and compare against the known values
//! report::write_predictions("predictions.csv", &predictions)?;
//! report::print_comparison(&predictions, forecaster.config())?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod forecaster;
pub mod models;
pub mod report;
pub mod series;

// Re-export commonly used types
pub use crate::config::PipelineConfig;
pub use crate::data::{DailyReading, DataLoader, Pollutant};
pub use crate::error::ForecastError;
pub use crate::forecaster::Forecaster;
pub use crate::models::{ForecastModel, ForecastResult, TrainedForecastModel};
pub use crate::series::DailySeries;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
