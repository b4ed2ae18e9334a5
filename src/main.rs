//! Batch forecasting run: load the Paris air-quality series, forecast each
//! pollutant one day ahead, write the predictions file and print the
//! comparison against the known values.

use air_forecast::config::PipelineConfig;
use air_forecast::data::DataLoader;
use air_forecast::error::Result;
use air_forecast::forecaster::Forecaster;
use air_forecast::report;
use std::process;

const INPUT_FILE: &str = "paris-air-quality.csv";
const OUTPUT_FILE: &str = "predictions.csv";

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let readings = DataLoader::from_csv(INPUT_FILE)?;

    let forecaster = Forecaster::new(PipelineConfig::default());
    let predictions = forecaster.forecast_all(&readings)?;

    // The output file is only created once every fit has succeeded.
    report::write_predictions(OUTPUT_FILE, &predictions)?;
    report::print_comparison(&predictions, forecaster.config())?;
    Ok(())
}
