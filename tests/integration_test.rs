use air_forecast::config::PipelineConfig;
use air_forecast::data::{DataLoader, Pollutant};
use air_forecast::forecaster::Forecaster;
use air_forecast::report;
use chrono::{Duration, NaiveDate};
use std::fs;
use std::io::Write;
use tempfile::tempdir;

/// 91 days of synthetic readings: weekly cycles plus deterministic jitter,
/// with a sprinkling of blank cells like the real exports have.
fn write_sample_csv(path: &std::path::Path, start: NaiveDate, days: usize) {
    let mut file = fs::File::create(path).unwrap();
    writeln!(file, "date,pm25,pm10,o3,no2").unwrap();
    for t in 0..days {
        let date = (start + Duration::days(t as i64)).format("%Y/%m/%d");
        let wave = (2.0 * std::f64::consts::PI * t as f64 / 7.0).sin();
        let jitter = ((t * 17 + 7) % 13) as f64 / 13.0 - 0.5;
        let pm25 = 55.0 + 8.0 * wave + jitter;
        let pm10 = 28.0 + 4.0 * wave + jitter;
        let o3 = 38.0 + 6.0 * wave - jitter;
        let no2 = 21.0 + 3.0 * wave + jitter;

        // every 19th day loses its o3 reading
        if t % 19 == 5 {
            writeln!(file, "{date},{pm25:.2},{pm10:.2},,{no2:.2}").unwrap();
        } else {
            writeln!(file, "{date},{pm25:.2},{pm10:.2},{o3:.2},{no2:.2}").unwrap();
        }
    }
}

fn short_config(start: NaiveDate, days: usize) -> PipelineConfig {
    PipelineConfig {
        range_start: start,
        range_end: start + Duration::days(days as i64 - 1),
        ..PipelineConfig::default()
    }
}

#[test]
fn test_full_pipeline_produces_four_predictions() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("air-quality.csv");
    let output = dir.path().join("predictions.csv");

    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let days = 91;
    write_sample_csv(&input, start, days);

    let readings = DataLoader::from_csv(&input).unwrap();
    assert_eq!(readings.len(), days);

    let forecaster = Forecaster::new(short_config(start, days));
    let predictions = forecaster.forecast_all(&readings).unwrap();

    assert_eq!(predictions.len(), 4);
    let names: Vec<&str> = predictions.iter().map(|(p, _)| p.name()).collect();
    assert_eq!(names, ["pm25", "pm10", "o3", "no2"]);
    for (pollutant, value) in &predictions {
        assert!(value.is_finite(), "{pollutant} forecast is not finite");
    }

    // predictions file: header plus one row per pollutant
    report::write_predictions(&output, &predictions).unwrap();
    let recovered = report::read_predictions(&output).unwrap();
    assert_eq!(recovered.len(), 4);

    // console comparison: one line per pollutant, references intact
    let lines = report::comparison_lines(&predictions, forecaster.config()).unwrap();
    assert_eq!(lines.len(), 5);
    for line in &lines[1..] {
        assert!(line.contains("Predicted="));
        assert!(line.contains("Real="));
    }
    assert!(lines[1].ends_with("Real=98"));
    assert!(lines[2].ends_with("Real=31"));
    assert!(lines[3].ends_with("Real=41"));
    assert!(lines[4].ends_with("Real=22"));
}

#[test]
fn test_forecasts_stay_near_the_series_level() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("air-quality.csv");

    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let days = 91;
    write_sample_csv(&input, start, days);

    let readings = DataLoader::from_csv(&input).unwrap();
    let forecaster = Forecaster::new(short_config(start, days));

    // pm25 oscillates in [46, 64]; any sane one-step forecast lands nearby
    let predicted = forecaster.forecast(&readings, Pollutant::Pm25).unwrap();
    assert!(
        (40.0..=70.0).contains(&predicted),
        "pm25 forecast {predicted} far outside the series range"
    );
}

#[test]
fn test_malformed_row_aborts_before_any_output() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("air-quality.csv");
    let output = dir.path().join("predictions.csv");

    let mut file = fs::File::create(&input).unwrap();
    writeln!(file, "date,pm25,pm10,o3,no2").unwrap();
    writeln!(file, "2015/01/01,not_a_number,10,20,30").unwrap();
    drop(file);

    let result = DataLoader::from_csv(&input);
    assert!(result.is_err());
    // the pipeline never reached the writing stage
    assert!(!output.exists());
}
