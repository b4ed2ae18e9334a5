use air_forecast::config::PipelineConfig;
use air_forecast::data::Pollutant;
use air_forecast::error::ForecastError;
use air_forecast::report;
use assert_approx_eq::assert_approx_eq;
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::tempdir;

fn sample_predictions() -> Vec<(Pollutant, f64)> {
    vec![
        (Pollutant::Pm25, 96.73),
        (Pollutant::Pm10, 30.12),
        (Pollutant::O3, 40.55),
        (Pollutant::No2, 21.99),
    ]
}

#[test]
fn test_predictions_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("predictions.csv");

    let predictions = sample_predictions();
    report::write_predictions(&path, &predictions).unwrap();
    let recovered = report::read_predictions(&path).unwrap();

    assert_eq!(recovered.len(), predictions.len());
    for ((pollutant, written), (name, read)) in predictions.iter().zip(recovered.iter()) {
        assert_eq!(pollutant.name(), name);
        assert_approx_eq!(written, read, 1e-9);
    }
}

#[test]
fn test_predictions_file_format() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("predictions.csv");

    report::write_predictions(&path, &sample_predictions()).unwrap();
    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();

    assert_eq!(lines.len(), 5);
    assert_eq!(lines[0], "Variable,Predicted Value");
    assert!(lines[1].starts_with("pm25,"));
    assert!(lines[4].starts_with("no2,"));
}

#[test]
fn test_comparison_lines_format() {
    let config = PipelineConfig::default();
    let lines = report::comparison_lines(&sample_predictions(), &config).unwrap();

    assert_eq!(lines.len(), 5);
    // heading names the forecast date the way the source data writes dates
    assert_eq!(lines[0], "Predicted values for 2023/6/9:");
    assert_eq!(lines[1], "pm25: Predicted=96.7, Real=98");
    assert_eq!(lines[2], "pm10: Predicted=30.1, Real=31");
    assert_eq!(lines[3], "o3: Predicted=40.5, Real=41");
    assert_eq!(lines[4], "no2: Predicted=22.0, Real=22");
}

#[test]
fn test_missing_reference_value_is_fatal() {
    let mut config = PipelineConfig::default();
    config.reference.remove(&Pollutant::O3);

    let result = report::comparison_lines(&sample_predictions(), &config);
    assert!(matches!(result, Err(ForecastError::DataError(_))));
}
