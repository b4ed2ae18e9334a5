use air_forecast::data::{DataLoader, Pollutant};
use air_forecast::error::ForecastError;
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_csv(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    file
}

#[test]
fn test_loader_preserves_rows_and_order() {
    let file = write_csv(&[
        "date,pm25,pm10,o3,no2",
        "2023/01/01,12.5,30,41,22.5",
        "2023/01/03,13.0,,42,",
        "2023/01/02,11.0,29,40,21",
    ]);

    let readings = DataLoader::from_csv(file.path()).unwrap();

    assert_eq!(readings.len(), 3);
    // input order kept exactly, no sorting
    assert_eq!(readings[0].date, "2023/01/01");
    assert_eq!(readings[1].date, "2023/01/03");
    assert_eq!(readings[2].date, "2023/01/02");
    assert_eq!(readings[0].pm25, Some(12.5));
    assert_eq!(readings[2].no2, Some(21.0));
}

#[test]
fn test_blank_cells_become_none() {
    let file = write_csv(&[
        "date,pm25,pm10,o3,no2",
        "2023/01/01,, 15 ,  ,22",
    ]);

    let readings = DataLoader::from_csv(file.path()).unwrap();

    assert_eq!(readings.len(), 1);
    assert_eq!(readings[0].pm25, None);
    assert_eq!(readings[0].pm10, Some(15.0));
    assert_eq!(readings[0].o3, None);
    assert_eq!(readings[0].no2, Some(22.0));
}

#[test]
fn test_header_skipped_without_validation() {
    let file = write_csv(&[
        "anything,at,all,here,works",
        "2023/01/01,1,2,3,4",
    ]);

    let readings = DataLoader::from_csv(file.path()).unwrap();
    assert_eq!(readings.len(), 1);
}

#[test]
fn test_missing_file_is_fatal() {
    let result = DataLoader::from_csv("no_such_file.csv");
    assert!(result.is_err());
}

#[test]
fn test_non_numeric_cell_is_fatal() {
    let file = write_csv(&[
        "date,pm25,pm10,o3,no2",
        "2015/01/01,not_a_number,10,20,30",
    ]);

    let err = DataLoader::from_csv(file.path()).unwrap_err();
    match err {
        ForecastError::DataError(message) => {
            assert!(message.contains("line 2"));
            assert!(message.contains("pm25"));
        }
        other => panic!("expected DataError, got {other:?}"),
    }
}

#[test]
fn test_short_row_is_fatal() {
    let file = write_csv(&[
        "date,pm25,pm10,o3,no2",
        "2023/01/01,1,2",
    ]);

    let err = DataLoader::from_csv(file.path()).unwrap_err();
    match err {
        ForecastError::DataError(message) => {
            assert!(message.contains("expected 5 columns"));
        }
        other => panic!("expected DataError, got {other:?}"),
    }
}

#[rstest]
#[case(Pollutant::Pm25, "pm25", Some(1.0))]
#[case(Pollutant::Pm10, "pm10", Some(2.0))]
#[case(Pollutant::O3, "o3", None)]
#[case(Pollutant::No2, "no2", Some(4.0))]
fn test_pollutant_accessors(
    #[case] pollutant: Pollutant,
    #[case] name: &str,
    #[case] expected: Option<f64>,
) {
    let file = write_csv(&[
        "date,pm25,pm10,o3,no2",
        "2023/01/01,1,2,,4",
    ]);
    let readings = DataLoader::from_csv(file.path()).unwrap();

    assert_eq!(pollutant.name(), name);
    assert_eq!(pollutant.value_in(&readings[0]), expected);
}
