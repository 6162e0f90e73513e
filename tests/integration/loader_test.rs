use std::fs;

use arrow::array::{Array, Int64Array, StringArray};
use rtt_waits::schema::{PATIENT_AGE, SEEN_DATE, WAIT_START_DATE, WAITING_DAYS};
use rtt_waits::{
    Error, LoaderConfig, Pipeline, PipelineConfig, Stage, list_sheets, load_sheet,
};

use crate::utils::fixture_workbook;

fn text_column<'a>(batch: &'a rtt_waits::RecordBatch, name: &str) -> &'a StringArray {
    batch
        .column_by_name(name)
        .unwrap()
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap()
}

#[test]
fn test_list_sheets() -> rtt_waits::Result<()> {
    assert_eq!(list_sheets(&fixture_workbook())?, vec!["RTT", "Notes"]);
    Ok(())
}

#[test]
fn test_load_sheet_reads_text_and_date_cells() -> rtt_waits::Result<()> {
    let batch = load_sheet(&fixture_workbook(), &LoaderConfig::default())?;
    assert_eq!(batch.num_rows(), 3);

    let seen = text_column(&batch, SEEN_DATE);
    assert_eq!(seen.value(0), "2022-01-10");
    assert_eq!(seen.value(1), "2022-02-08");

    let start = text_column(&batch, WAIT_START_DATE);
    assert_eq!(start.value(0), "2022-01-02");
    assert_eq!(start.value(1), "2022-01-02");

    let ages = batch
        .column_by_name(PATIENT_AGE)
        .unwrap()
        .as_any()
        .downcast_ref::<Int64Array>()
        .unwrap();
    assert_eq!(ages.value(0), 34);
    assert!(ages.is_null(2));
    Ok(())
}

#[test]
fn test_pipeline_runs_on_workbook() -> rtt_waits::Result<()> {
    let output = Pipeline::new(PipelineConfig::default())?.run(&fixture_workbook())?;
    assert_eq!(output.loaded_rows, 3);
    assert_eq!(output.cleaning.missing_removed, 1);

    let waiting: Vec<i64> = output
        .cleaned
        .column_by_name(WAITING_DAYS)
        .unwrap()
        .as_any()
        .downcast_ref::<Int64Array>()
        .unwrap()
        .values()
        .to_vec();
    assert_eq!(waiting, vec![8, 37]);
    Ok(())
}

#[test]
fn test_missing_sheet_lists_available_sheets() {
    let config = LoaderConfig {
        sheet_name: "Referrals".to_string(),
        ..LoaderConfig::default()
    };
    let err = load_sheet(&fixture_workbook(), &config).unwrap_err();
    match &err {
        Error::Load { path, message } => {
            assert_eq!(path, &fixture_workbook());
            assert!(message.contains("'Referrals'"));
            assert!(message.contains("RTT, Notes"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.stage(), Some(Stage::Load));
}

#[test]
fn test_sheet_without_core_columns_is_schema_error() {
    let config = LoaderConfig {
        sheet_name: "Notes".to_string(),
        ..LoaderConfig::default()
    };
    let err = load_sheet(&fixture_workbook(), &config).unwrap_err();
    assert!(matches!(err, Error::Schema { stage: Stage::Load, .. }));
}

#[test]
fn test_unreadable_workbook_is_load_error() -> rtt_waits::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("broken.xlsx");
    fs::write(&path, "not a zip archive")?;

    let err = load_sheet(&path, &LoaderConfig::default()).unwrap_err();
    assert!(matches!(err, Error::Load { .. }));
    assert!(list_sheets(&path).is_err());
    Ok(())
}
