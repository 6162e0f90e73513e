use std::fs::{self, File};

use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use rtt_waits::{Pipeline, PipelineConfig};

use crate::utils::{loaded, referral_rows};

#[test]
fn test_export_writes_all_outputs() -> rtt_waits::Result<()> {
    let dir = tempfile::tempdir()?;
    let out_dir = dir.path().join("out");

    let output = Pipeline::new(PipelineConfig::default())?.run_batch(&loaded(&referral_rows()))?;
    let files = output.export(&out_dir)?;

    for path in files.paths() {
        assert!(path.is_file(), "{} was not written", path.display());
    }

    let cleaned_csv = fs::read_to_string(&files.cleaned_csv)?;
    let mut lines = cleaned_csv.lines();
    let header = lines.next().unwrap_or_default();
    assert!(header.starts_with("patient_age,index_of_multiple_deprivation,ethnicity"));
    assert!(header.ends_with("waiting_days,agg_ethnicity"));
    assert_eq!(lines.count(), output.cleaned.num_rows());

    let summary_csv = fs::read_to_string(&files.summary_csv)?;
    assert_eq!(
        summary_csv.lines().next(),
        Some("index_of_multiple_deprivation,agg_ethnicity,median,q1,q3,count")
    );
    assert_eq!(summary_csv.lines().count(), output.summary.len() + 1);

    let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(&files.cleaned_parquet)?)?
        .build()?;
    let rows: usize = reader
        .map(|batch| batch.map(|b| b.num_rows()))
        .sum::<Result<usize, _>>()?;
    assert_eq!(rows, output.cleaned.num_rows());
    Ok(())
}

#[test]
fn test_report_json_matches_run() -> rtt_waits::Result<()> {
    let dir = tempfile::tempdir()?;
    let output = Pipeline::new(PipelineConfig::default())?.run_batch(&loaded(&referral_rows()))?;
    let files = output.export(dir.path())?;

    let report: serde_json::Value = serde_json::from_str(&fs::read_to_string(&files.report_json)?)?;
    assert_eq!(report["loaded_rows"], 8);
    assert_eq!(report["duplicate_groups"], 1);
    assert_eq!(report["cleaning"]["output_rows"], 4);
    assert_eq!(report["aggregation"]["group_counts"]["Unknown/Unwilling"], 2);

    let duplicates: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&files.duplicates_json)?)?;
    assert_eq!(duplicates["groups"][0]["rows"], serde_json::json!([0, 7]));
    Ok(())
}
