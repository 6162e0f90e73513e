use arrow::array::{Array, Int64Array, StringArray};
use rtt_waits::schema::{AGG_ETHNICITY, CORE_COLUMNS, WAITING_DAYS};
use rtt_waits::{
    CleaningThresholds, EthnicGroup, EthnicityMapping, Error, GroupKey, ImdDecile, Pipeline,
    PipelineConfig, Stage,
};

use crate::utils::{loaded, referral_rows, synthetic_rows};

fn pipeline() -> Pipeline {
    Pipeline::new(PipelineConfig::default()).unwrap()
}

#[test]
fn test_referral_examples_end_to_end() -> rtt_waits::Result<()> {
    let batch = loaded(&referral_rows());
    let output = pipeline().run_batch(&batch)?;

    assert_eq!(output.loaded_rows, 8);
    assert_eq!(output.cleaning.missing_removed, 2);
    assert_eq!(output.cleaning.out_of_range_removed, 2);
    assert_eq!(output.cleaning.output_rows, 4);
    assert_eq!(output.cleaned.num_rows(), 4);

    let waiting = output
        .cleaned
        .column_by_name(WAITING_DAYS)
        .unwrap()
        .as_any()
        .downcast_ref::<Int64Array>()
        .unwrap();
    assert_eq!(waiting.value(0), 8);

    let groups = output
        .cleaned
        .column_by_name(AGG_ETHNICITY)
        .unwrap()
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap();
    assert_eq!(groups.value(0), "Unknown/Unwilling");

    let decile = ImdDecile::new(3).unwrap();
    let unknown = output.summary.get(decile, EthnicGroup::UnknownUnwilling).unwrap();
    assert_eq!((unknown.median, unknown.count), (8.0, 2));

    let white = output.summary.get(decile, EthnicGroup::WhiteBritish).unwrap();
    assert_eq!(white.count, 2);
    assert_eq!(white.median, 31.0);
    assert_eq!(white.q1, 25.5);
    assert_eq!(white.q3, 36.5);

    Ok(())
}

#[test]
fn test_duplicates_are_reported_and_kept() -> rtt_waits::Result<()> {
    let batch = loaded(&referral_rows());
    let output = pipeline().run_batch(&batch)?;

    assert_eq!(output.duplicates.groups.len(), 1);
    assert_eq!(output.duplicates.groups[0].rows, vec![0, 7]);

    let unknown = output
        .summary
        .get(ImdDecile::new(3).unwrap(), EthnicGroup::UnknownUnwilling)
        .unwrap();
    assert_eq!(unknown.count, 2);
    Ok(())
}

#[test]
fn test_cleaned_table_invariants() -> rtt_waits::Result<()> {
    let batch = loaded(&synthetic_rows(200));
    let output = pipeline().run_batch(&batch)?;
    let thresholds = CleaningThresholds::default();

    for column in CORE_COLUMNS {
        assert_eq!(
            output.cleaned.column_by_name(column).unwrap().null_count(),
            0,
            "{column} has nulls"
        );
    }

    let waiting = output
        .cleaned
        .column_by_name(WAITING_DAYS)
        .unwrap()
        .as_any()
        .downcast_ref::<Int64Array>()
        .unwrap();
    assert!(waiting.iter().flatten().all(|days| thresholds.contains(days)));
    assert_eq!(output.cleaned.column_by_name(AGG_ETHNICITY).unwrap().null_count(), 0);
    Ok(())
}

#[test]
fn test_group_counts_sum_to_cleaned_rows() -> rtt_waits::Result<()> {
    let batch = loaded(&synthetic_rows(300));
    let output = pipeline().run_batch(&batch)?;

    assert!(output.cleaned.num_rows() > 0);
    assert_eq!(output.summary.total_count(), output.cleaned.num_rows());
    assert_eq!(
        output.aggregation.group_counts.values().sum::<usize>(),
        output.cleaned.num_rows()
    );
    for key in [GroupKey::Imd, GroupKey::Ethnicity, GroupKey::AgeBand] {
        assert_eq!(output.summarize_by(key)?.total_count(), output.cleaned.num_rows());
    }
    Ok(())
}

#[test]
fn test_pivot_rows_follow_decile_order() -> rtt_waits::Result<()> {
    let batch = loaded(&synthetic_rows(300));
    let output = pipeline().run_batch(&batch)?;

    let ranks: Vec<u8> = output.summary.pivot().iter().map(|(imd, _)| imd.rank()).collect();
    let mut sorted = ranks.clone();
    sorted.sort_unstable();
    assert_eq!(ranks, sorted);
    Ok(())
}

#[test]
fn test_unmapped_label_fails_aggregation() {
    let mut rows = referral_rows();
    rows[3].2 = Some("Martian");
    let batch = loaded(&rows);

    let err = pipeline().run_batch(&batch).unwrap_err();
    assert_eq!(err.stage(), Some(Stage::AggregateEthnicity));
    match err {
        Error::UnmappedCategory { value, .. } => assert_eq!(value, "Martian"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_custom_mapping_artifact() -> rtt_waits::Result<()> {
    let mapping = EthnicityMapping::from_toml_str(
        r#"
        version = 7
        [mapping]
        "Unwilling to answer" = "Unknown/Unwilling"
        "Indian" = "Asian"
        "Caribbean" = "Black"
        "White - British" = "White British"
        "#,
    )?;
    let output = Pipeline::with_mapping(PipelineConfig::default(), mapping)?
        .run_batch(&loaded(&referral_rows()))?;
    assert_eq!(output.aggregation.mapping_version, 7);
    Ok(())
}

#[test]
fn test_unparsable_date_fails_cleaning() {
    let mut rows = referral_rows();
    rows[6].4 = Some("31/02/2022");
    let err = pipeline().run_batch(&loaded(&rows)).unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Clean));
    assert!(err.to_string().contains("31/02/2022"));
    match err {
        Error::DateParse { row, .. } => assert_eq!(row, 6),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_two_digit_year_fails_instead_of_filtering() {
    let rows = vec![(Some(34), Some(3), Some("Indian"), Some("02/01/22"), Some("2022-01-10"))];
    match pipeline().run_batch(&loaded(&rows)).unwrap_err() {
        Error::DateParse { column, row, value } => {
            assert_eq!(column, "wait_start_date");
            assert_eq!(row, 0);
            assert_eq!(value, "02/01/22");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_invalid_thresholds_rejected_at_construction() {
    let config = PipelineConfig {
        thresholds: CleaningThresholds {
            min_waiting_days: 10,
            max_waiting_days: 10,
        },
        ..PipelineConfig::default()
    };
    assert!(matches!(Pipeline::new(config), Err(Error::Config(_))));
}
