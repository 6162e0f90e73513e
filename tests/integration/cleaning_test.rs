use rtt_waits::schema::WAITING_DAYS;
use rtt_waits::{CleaningThresholds, DateFormatConfig, clean, drop_missing};

use crate::utils::{loaded, referral_rows, synthetic_rows};

#[test]
fn test_clean_is_idempotent() -> rtt_waits::Result<()> {
    let batch = loaded(&synthetic_rows(120));
    let thresholds = CleaningThresholds::default();
    let dates = DateFormatConfig::default();

    let (once, first) = clean(&batch, &thresholds, &dates)?;
    let (twice, second) = clean(&once, &thresholds, &dates)?;

    assert_eq!(once, twice);
    assert_eq!(second.input_rows, first.output_rows);
    assert_eq!(second.missing_removed, 0);
    assert_eq!(second.out_of_range_removed, 0);
    Ok(())
}

#[test]
fn test_referral_window_examples() -> rtt_waits::Result<()> {
    let batch = loaded(&referral_rows());
    let (cleaned, report) = clean(&batch, &CleaningThresholds::default(), &DateFormatConfig::default())?;

    assert_eq!(report.input_rows, 8);
    assert_eq!(report.output_rows, cleaned.num_rows());
    assert_eq!(
        report.input_rows,
        report.missing_removed + report.out_of_range_removed + report.output_rows
    );
    assert!(cleaned.column_by_name(WAITING_DAYS).is_some());
    Ok(())
}

#[test]
fn test_narrow_window_keeps_fewer_rows() -> rtt_waits::Result<()> {
    let batch = loaded(&referral_rows());
    let dates = DateFormatConfig::default();

    let (wide, _) = clean(&batch, &CleaningThresholds::default(), &dates)?;
    let (narrow, report) = clean(&batch, &CleaningThresholds::new(10, 40)?, &dates)?;

    assert_eq!(wide.num_rows(), 4);
    assert_eq!(narrow.num_rows(), 1);
    assert_eq!(report.out_of_range_removed, 5);
    Ok(())
}

#[test]
fn test_drop_missing_counts_rows_with_any_null() -> rtt_waits::Result<()> {
    let batch = loaded(&referral_rows());
    let (complete, removed) = drop_missing(&batch)?;
    assert_eq!(removed, 2);
    assert_eq!(complete.num_rows(), 6);
    Ok(())
}
