//! Cleaning of loaded RTT records
//!
//! Cleaning runs three steps in a fixed order, each available on its own:
//!
//! 1. [`drop_missing`] removes records with a null in any core column.
//! 2. [`derive_waiting_days`] parses both date columns and adds
//!    `waiting_days = seen_date - wait_start_date`.
//! 3. [`filter_waiting_range`] drops records whose waiting time falls
//!    outside `[min_waiting_days, max_waiting_days)`.
//!
//! Step 2 relies on step 1: date parsing only sees non-null cells, so a null
//! date is counted as missing rather than reported as unparsable. Rows in
//! errors raised by [`clean`] index the table handed to it.

use std::sync::Arc;
use std::time::Instant;

use arrow::array::{Array, ArrayRef, Date32Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field};
use arrow::record_batch::RecordBatch;
use serde::Serialize;

use crate::config::CleaningThresholds;
use crate::error::{Error, Result, Stage};
use crate::filter::{Expr, apply_filter, evaluate_expr, filter_record_batch};
use crate::schema::dates::{DateFormatConfig, date_to_days, parse_date_string};
use crate::schema::{CORE_COLUMNS, SEEN_DATE, WAIT_START_DATE, WAITING_DAYS};
use crate::utils::arrow::{column_as, column_by_name, with_column};
use crate::utils::logging::{log_operation_complete, log_operation_start};

/// Row counts for one cleaning run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleaningReport {
    /// Rows handed to the cleaner
    pub input_rows: usize,
    /// Rows dropped for a missing core value
    pub missing_removed: usize,
    /// Rows dropped for a waiting time outside the window
    pub out_of_range_removed: usize,
    /// Rows kept
    pub output_rows: usize,
}

/// Run all cleaning steps in order
pub fn clean(
    batch: &RecordBatch,
    thresholds: &CleaningThresholds,
    dates: &DateFormatConfig,
) -> Result<(RecordBatch, CleaningReport)> {
    thresholds.validate()?;
    let start = Instant::now();
    log_operation_start(Stage::Clean, batch.num_rows());

    let (complete, kept_rows) = complete_rows(batch)?;
    let missing_removed = batch.num_rows() - kept_rows.len();
    let derived = derive_waiting_days(&complete, dates).map_err(|e| match e {
        Error::DateParse { column, row, value } => Error::DateParse {
            column,
            row: kept_rows.get(row).copied().unwrap_or(row),
            value,
        },
        other => other,
    })?;
    let (cleaned, out_of_range_removed) = filter_waiting_range(&derived, thresholds)?;

    let report = CleaningReport {
        input_rows: batch.num_rows(),
        missing_removed,
        out_of_range_removed,
        output_rows: cleaned.num_rows(),
    };
    log::info!(
        "Removed {missing_removed} rows with missing values and {out_of_range_removed} rows with waiting days outside [{}, {})",
        thresholds.min_waiting_days,
        thresholds.max_waiting_days
    );
    log_operation_complete(Stage::Clean, cleaned.num_rows(), Some(start.elapsed()));

    Ok((cleaned, report))
}

/// Remove records with a null in any core column, returning the kept rows
/// and the number removed
pub fn drop_missing(batch: &RecordBatch) -> Result<(RecordBatch, usize)> {
    let (complete, kept_rows) = complete_rows(batch)?;
    Ok((complete, batch.num_rows() - kept_rows.len()))
}

/// Rows without a missing core value, plus their indices in `batch`
fn complete_rows(batch: &RecordBatch) -> Result<(RecordBatch, Vec<usize>)> {
    let mask = evaluate_expr(batch, &Expr::all_not_null(&CORE_COLUMNS), Stage::Clean)?;
    let kept_rows: Vec<usize> = mask
        .iter()
        .enumerate()
        .filter_map(|(row, keep)| (keep == Some(true)).then_some(row))
        .collect();
    let complete = filter_record_batch(batch, &mask)?;

    log::debug!(
        "Dropped {} rows with a missing core value",
        batch.num_rows() - kept_rows.len()
    );
    Ok((complete, kept_rows))
}

/// Parse the date columns to `Date32` and add `waiting_days`
///
/// Text date cells are parsed with `dates`; columns that are already
/// `Date32` pass through unchanged. An existing `waiting_days` column is
/// replaced. A non-null date that cannot be parsed fails the whole run.
pub fn derive_waiting_days(batch: &RecordBatch, dates: &DateFormatConfig) -> Result<RecordBatch> {
    let wait_start = parse_date_column(batch, WAIT_START_DATE, dates)?;
    let seen = parse_date_column(batch, SEEN_DATE, dates)?;

    let waiting_days: Int64Array = wait_start
        .iter()
        .zip(seen.iter())
        .map(|(start, seen)| match (start, seen) {
            (Some(start), Some(seen)) => Some(i64::from(seen) - i64::from(start)),
            _ => None,
        })
        .collect();

    let nullable = waiting_days.null_count() > 0;
    let batch = with_column(
        batch,
        Field::new(WAIT_START_DATE, DataType::Date32, wait_start.null_count() > 0),
        Arc::new(wait_start) as ArrayRef,
    )?;
    let batch = with_column(
        &batch,
        Field::new(SEEN_DATE, DataType::Date32, seen.null_count() > 0),
        Arc::new(seen) as ArrayRef,
    )?;
    with_column(
        &batch,
        Field::new(WAITING_DAYS, DataType::Int64, nullable),
        Arc::new(waiting_days) as ArrayRef,
    )
}

/// Keep records with `waiting_days` in `[min_waiting_days, max_waiting_days)`,
/// returning the kept rows and the number removed
pub fn filter_waiting_range(
    batch: &RecordBatch,
    thresholds: &CleaningThresholds,
) -> Result<(RecordBatch, usize)> {
    thresholds.validate()?;
    let expr = Expr::in_range(
        WAITING_DAYS,
        thresholds.min_waiting_days,
        thresholds.max_waiting_days,
    );
    let (kept, removed) = apply_filter(batch, &expr, Stage::Clean)?;
    log::debug!("Dropped {removed} rows with waiting days out of range");
    Ok((kept, removed))
}

/// Read a date column as `Date32`, parsing text cells
fn parse_date_column(
    batch: &RecordBatch,
    column_name: &str,
    dates: &DateFormatConfig,
) -> Result<Date32Array> {
    let column = column_by_name(batch, column_name, Stage::Clean)?;

    match column.data_type() {
        DataType::Date32 => Ok(column_as::<Date32Array>(batch, column_name, Stage::Clean)?.clone()),
        DataType::Utf8 => {
            let text = column_as::<StringArray>(batch, column_name, Stage::Clean)?;
            text.iter()
                .enumerate()
                .map(|(row, value)| match value {
                    None => Ok(None),
                    Some(value) => parse_date_string(value, dates)
                        .map(|date| Some(date_to_days(date)))
                        .ok_or_else(|| Error::DateParse {
                            column: column_name.to_string(),
                            row,
                            value: value.to_string(),
                        }),
                })
                .collect()
        }
        other => Err(Error::schema(
            Stage::Clean,
            format!("Column '{column_name}' has type {other}, expected text or Date32"),
        )),
    }
}
