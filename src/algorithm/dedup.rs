//! Duplicate row detection
//!
//! Rows that are identical across every column are grouped and reported.
//! The table itself is never modified: in a synthetic extract identical rows
//! may be legitimate coincidences, so removal is left to the caller.

use arrow::array::Array;
use arrow::record_batch::RecordBatch;
use arrow::row::{RowConverter, SortField};
use arrow::util::display::array_value_to_string;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::error::{Error, Result, Stage};
use crate::utils::logging::log_warning;

/// A set of identical rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    /// Zero-based indices of the identical rows, ascending
    pub rows: Vec<usize>,
    /// Shared values as `(column, value)`; `None` for nulls
    pub values: Vec<(String, Option<String>)>,
}

impl DuplicateGroup {
    /// Number of times the row occurs
    #[must_use]
    pub fn count(&self) -> usize {
        self.rows.len()
    }

    /// Index of the first occurrence
    #[must_use]
    pub fn first_row(&self) -> usize {
        self.rows.first().copied().unwrap_or_default()
    }
}

/// Result of scanning a table for duplicate rows
#[derive(Debug, Clone, Default, Serialize)]
pub struct DuplicateReport {
    /// Rows scanned
    pub total_rows: usize,
    /// Groups of identical rows, ordered by first occurrence
    pub groups: Vec<DuplicateGroup>,
}

impl DuplicateReport {
    /// Whether no duplicates were found
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Rows beyond the first occurrence of each group
    #[must_use]
    pub fn surplus_rows(&self) -> usize {
        self.groups.iter().map(|group| group.count() - 1).sum()
    }
}

/// Find groups of rows that are identical across all columns
///
/// Nulls compare equal to nulls. The batch is only read.
pub fn find_duplicates(batch: &RecordBatch) -> Result<DuplicateReport> {
    let total_rows = batch.num_rows();
    if batch.num_columns() == 0 || total_rows < 2 {
        return Ok(DuplicateReport {
            total_rows,
            groups: Vec::new(),
        });
    }

    let sort_fields = batch
        .schema()
        .fields()
        .iter()
        .map(|field| SortField::new(field.data_type().clone()))
        .collect();
    let converter = RowConverter::new(sort_fields)?;
    let rows = converter.convert_columns(batch.columns())?;

    let mut occurrences: FxHashMap<_, Vec<usize>> = FxHashMap::default();
    for idx in 0..total_rows {
        occurrences.entry(rows.row(idx)).or_default().push(idx);
    }

    let mut groups = Vec::new();
    for indices in occurrences.into_values().filter(|indices| indices.len() > 1) {
        groups.push(DuplicateGroup {
            values: row_values(batch, indices[0])?,
            rows: indices,
        });
    }
    groups.sort_by_key(DuplicateGroup::first_row);

    let report = DuplicateReport { total_rows, groups };
    if !report.is_empty() {
        log_warning(
            Stage::Deduplicate,
            &format!(
                "{} duplicate groups covering {} surplus rows (kept in table)",
                report.groups.len(),
                report.surplus_rows()
            ),
        );
    }

    Ok(report)
}

fn row_values(batch: &RecordBatch, row: usize) -> Result<Vec<(String, Option<String>)>> {
    let schema = batch.schema();
    schema
        .fields()
        .iter()
        .zip(batch.columns())
        .map(|(field, column)| {
            let value = if column.is_null(row) {
                None
            } else {
                Some(array_value_to_string(column.as_ref(), row)?)
            };
            Ok::<_, Error>((field.name().clone(), value))
        })
        .collect()
}
