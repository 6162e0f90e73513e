//! Waiting-time statistics and grouped summaries
//!
//! Percentiles use linear interpolation between order statistics: for
//! sorted values `x[0..n)` and probability `p`, the position is
//! `h = (n - 1) * p` and the result is
//! `x[floor(h)] + (h - floor(h)) * (x[floor(h) + 1] - x[floor(h)])`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, Float64Array, Int64Array, StringArray, UInt8Array, UInt64Array,
};
use arrow::compute::kernels::cast::cast;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use itertools::Itertools;
use serde::Serialize;

use crate::error::{Error, Result, Stage};
use crate::models::{AgeBand, EthnicGroup, ImdDecile};
use crate::schema::{AGG_ETHNICITY, IMD, PATIENT_AGE, WAITING_DAYS};
use crate::utils::arrow::{column_as, column_by_name, utf8_column};

/// Percentile of sorted values by linear interpolation, `p` in `[0, 1]`
#[must_use]
pub fn percentile_linear(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&p) {
        return None;
    }

    let h = (sorted.len() - 1) as f64 * p;
    let lower = h.floor() as usize;
    let upper = (lower + 1).min(sorted.len() - 1);
    let fraction = h - h.floor();

    Some(sorted[lower] + fraction * (sorted[upper] - sorted[lower]))
}

/// Median and interquartile range of a group of waiting times
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GroupSummary {
    /// Median waiting days
    pub median: f64,
    /// 25th percentile
    pub q1: f64,
    /// 75th percentile
    pub q3: f64,
    /// Records in the group
    pub count: usize,
}

impl GroupSummary {
    /// Summarise waiting times; `None` for an empty group
    #[must_use]
    pub fn from_values(values: &[i64]) -> Option<Self> {
        let sorted: Vec<f64> = values.iter().sorted_unstable().map(|v| *v as f64).collect();
        Some(Self {
            median: percentile_linear(&sorted, 0.5)?,
            q1: percentile_linear(&sorted, 0.25)?,
            q3: percentile_linear(&sorted, 0.75)?,
            count: sorted.len(),
        })
    }
}

/// Up to two decimals with trailing zeros trimmed. Quartiles of whole days
/// are multiples of 0.25, so this is exact.
fn format_days(value: f64) -> String {
    let text = format!("{value:.2}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

impl fmt::Display for GroupSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}–{}], n={}",
            format_days(self.median),
            format_days(self.q1),
            format_days(self.q3),
            self.count
        )
    }
}

/// Waiting-time summary per (IMD decile, ethnic group)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryTable {
    cells: BTreeMap<(ImdDecile, EthnicGroup), GroupSummary>,
}

impl SummaryTable {
    /// Summary for one cell, if the group has records
    #[must_use]
    pub fn get(&self, imd: ImdDecile, group: EthnicGroup) -> Option<&GroupSummary> {
        self.cells.get(&(imd, group))
    }

    /// Non-empty groups in (decile, group) order
    pub fn iter(&self) -> impl Iterator<Item = (&(ImdDecile, EthnicGroup), &GroupSummary)> {
        self.cells.iter()
    }

    /// Number of non-empty groups
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether there are no groups
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Records across all groups
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.cells.values().map(|summary| summary.count).sum()
    }

    /// Deciles that have at least one group, in rank order
    pub fn deciles(&self) -> impl Iterator<Item = ImdDecile> + '_ {
        self.cells.keys().map(|(imd, _)| *imd).dedup()
    }

    /// Pivot with one row per decile and one cell per ethnic group, in
    /// [`EthnicGroup::ALL`] order
    #[must_use]
    pub fn pivot(&self) -> Vec<(ImdDecile, [Option<&GroupSummary>; 7])> {
        self.deciles()
            .map(|imd| (imd, EthnicGroup::ALL.map(|group| self.get(imd, group))))
            .collect()
    }

    /// Long-form table for programmatic consumers
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let imd: UInt8Array = self.cells.keys().map(|(imd, _)| Some(imd.rank())).collect();
        let groups: StringArray = self.cells.keys().map(|(_, group)| Some(group.label())).collect();

        summary_batch(
            Field::new(IMD, DataType::UInt8, false),
            Arc::new(imd),
            Some((Field::new(AGG_ETHNICITY, DataType::Utf8, false), Arc::new(groups))),
            self.cells.values(),
        )
    }
}

/// Grouping key for single-key summaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GroupKey {
    /// IMD decile
    Imd,
    /// Aggregated ethnicity
    Ethnicity,
    /// Age band at referral
    AgeBand,
}

impl GroupKey {
    /// Column name used for the key in exported tables
    #[must_use]
    pub const fn column_name(self) -> &'static str {
        match self {
            Self::Imd => IMD,
            Self::Ethnicity => AGG_ETHNICITY,
            Self::AgeBand => "age_band",
        }
    }
}

/// Waiting-time summary per value of a single key, in key order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedSummary {
    /// Key the rows are grouped by
    pub key: GroupKey,
    /// `(key label, summary)` for each non-empty group
    pub groups: Vec<(String, GroupSummary)>,
}

impl GroupedSummary {
    /// Records across all groups
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.groups.iter().map(|(_, summary)| summary.count).sum()
    }

    /// Long-form table for programmatic consumers
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let labels: StringArray = self.groups.iter().map(|(label, _)| Some(label.as_str())).collect();
        summary_batch(
            Field::new(self.key.column_name(), DataType::Utf8, false),
            Arc::new(labels),
            None,
            self.groups.iter().map(|(_, summary)| summary),
        )
    }
}

fn summary_batch<'a>(
    key_field: Field,
    key: ArrayRef,
    second_key: Option<(Field, ArrayRef)>,
    summaries: impl Iterator<Item = &'a GroupSummary> + Clone,
) -> Result<RecordBatch> {
    let mut fields = vec![key_field];
    let mut columns = vec![key];
    if let Some((field, column)) = second_key {
        fields.push(field);
        columns.push(column);
    }

    let median: Float64Array = summaries.clone().map(|s| Some(s.median)).collect();
    let q1: Float64Array = summaries.clone().map(|s| Some(s.q1)).collect();
    let q3: Float64Array = summaries.clone().map(|s| Some(s.q3)).collect();
    let count: UInt64Array = summaries.map(|s| Some(s.count as u64)).collect();

    fields.extend([
        Field::new("median", DataType::Float64, false),
        Field::new("q1", DataType::Float64, false),
        Field::new("q3", DataType::Float64, false),
        Field::new("count", DataType::UInt64, false),
    ]);
    columns.extend([
        Arc::new(median) as ArrayRef,
        Arc::new(q1),
        Arc::new(q3),
        Arc::new(count),
    ]);

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

/// Summarise waiting days per (IMD decile, aggregated ethnicity)
///
/// Expects a cleaned and aggregated table. Groups without records are
/// omitted, so the counts sum to the table's row count.
pub fn summarize(batch: &RecordBatch) -> Result<SummaryTable> {
    let waiting = waiting_days(batch)?;
    let deciles = imd_values(batch)?;
    let groups = ethnic_group_values(batch)?;

    let mut values: BTreeMap<(ImdDecile, EthnicGroup), Vec<i64>> = BTreeMap::new();
    for ((imd, group), days) in deciles.into_iter().zip(groups).zip(waiting) {
        values.entry((imd, group)).or_default().push(days);
    }

    let cells = values
        .into_iter()
        .filter_map(|(key, days)| GroupSummary::from_values(&days).map(|summary| (key, summary)))
        .collect();

    Ok(SummaryTable { cells })
}

/// Summarise waiting days per value of a single key
pub fn summarize_by(batch: &RecordBatch, key: GroupKey) -> Result<GroupedSummary> {
    let waiting = waiting_days(batch)?;

    let groups = match key {
        GroupKey::Imd => group_values(imd_values(batch)?, waiting, |imd| imd.to_string()),
        GroupKey::Ethnicity => {
            group_values(ethnic_group_values(batch)?, waiting, |group| group.label().to_string())
        }
        GroupKey::AgeBand => {
            group_values(age_band_values(batch)?, waiting, |band| band.label().to_string())
        }
    };

    Ok(GroupedSummary { key, groups })
}

fn group_values<K: Ord>(
    keys: Vec<K>,
    waiting: Vec<i64>,
    label: impl Fn(&K) -> String,
) -> Vec<(String, GroupSummary)> {
    let mut values: BTreeMap<K, Vec<i64>> = BTreeMap::new();
    for (key, days) in keys.into_iter().zip(waiting) {
        values.entry(key).or_default().push(days);
    }

    values
        .into_iter()
        .filter_map(|(key, days)| GroupSummary::from_values(&days).map(|s| (label(&key), s)))
        .collect()
}

/// Overall distribution of waiting days
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WaitingTimeDescription {
    /// Records described
    pub count: usize,
    /// Shortest wait
    pub min: i64,
    /// Longest wait
    pub max: i64,
    /// Mean wait
    pub mean: f64,
    /// Median and quartiles
    pub summary: GroupSummary,
}

/// Describe the waiting-day distribution; `None` for an empty table
pub fn describe_waiting_days(batch: &RecordBatch) -> Result<Option<WaitingTimeDescription>> {
    let waiting = waiting_days(batch)?;
    let Some(summary) = GroupSummary::from_values(&waiting) else {
        return Ok(None);
    };
    let (Some(min), Some(max)) = (waiting.iter().min(), waiting.iter().max()) else {
        return Ok(None);
    };
    let mean = waiting.iter().map(|v| *v as f64).sum::<f64>() / waiting.len() as f64;

    Ok(Some(WaitingTimeDescription {
        count: waiting.len(),
        min: *min,
        max: *max,
        mean,
        summary,
    }))
}

fn non_null_error(column: &str, row: usize) -> Error {
    Error::schema(
        Stage::Summarize,
        format!("Column '{column}' has a missing value at row {row}; clean the table first"),
    )
}

fn waiting_days(batch: &RecordBatch) -> Result<Vec<i64>> {
    column_as::<Int64Array>(batch, WAITING_DAYS, Stage::Summarize)?
        .iter()
        .enumerate()
        .map(|(row, value)| value.ok_or_else(|| non_null_error(WAITING_DAYS, row)))
        .collect()
}

fn imd_values(batch: &RecordBatch) -> Result<Vec<ImdDecile>> {
    let column = column_by_name(batch, IMD, Stage::Summarize)?;
    let column = if column.data_type() == &DataType::UInt8 {
        Arc::clone(column)
    } else {
        cast(column, &DataType::UInt8)?
    };
    let ranks = column
        .as_any()
        .downcast_ref::<UInt8Array>()
        .ok_or_else(|| Error::schema(Stage::Summarize, format!("Column '{IMD}' is not numeric")))?;

    ranks
        .iter()
        .enumerate()
        .map(|(row, rank)| {
            let rank = rank.ok_or_else(|| non_null_error(IMD, row))?;
            ImdDecile::new(rank).ok_or_else(|| {
                Error::schema(
                    Stage::Summarize,
                    format!("Column '{IMD}' has rank {rank} outside 1..=10 at row {row}"),
                )
            })
        })
        .collect()
}

fn ethnic_group_values(batch: &RecordBatch) -> Result<Vec<EthnicGroup>> {
    let labels = utf8_column(batch, AGG_ETHNICITY, Stage::Summarize)?;
    labels
        .iter()
        .enumerate()
        .map(|(row, label)| {
            let label = label.ok_or_else(|| non_null_error(AGG_ETHNICITY, row))?;
            EthnicGroup::from_label(label).ok_or_else(|| {
                Error::schema(
                    Stage::Summarize,
                    format!("Column '{AGG_ETHNICITY}' has unknown group '{label}' at row {row}"),
                )
            })
        })
        .collect()
}

fn age_band_values(batch: &RecordBatch) -> Result<Vec<AgeBand>> {
    column_as::<Int64Array>(batch, PATIENT_AGE, Stage::Summarize)?
        .iter()
        .enumerate()
        .map(|(row, age)| {
            let age = age.ok_or_else(|| non_null_error(PATIENT_AGE, row))?;
            AgeBand::from_age(age).ok_or_else(|| {
                Error::schema(
                    Stage::Summarize,
                    format!("Column '{PATIENT_AGE}' has negative age {age} at row {row}"),
                )
            })
        })
        .collect()
}
