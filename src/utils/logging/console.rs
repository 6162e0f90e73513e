//! Console output utilities
//!
//! Plain-text rendering of reports and summaries for the command line.

use std::fmt;

use crate::algorithm::{DuplicateReport, GroupedSummary, SummaryTable};
use crate::models::EthnicGroup;

const CELL_WIDTH: usize = 24;

/// Pivot view of a [`SummaryTable`]: one row per IMD decile, one column per
/// ethnic group. Empty cells show `-`.
pub struct SummaryPivot<'a>(pub &'a SummaryTable);

impl fmt::Display for SummaryPivot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<5}", "IMD")?;
        for group in EthnicGroup::ALL {
            write!(f, "{:<CELL_WIDTH$}", group.label())?;
        }
        writeln!(f)?;

        for (imd, cells) in self.0.pivot() {
            write!(f, "{:<5}", imd.rank())?;
            for cell in cells {
                match cell {
                    Some(summary) => write!(f, "{:<CELL_WIDTH$}", summary.to_string())?,
                    None => write!(f, "{:<CELL_WIDTH$}", "-")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// One line per group of a [`GroupedSummary`]
pub struct GroupedLines<'a>(pub &'a GroupedSummary);

impl fmt::Display for GroupedLines<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Waiting days by {}:", self.0.key.column_name())?;
        for (label, group) in &self.0.groups {
            writeln!(f, "  {label:<CELL_WIDTH$}{group}")?;
        }
        Ok(())
    }
}

/// Render the summary as a pivot
#[must_use]
pub fn format_summary_pivot(summary: &SummaryTable) -> String {
    SummaryPivot(summary).to_string()
}

/// Render a single-key summary as one line per group
#[must_use]
pub fn format_grouped_summary(summary: &GroupedSummary) -> String {
    GroupedLines(summary).to_string()
}

/// Print the summary pivot
pub fn print_summary_pivot(summary: &SummaryTable) {
    println!("Median waiting days [Q1–Q3] by IMD decile and ethnicity:");
    print!("{}", SummaryPivot(summary));
}

/// Print a single-key summary
pub fn print_grouped_summary(summary: &GroupedSummary) {
    print!("{}", GroupedLines(summary));
}

/// Print up to `limit` duplicate groups with their shared values
pub fn print_duplicates(report: &DuplicateReport, limit: usize) {
    if report.is_empty() {
        println!("No duplicate rows found in {} rows", report.total_rows);
        return;
    }

    println!(
        "{} duplicate groups ({} surplus rows) in {} rows:",
        report.groups.len(),
        report.surplus_rows(),
        report.total_rows
    );
    for group in report.groups.iter().take(limit) {
        let values = group
            .values
            .iter()
            .map(|(column, value)| format!("{column}={}", value.as_deref().unwrap_or("NULL")))
            .collect::<Vec<_>>()
            .join(", ");
        println!("  rows {:?}: {values}", group.rows);
    }
    if report.groups.len() > limit {
        println!("  ... {} more", report.groups.len() - limit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::{GroupKey, GroupSummary};

    #[test]
    fn test_grouped_summary_lines() {
        let summary = GroupedSummary {
            key: GroupKey::Imd,
            groups: vec![(
                "3".to_string(),
                GroupSummary::from_values(&[5, 5, 6, 20, 21]).unwrap(),
            )],
        };
        let text = format_grouped_summary(&summary);
        assert!(text.starts_with("Waiting days by index_of_multiple_deprivation:"));
        assert!(text.contains("6 [5–20], n=5"));
    }

    #[test]
    fn test_empty_pivot_has_header_only() {
        let text = format_summary_pivot(&SummaryTable::default());
        assert_eq!(text.lines().count(), 1);
        assert!(text.contains("Unknown/Unwilling"));
    }

    #[test]
    fn test_pivot_cells_and_gaps() {
        use std::sync::Arc;

        use arrow::array::{Int64Array, StringArray, UInt8Array};
        use arrow::datatypes::{DataType, Field, Schema};
        use arrow::record_batch::RecordBatch;

        use crate::algorithm::summarize;

        let batch = RecordBatch::try_new(
            Arc::new(Schema::new(vec![
                Field::new("index_of_multiple_deprivation", DataType::UInt8, false),
                Field::new("agg_ethnicity", DataType::Utf8, false),
                Field::new("waiting_days", DataType::Int64, false),
            ])),
            vec![
                Arc::new(UInt8Array::from(vec![2, 2])),
                Arc::new(StringArray::from(vec!["Black", "Black"])),
                Arc::new(Int64Array::from(vec![4, 6])),
            ],
        )
        .unwrap();
        let text = format_summary_pivot(&summarize(&batch).unwrap());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("2    "));
        assert!(lines[1].contains("5 [4.5–5.5], n=2"));
        assert_eq!(lines[1].matches('-').count(), 6);
    }
}
