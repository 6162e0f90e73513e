//! Pipeline stages operating on loaded tables
//!
//! Each stage takes a [`RecordBatch`](arrow::record_batch::RecordBatch) by
//! reference and returns a new table plus a report; nothing is modified in
//! place.

pub mod cleaning;
pub mod dedup;
pub mod ethnicity;
pub mod statistics;

pub use cleaning::{CleaningReport, clean, derive_waiting_days, drop_missing, filter_waiting_range};
pub use dedup::{DuplicateGroup, DuplicateReport, find_duplicates};
pub use ethnicity::{AggregationReport, EthnicityMapping, aggregate};
pub use statistics::{
    GroupKey, GroupSummary, GroupedSummary, SummaryTable, WaitingTimeDescription,
    describe_waiting_days, percentile_linear, summarize, summarize_by,
};
