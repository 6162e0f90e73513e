//! Cleaning and aggregation of referral-to-treatment (RTT) waiting times.
//!
//! Loads one sheet of a spreadsheet into an Arrow table, reports duplicate
//! rows, drops incomplete records, derives waiting days, filters them to a
//! valid window, maps fine-grained ethnicity to seven groups and summarises
//! waiting time per (IMD decile, ethnic group).

pub mod algorithm;
pub mod config;
pub mod error;
pub mod filter;
pub mod loader;
pub mod models;
pub mod pipeline;
pub mod schema;
pub mod utils;

// Core types
pub use config::{CleaningThresholds, LoaderConfig, PipelineConfig};
pub use error::{Error, Result, Stage};
pub use models::{AgeBand, EthnicGroup, ImdDecile};
pub use pipeline::{ExportedFiles, Pipeline, PipelineOutput, RunReport};
pub use schema::dates::DateFormatConfig;
pub use schema::{SchemaCompatibilityReport, SchemaIssue};

// Stages
pub use algorithm::{
    AggregationReport, CleaningReport, DuplicateGroup, DuplicateReport, EthnicityMapping,
    GroupKey, GroupSummary, GroupedSummary, SummaryTable, WaitingTimeDescription, aggregate,
    clean, derive_waiting_days, describe_waiting_days, drop_missing, filter_waiting_range,
    find_duplicates, percentile_linear, summarize, summarize_by,
};
pub use loader::{list_sheets, load_from_range, load_sheet};

// Arrow types
pub use arrow::record_batch::RecordBatch;
