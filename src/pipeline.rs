//! End-to-end pipeline
//!
//! Runs the stages in their fixed order: load, deduplicate, clean, aggregate
//! ethnicity, summarise. Every stage receives the previous stage's table and
//! returns a new one.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

use arrow::record_batch::RecordBatch;
use serde::Serialize;

use crate::algorithm::{
    AggregationReport, CleaningReport, DuplicateReport, EthnicityMapping, GroupKey,
    GroupedSummary, SummaryTable, WaitingTimeDescription, aggregate, clean, describe_waiting_days,
    find_duplicates, summarize, summarize_by,
};
use crate::config::PipelineConfig;
use crate::error::util::ensure_output_directory;
use crate::error::{Result, Stage};
use crate::loader::load_sheet;
use crate::utils::io::{write_csv, write_json, write_parquet};
use crate::utils::logging::{log_operation_complete, log_operation_start};

/// A configured pipeline
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    mapping: EthnicityMapping,
}

impl Pipeline {
    /// Create a pipeline, reading the mapping artifact named in the
    /// configuration or falling back to the embedded one
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let mapping = match &config.mapping_path {
            Some(path) => EthnicityMapping::from_file(path)?,
            None => EthnicityMapping::embedded()?,
        };
        Self::with_mapping(config, mapping)
    }

    /// Create a pipeline with an explicit mapping
    pub fn with_mapping(config: PipelineConfig, mapping: EthnicityMapping) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, mapping })
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Active ethnicity mapping
    #[must_use]
    pub const fn mapping(&self) -> &EthnicityMapping {
        &self.mapping
    }

    /// Load the configured sheet of `path` and run every stage
    pub fn run(&self, path: &Path) -> Result<PipelineOutput> {
        let loaded = load_sheet(path, &self.config.loader)?;
        self.run_batch(&loaded)
    }

    /// Run every stage after loading on an already loaded table
    pub fn run_batch(&self, loaded: &RecordBatch) -> Result<PipelineOutput> {
        let start = Instant::now();

        let duplicates = find_duplicates(loaded)?;
        let (cleaned, cleaning) = clean(loaded, &self.config.thresholds, &self.config.dates)?;
        let (cleaned, aggregation) = aggregate(&cleaned, &self.mapping)?;

        log_operation_start(Stage::Summarize, cleaned.num_rows());
        let summary = summarize(&cleaned)?;
        log_operation_complete(Stage::Summarize, summary.len(), None);

        log::info!(
            "Pipeline finished in {:?}: {} of {} rows kept in {} groups",
            start.elapsed(),
            cleaned.num_rows(),
            loaded.num_rows(),
            summary.len()
        );

        Ok(PipelineOutput {
            loaded_rows: loaded.num_rows(),
            duplicates,
            cleaning,
            aggregation,
            cleaned,
            summary,
        })
    }
}

/// Tables and reports produced by one run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Rows in the loaded table
    pub loaded_rows: usize,
    /// Duplicate rows found in the loaded table
    pub duplicates: DuplicateReport,
    /// Rows removed by each cleaning step
    pub cleaning: CleaningReport,
    /// Records per aggregated ethnic group
    pub aggregation: AggregationReport,
    /// Cleaned table with `waiting_days` and `agg_ethnicity`
    pub cleaned: RecordBatch,
    /// Waiting-time summary per (IMD decile, ethnic group)
    pub summary: SummaryTable,
}

impl PipelineOutput {
    /// Summary over a single grouping key
    pub fn summarize_by(&self, key: GroupKey) -> Result<GroupedSummary> {
        summarize_by(&self.cleaned, key)
    }

    /// Overall waiting-time distribution of the cleaned table
    pub fn describe(&self) -> Result<Option<WaitingTimeDescription>> {
        describe_waiting_days(&self.cleaned)
    }

    /// Serializable overview of the run
    pub fn report(&self) -> Result<RunReport> {
        Ok(RunReport {
            loaded_rows: self.loaded_rows,
            duplicate_groups: self.duplicates.groups.len(),
            duplicate_surplus_rows: self.duplicates.surplus_rows(),
            cleaning: self.cleaning,
            aggregation: self.aggregation.clone(),
            summary_groups: self.summary.len(),
            waiting_days: self.describe()?,
        })
    }

    /// Write the cleaned table, the summary and the reports to `out_dir`
    pub fn export(&self, out_dir: &Path) -> Result<ExportedFiles> {
        log_operation_start(Stage::Export, self.cleaned.num_rows());
        ensure_output_directory(out_dir)?;

        let files = ExportedFiles::in_dir(out_dir);
        write_csv(&self.cleaned, &files.cleaned_csv)?;
        write_parquet(&self.cleaned, &files.cleaned_parquet)?;
        write_csv(&self.summary.to_record_batch()?, &files.summary_csv)?;
        write_json(&self.duplicates, &files.duplicates_json)?;
        write_json(&self.report()?, &files.report_json)?;

        log::info!("Exported outputs to {}", out_dir.display());
        Ok(files)
    }
}

/// Paths written by [`PipelineOutput::export`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFiles {
    /// Cleaned table as CSV
    pub cleaned_csv: PathBuf,
    /// Cleaned table as Parquet
    pub cleaned_parquet: PathBuf,
    /// Long-form summary as CSV
    pub summary_csv: PathBuf,
    /// Duplicate report as JSON
    pub duplicates_json: PathBuf,
    /// Run report as JSON
    pub report_json: PathBuf,
}

impl ExportedFiles {
    fn in_dir(dir: &Path) -> Self {
        Self {
            cleaned_csv: dir.join("cleaned.csv"),
            cleaned_parquet: dir.join("cleaned.parquet"),
            summary_csv: dir.join("summary.csv"),
            duplicates_json: dir.join("duplicates.json"),
            report_json: dir.join("report.json"),
        }
    }

    /// All paths in write order
    #[must_use]
    pub fn paths(&self) -> [&Path; 5] {
        [
            &self.cleaned_csv,
            &self.cleaned_parquet,
            &self.summary_csv,
            &self.duplicates_json,
            &self.report_json,
        ]
    }
}

/// Overview of a run, as printed and exported
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    /// Rows in the loaded table
    pub loaded_rows: usize,
    /// Groups of identical rows
    pub duplicate_groups: usize,
    /// Rows beyond the first of each duplicate group
    pub duplicate_surplus_rows: usize,
    /// Cleaning counts
    pub cleaning: CleaningReport,
    /// Aggregation counts
    pub aggregation: AggregationReport,
    /// Non-empty (IMD decile, ethnic group) cells
    pub summary_groups: usize,
    /// Distribution of waiting days after cleaning
    pub waiting_days: Option<WaitingTimeDescription>,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Run report:")?;
        writeln!(f, "  Loaded rows: {}", self.loaded_rows)?;
        writeln!(
            f,
            "  Duplicate groups: {} ({} surplus rows, kept)",
            self.duplicate_groups, self.duplicate_surplus_rows
        )?;
        writeln!(f, "  Removed for missing values: {}", self.cleaning.missing_removed)?;
        writeln!(
            f,
            "  Removed for waiting days out of range: {}",
            self.cleaning.out_of_range_removed
        )?;
        writeln!(f, "  Cleaned rows: {}", self.cleaning.output_rows)?;
        writeln!(f, "  Mapping version: {}", self.aggregation.mapping_version)?;
        for (group, count) in &self.aggregation.group_counts {
            writeln!(f, "    {group}: {count}")?;
        }
        writeln!(f, "  Summary groups: {}", self.summary_groups)?;
        if let Some(waiting) = &self.waiting_days {
            writeln!(
                f,
                "  Waiting days: {} (mean {:.1}, min {}, max {})",
                waiting.summary, waiting.mean, waiting.min, waiting.max
            )?;
        }
        Ok(())
    }
}
