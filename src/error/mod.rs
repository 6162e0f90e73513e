//! Error handling for the RTT pipeline.
//!
//! Every fallible operation in the crate returns [`Result`]. The variants map
//! onto the failure classes of the pipeline: unreadable input, a table that
//! does not have the expected shape, malformed dates, and ethnicity labels
//! the mapping table does not know about. Library errors raised while
//! transforming or exporting tables are wrapped as-is.

pub mod util;

use std::fmt;
use std::path::{Path, PathBuf};

use arrow::error::ArrowError;
use parquet::errors::ParquetError;
use serde::Serialize;

/// Named stages of the pipeline, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Reading the sheet into a typed table
    Load,
    /// Reporting fully duplicate rows
    Deduplicate,
    /// Dropping missing values, deriving waiting days and range filtering
    Clean,
    /// Mapping fine-grained ethnicity labels to coarse groups
    AggregateEthnicity,
    /// Per-group waiting-time statistics
    Summarize,
    /// Writing outputs for downstream tools
    Export,
}

impl Stage {
    /// Stable snake-case name used in logs and reports
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Deduplicate => "deduplicate",
            Self::Clean => "clean",
            Self::AggregateEthnicity => "aggregate_ethnicity",
            Self::Summarize => "summarize",
            Self::Export => "export",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors raised by the pipeline
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Source file or sheet could not be read
    #[error("Load error ({}): {message}", path.display())]
    Load {
        /// Path of the workbook
        path: PathBuf,
        /// What went wrong
        message: String,
    },

    /// Expected column absent or holding values of the wrong shape
    #[error("Schema error during {stage}: {message}")]
    Schema {
        /// Stage that found the problem
        stage: Stage,
        /// What went wrong
        message: String,
    },

    /// A date cell is present but cannot be parsed
    #[error("Date parsing error in column '{column}' at row {row}: cannot parse '{value}'")]
    DateParse {
        /// Column holding the date
        column: String,
        /// Zero-based row index in the table being cleaned
        row: usize,
        /// Offending cell text
        value: String,
    },

    /// A categorical value is missing from the mapping table
    #[error("Unmapped category in column '{column}' at row {row}: '{value}' is not in the mapping table")]
    UnmappedCategory {
        /// Column holding the label
        column: String,
        /// Zero-based row index in the table being aggregated
        row: usize,
        /// Offending label
        value: String,
    },

    /// Invalid configuration or mapping artifact
    #[error("Configuration error: {0}")]
    Config(String),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// Parquet error
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a load error for the given workbook
    pub fn load(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Load {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// Create a schema error raised by `stage`
    pub fn schema(stage: Stage, message: impl Into<String>) -> Self {
        Self::Schema {
            stage,
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Pipeline stage the error belongs to, when it is stage-specific
    #[must_use]
    pub const fn stage(&self) -> Option<Stage> {
        match self {
            Self::Load { .. } => Some(Stage::Load),
            Self::Schema { stage, .. } => Some(*stage),
            Self::DateParse { .. } => Some(Stage::Clean),
            Self::UnmappedCategory { .. } => Some(Stage::AggregateEthnicity),
            Self::Config(_)
            | Self::Arrow(_)
            | Self::Parquet(_)
            | Self::Io(_)
            | Self::Json(_) => None,
        }
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;
