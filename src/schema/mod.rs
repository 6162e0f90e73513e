//! Column layout of the RTT table.
//!
//! Column names are normalised on load, so the rest of the crate only ever
//! sees the lower-case, underscore-separated names defined here.

pub mod dates;

use std::collections::HashSet;

use arrow::datatypes::{DataType, Field};

use crate::error::{Error, Result, Stage};

/// Patient age in whole years
pub const PATIENT_AGE: &str = "patient_age";
/// Index of Multiple Deprivation decile (1 = most deprived)
pub const IMD: &str = "index_of_multiple_deprivation";
/// Fine-grained ethnicity label
pub const ETHNICITY: &str = "ethnicity";
/// Referral date
pub const WAIT_START_DATE: &str = "wait_start_date";
/// Treatment date
pub const SEEN_DATE: &str = "seen_date";
/// Derived waiting time in days
pub const WAITING_DAYS: &str = "waiting_days";
/// Derived coarse ethnicity group
pub const AGG_ETHNICITY: &str = "agg_ethnicity";

/// Columns that must be present and non-missing for analysis
pub const CORE_COLUMNS: [&str; 5] = [IMD, ETHNICITY, PATIENT_AGE, WAIT_START_DATE, SEEN_DATE];

/// Date columns, parsed by the cleaner
pub const DATE_COLUMNS: [&str; 2] = [WAIT_START_DATE, SEEN_DATE];

/// Normalise a header to lower case with underscores.
///
/// Every run of characters that is not a letter or digit becomes a single
/// underscore and leading/trailing underscores are dropped, so
/// `"Index of Multiple Deprivation"` becomes `index_of_multiple_deprivation`
/// and `"Wait-Start Date "` becomes `wait_start_date`.
#[must_use]
pub fn normalize_column_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut pending_separator = false;

    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_separator && !normalized.is_empty() {
                normalized.push('_');
            }
            pending_separator = false;
            normalized.extend(c.to_lowercase());
        } else {
            pending_separator = true;
        }
    }

    normalized
}

/// Arrow type the loader produces for a column
#[must_use]
pub fn loaded_data_type(column: &str) -> DataType {
    match column {
        PATIENT_AGE => DataType::Int64,
        IMD => DataType::UInt8,
        ETHNICITY => DataType::Dictionary(Box::new(DataType::Int32), Box::new(DataType::Utf8)),
        _ => DataType::Utf8,
    }
}

/// Nullable field for a loaded column
#[must_use]
pub fn loaded_field(column: &str) -> Field {
    Field::new(column, loaded_data_type(column), true)
}

/// Result of checking a header row against the expected columns
#[derive(Debug)]
pub struct SchemaCompatibilityReport {
    /// Whether the header satisfies all requirements
    pub compatible: bool,
    /// Problems found, if any
    pub issues: Vec<SchemaIssue>,
}

/// A single header problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaIssue {
    /// A required column is absent
    MissingColumn(String),
    /// Two source headers normalise to the same name
    DuplicateColumn(String),
}

impl std::fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingColumn(name) => write!(f, "missing required column '{name}'"),
            Self::DuplicateColumn(name) => write!(f, "duplicate column '{name}' after normalisation"),
        }
    }
}

impl SchemaCompatibilityReport {
    /// Turn an incompatible report into a schema error
    pub fn into_result(self, stage: Stage) -> Result<()> {
        if self.compatible {
            return Ok(());
        }
        let message = self
            .issues
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Err(Error::schema(stage, message))
    }
}

/// Check normalised column names against the required columns
#[must_use]
pub fn check_columns<S: AsRef<str>>(columns: &[S], required: &[&str]) -> SchemaCompatibilityReport {
    let mut issues = Vec::new();
    let mut seen = HashSet::new();

    for column in columns {
        let column = column.as_ref();
        if !seen.insert(column) {
            issues.push(SchemaIssue::DuplicateColumn(column.to_string()));
        }
    }

    for name in required {
        if !seen.contains(name) {
            issues.push(SchemaIssue::MissingColumn((*name).to_string()));
        }
    }

    SchemaCompatibilityReport {
        compatible: issues.is_empty(),
        issues,
    }
}
