//! Ethnicity aggregation
//!
//! Maps fine-grained ethnicity labels to the seven [`EthnicGroup`]s using a
//! versioned mapping artifact. The default artifact is compiled in from
//! `config/ethnicity_mapping.toml`; a reviewed copy can be supplied at run
//! time instead. Labels missing from the table are errors, never defaulted.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use arrow::array::{Array, ArrayRef, StringBuilder};
use arrow::datatypes::{DataType, Field};
use arrow::record_batch::RecordBatch;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, Stage};
use crate::models::EthnicGroup;
use crate::schema::{AGG_ETHNICITY, ETHNICITY};
use crate::utils::arrow::{utf8_column, with_column};
use crate::utils::logging::{log_operation_complete, log_operation_start};

/// Mapping artifact shipped with the crate
pub const DEFAULT_MAPPING_TOML: &str = include_str!("../../config/ethnicity_mapping.toml");

#[derive(Debug, Deserialize)]
struct MappingFile {
    version: u32,
    mapping: BTreeMap<String, EthnicGroup>,
}

/// Lookup table from fine-grained labels to coarse groups
#[derive(Debug, Clone)]
pub struct EthnicityMapping {
    version: u32,
    table: FxHashMap<String, EthnicGroup>,
}

impl EthnicityMapping {
    /// The mapping compiled into the crate
    pub fn embedded() -> Result<Self> {
        Self::from_toml_str(DEFAULT_MAPPING_TOML)
    }

    /// Parse a mapping artifact
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: MappingFile = toml::from_str(content)
            .map_err(|e| Error::config(format!("Invalid ethnicity mapping: {e}")))?;

        if file.mapping.is_empty() {
            return Err(Error::config("Ethnicity mapping has no entries"));
        }

        let mut table = FxHashMap::default();
        for (label, group) in file.mapping {
            let key = label.trim().to_string();
            if key.is_empty() {
                return Err(Error::config("Ethnicity mapping contains an empty label"));
            }
            if let Some(previous) = table.insert(key.clone(), group) {
                if previous != group {
                    return Err(Error::config(format!(
                        "Label '{key}' is mapped to both '{previous}' and '{group}'"
                    )));
                }
            }
        }

        Ok(Self {
            version: file.version,
            table,
        })
    }

    /// Read a mapping artifact from disk
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read ethnicity mapping '{}': {e}",
                path.display()
            ))
        })?;
        let mapping = Self::from_toml_str(&content)?;
        log::info!(
            "Loaded ethnicity mapping v{} with {} labels from {}",
            mapping.version,
            mapping.len(),
            path.display()
        );
        Ok(mapping)
    }

    /// Version declared by the artifact
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Number of fine-grained labels
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether the table is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Fine-grained labels known to the table
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.table.keys().map(String::as_str)
    }

    /// Group for a label. A null label maps to Unknown/Unwilling; a label
    /// missing from the table gives `None`
    #[must_use]
    pub fn classify(&self, label: Option<&str>) -> Option<EthnicGroup> {
        match label {
            None => Some(EthnicGroup::UnknownUnwilling),
            Some(label) => self.table.get(label.trim()).copied(),
        }
    }

    /// Group for the label at `row`, failing on labels the table lacks
    pub fn map_label(&self, label: Option<&str>, row: usize) -> Result<EthnicGroup> {
        self.classify(label).ok_or_else(|| Error::UnmappedCategory {
            column: ETHNICITY.to_string(),
            row,
            value: label.unwrap_or_default().to_string(),
        })
    }
}

/// Records per coarse group after aggregation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregationReport {
    /// Mapping artifact version used
    pub mapping_version: u32,
    /// Record count per group, in group order
    pub group_counts: BTreeMap<EthnicGroup, usize>,
}

/// Add the `agg_ethnicity` column, replacing an existing one
pub fn aggregate(
    batch: &RecordBatch,
    mapping: &EthnicityMapping,
) -> Result<(RecordBatch, AggregationReport)> {
    let start = Instant::now();
    log_operation_start(Stage::AggregateEthnicity, batch.num_rows());

    let labels = utf8_column(batch, ETHNICITY, Stage::AggregateEthnicity)?;
    let mut builder = StringBuilder::with_capacity(labels.len(), labels.len() * 16);
    let mut group_counts = BTreeMap::new();

    for (row, label) in labels.iter().enumerate() {
        let group = mapping.map_label(label, row)?;
        *group_counts.entry(group).or_insert(0) += 1;
        builder.append_value(group.label());
    }

    let aggregated = with_column(
        batch,
        Field::new(AGG_ETHNICITY, DataType::Utf8, false),
        Arc::new(builder.finish()) as ArrayRef,
    )?;

    for (group, count) in &group_counts {
        log::debug!("{group}: {count} records");
    }
    log_operation_complete(
        Stage::AggregateEthnicity,
        aggregated.num_rows(),
        Some(start.elapsed()),
    );

    Ok((
        aggregated,
        AggregationReport {
            mapping_version: mapping.version(),
            group_counts,
        },
    ))
}
