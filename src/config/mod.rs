//! Configuration for the RTT pipeline.
//!
//! All settings have defaults matching the RTT extract this crate was built
//! for, and can be overridden from a TOML file:
//!
//! ```toml
//! mapping_path = "config/ethnicity_mapping.toml"
//!
//! [loader]
//! sheet_name = "RTT"
//! missing_tokens = ["", "NULL", "NA"]
//!
//! [thresholds]
//! min_waiting_days = 0
//! max_waiting_days = 3000
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::dates::DateFormatConfig;

/// Configuration for a pipeline run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// How the sheet is read
    pub loader: LoaderConfig,
    /// Valid waiting-time window
    pub thresholds: CleaningThresholds,
    /// Accepted date formats for text date cells
    pub dates: DateFormatConfig,
    /// External ethnicity mapping artifact; the embedded table is used when unset
    pub mapping_path: Option<PathBuf>,
}

impl PipelineConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::config(format!("Invalid pipeline configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Check the settings for internal consistency
    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;
        if self.loader.sheet_name.trim().is_empty() {
            return Err(Error::config("Sheet name must not be empty"));
        }
        if self.dates.date_formats.is_empty() && !self.dates.enable_format_detection {
            return Err(Error::config(
                "No date formats configured and format detection is disabled",
            ));
        }
        Ok(())
    }
}

/// Settings for reading the source sheet
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Name of the sheet holding the RTT records
    pub sheet_name: String,
    /// Cell texts treated as missing values (compared after trimming)
    pub missing_tokens: Vec<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            sheet_name: "RTT".to_string(),
            missing_tokens: vec![String::new(), "NULL".to_string(), "NA".to_string()],
        }
    }
}

impl LoaderConfig {
    /// Whether the cell text is one of the configured missing-value tokens
    #[must_use]
    pub fn is_missing(&self, text: &str) -> bool {
        let text = text.trim();
        self.missing_tokens.iter().any(|token| token.trim() == text)
    }
}

/// Valid range for derived waiting days: `[min_waiting_days, max_waiting_days)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningThresholds {
    /// Lower bound, inclusive
    pub min_waiting_days: i64,
    /// Upper bound, exclusive
    pub max_waiting_days: i64,
}

impl Default for CleaningThresholds {
    fn default() -> Self {
        Self {
            min_waiting_days: 0,
            max_waiting_days: 3000,
        }
    }
}

impl CleaningThresholds {
    /// Create thresholds, rejecting an empty window
    pub fn new(min_waiting_days: i64, max_waiting_days: i64) -> Result<Self> {
        let thresholds = Self {
            min_waiting_days,
            max_waiting_days,
        };
        thresholds.validate()?;
        Ok(thresholds)
    }

    /// The window must contain at least one day
    pub fn validate(&self) -> Result<()> {
        if self.min_waiting_days >= self.max_waiting_days {
            return Err(Error::config(format!(
                "min_waiting_days ({}) must be below max_waiting_days ({})",
                self.min_waiting_days, self.max_waiting_days
            )));
        }
        Ok(())
    }

    /// Whether a waiting time falls inside the window
    #[must_use]
    pub const fn contains(&self, waiting_days: i64) -> bool {
        waiting_days >= self.min_waiting_days && waiting_days < self.max_waiting_days
    }
}
