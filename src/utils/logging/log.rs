//! Logging utilities
//!
//! This module provides standardized logging functions for pipeline stages.

use std::time::Duration;

use crate::error::Stage;

/// Log a stage start with consistent format
///
/// # Arguments
/// * `stage` - The stage being started
/// * `rows` - Number of rows handed to the stage
pub fn log_operation_start(stage: Stage, rows: usize) {
    log::info!("Starting {stage} on {rows} rows");
}

/// Log a stage completion with consistent format
///
/// # Arguments
/// * `stage` - The stage that finished
/// * `rows` - Number of rows the stage produced
/// * `elapsed` - Optional elapsed time
pub fn log_operation_complete(stage: Stage, rows: usize, elapsed: Option<Duration>) {
    if let Some(duration) = elapsed {
        log::info!("Finished {stage}: {rows} rows in {duration:?}");
    } else {
        log::info!("Finished {stage}: {rows} rows");
    }
}

/// Log a data-quality warning attributed to a stage
pub fn log_warning(stage: Stage, message: &str) {
    log::warn!("[{stage}] {message}");
}
