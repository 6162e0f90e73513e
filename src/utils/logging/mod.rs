//! Logging utilities for output and stage tracking

pub mod console;
pub mod log;

pub use log::{log_operation_complete, log_operation_start, log_warning};
