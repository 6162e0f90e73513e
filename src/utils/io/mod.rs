//! IO utilities for exporting pipeline outputs
//!
//! Tables are written as CSV or Parquet, reports as pretty-printed JSON.

pub mod writers;

pub use writers::{write_csv, write_json, write_parquet};
