//! Writers for tables and reports

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use arrow::csv::WriterBuilder;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde::Serialize;

use crate::error::util::ensure_output_directory;
use crate::error::{Result, Stage};
use crate::utils::arrow::flatten_dictionaries;
use crate::utils::logging::log_operation_complete;

fn create_file(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_output_directory(parent)?;
    }
    Ok(BufWriter::new(File::create(path)?))
}

/// Write a table as CSV with a header row
///
/// Dictionary columns are written as their values.
pub fn write_csv(batch: &RecordBatch, path: &Path) -> Result<()> {
    let flat = flatten_dictionaries(batch)?;
    let mut writer = WriterBuilder::new().with_header(true).build(create_file(path)?);
    writer.write(&flat)?;
    writer.into_inner().flush()?;

    log::debug!("Wrote CSV {}", path.display());
    log_operation_complete(Stage::Export, batch.num_rows(), None);
    Ok(())
}

/// Write a table as a single-row-group Parquet file
pub fn write_parquet(batch: &RecordBatch, path: &Path) -> Result<()> {
    let mut writer = ArrowWriter::try_new(create_file(path)?, batch.schema(), None)?;
    writer.write(batch)?;
    writer.into_inner()?.flush()?;

    log::debug!("Wrote Parquet {}", path.display());
    log_operation_complete(Stage::Export, batch.num_rows(), None);
    Ok(())
}

/// Write any serializable value as pretty-printed JSON
pub fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    let mut file = create_file(path)?;
    serde_json::to_writer_pretty(&mut file, value)?;
    file.flush()?;
    log::debug!("Wrote JSON {}", path.display());
    Ok(())
}
