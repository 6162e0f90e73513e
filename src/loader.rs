//! Spreadsheet loading
//!
//! Reads one sheet of a workbook into a typed Arrow record batch. The first
//! non-empty row is the header; headers are normalised with
//! [`normalize_column_name`]. Core columns are typed (see
//! [`loaded_data_type`]); every other column is kept as nullable text.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use arrow::array::{ArrayRef, Int64Builder, StringBuilder, StringDictionaryBuilder, UInt8Builder};
use arrow::datatypes::{Int32Type, Schema};
use arrow::record_batch::RecordBatch;
use calamine::{Data, Range, Reader, open_workbook_auto};

use crate::config::LoaderConfig;
use crate::error::util::validate_input_file;
use crate::error::{Error, Result, Stage};
use crate::models::ImdDecile;
use crate::schema::dates::excel_serial_to_date;
use crate::schema::{
    CORE_COLUMNS, DATE_COLUMNS, ETHNICITY, IMD, PATIENT_AGE, check_columns, loaded_data_type,
    loaded_field, normalize_column_name,
};
use crate::utils::logging::{log_operation_complete, log_operation_start};

static EMPTY_CELL: Data = Data::Empty;

/// List the sheet names of a workbook
pub fn list_sheets(path: &Path) -> Result<Vec<String>> {
    validate_input_file(path, "listing sheets")?;
    let workbook = open_workbook_auto(path)
        .map_err(|e| Error::load(path, format!("Failed to open workbook: {e}")))?;
    Ok(workbook.sheet_names())
}

/// Load the configured sheet of a workbook (xlsx, xlsm, xls or ods)
pub fn load_sheet(path: &Path, config: &LoaderConfig) -> Result<RecordBatch> {
    validate_input_file(path, "loading RTT records")?;
    let start = Instant::now();
    log::info!(
        "Loading sheet '{}' from {}",
        config.sheet_name,
        path.display()
    );

    let mut workbook = open_workbook_auto(path)
        .map_err(|e| Error::load(path, format!("Failed to open workbook: {e}")))?;

    let sheet_names = workbook.sheet_names();
    if !sheet_names.iter().any(|name| name == &config.sheet_name) {
        return Err(Error::load(
            path,
            format!(
                "Sheet '{}' not found (available: {})",
                config.sheet_name,
                sheet_names.join(", ")
            ),
        ));
    }

    let range = workbook.worksheet_range(&config.sheet_name).map_err(|e| {
        Error::load(
            path,
            format!("Failed to read sheet '{}': {e}", config.sheet_name),
        )
    })?;

    let batch = load_from_range(&range, config).map_err(|e| match e {
        Error::Load { message, .. } => Error::load(path, message),
        other => other,
    })?;

    log_operation_complete(Stage::Load, batch.num_rows(), Some(start.elapsed()));
    Ok(batch)
}

/// Build the loaded table from an in-memory sheet range
pub fn load_from_range(range: &Range<Data>, config: &LoaderConfig) -> Result<RecordBatch> {
    let mut rows = range
        .rows()
        .skip_while(|row| row.iter().all(|cell| matches!(cell, Data::Empty)));

    let Some(header) = rows.next() else {
        return Err(Error::load("<sheet>", format!("Sheet '{}' is empty", config.sheet_name)));
    };

    let columns: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            let name = normalize_column_name(&cell_text(cell).unwrap_or_default());
            if name.is_empty() {
                format!("column_{}", idx + 1)
            } else {
                name
            }
        })
        .collect();

    check_columns(&columns, &CORE_COLUMNS).into_result(Stage::Load)?;

    let records: Vec<&[Data]> = rows
        .filter(|row| !row.iter().all(|cell| matches!(cell, Data::Empty)))
        .collect();
    log_operation_start(Stage::Load, records.len());

    let mut fields = Vec::with_capacity(columns.len());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(columns.len());

    for (col_idx, name) in columns.iter().enumerate() {
        let cells = records
            .iter()
            .map(|row| row.get(col_idx).unwrap_or(&EMPTY_CELL));
        let array = build_column(name, cells, config)?;
        debug_assert_eq!(array.data_type(), &loaded_data_type(name));
        fields.push(loaded_field(name));
        arrays.push(array);
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}

/// Build one typed column from its cells
fn build_column<'a>(
    name: &str,
    cells: impl Iterator<Item = &'a Data>,
    config: &LoaderConfig,
) -> Result<ArrayRef> {
    let array: ArrayRef = match name {
        PATIENT_AGE => {
            let mut builder = Int64Builder::new();
            for (row, cell) in cells.enumerate() {
                match present_text(cell, config) {
                    None => builder.append_null(),
                    Some(text) => {
                        let age = parse_integer(&text)
                            .filter(|age| *age >= 0)
                            .ok_or_else(|| invalid_value(name, row, &text, "a non-negative integer"))?;
                        builder.append_value(age);
                    }
                }
            }
            Arc::new(builder.finish())
        }
        IMD => {
            let mut builder = UInt8Builder::new();
            for (row, cell) in cells.enumerate() {
                match present_text(cell, config) {
                    None => builder.append_null(),
                    Some(text) => {
                        let decile = parse_integer(&text)
                            .and_then(ImdDecile::from_i64)
                            .ok_or_else(|| invalid_value(name, row, &text, "a decile between 1 and 10"))?;
                        builder.append_value(decile.rank());
                    }
                }
            }
            Arc::new(builder.finish())
        }
        ETHNICITY => {
            let mut builder = StringDictionaryBuilder::<Int32Type>::new();
            for cell in cells {
                match present_text(cell, config) {
                    None => builder.append_null(),
                    Some(text) => {
                        builder.append(&text)?;
                    }
                }
            }
            Arc::new(builder.finish())
        }
        _ if DATE_COLUMNS.contains(&name) => {
            let mut builder = StringBuilder::new();
            for cell in cells {
                builder.append_option(date_text(cell, config));
            }
            Arc::new(builder.finish())
        }
        _ => {
            let mut builder = StringBuilder::new();
            for cell in cells {
                builder.append_option(present_text(cell, config));
            }
            Arc::new(builder.finish())
        }
    };

    Ok(array)
}

fn invalid_value(column: &str, row: usize, value: &str, expected: &str) -> Error {
    Error::schema(
        Stage::Load,
        format!("Column '{column}' expects {expected}, found '{value}' at row {row}"),
    )
}

/// Render a cell as trimmed text; empty and error cells have no text
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.trim().to_string()),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) => Some(format_float(*f)),
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(dt) => Some(
            dt.as_datetime()
                .map_or_else(|| format_float(dt.as_f64()), |d| d.date().format("%Y-%m-%d").to_string()),
        ),
        _ => None,
    }
}

/// Cell text with missing-value tokens mapped to `None`
fn present_text(cell: &Data, config: &LoaderConfig) -> Option<String> {
    cell_text(cell).filter(|text| !config.is_missing(text))
}

/// Text for a date cell; numeric cells are spreadsheet serial dates
fn date_text(cell: &Data, config: &LoaderConfig) -> Option<String> {
    let serial = match cell {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        _ => None,
    };

    match serial.and_then(excel_serial_to_date) {
        Some(date) => Some(date.format("%Y-%m-%d").to_string()),
        None => present_text(cell, config),
    }
}

fn format_float(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

/// Parse an integer, accepting integral floats such as `"3.0"`
fn parse_integer(text: &str) -> Option<i64> {
    if let Ok(value) = text.parse::<i64>() {
        return Some(value);
    }
    text.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15)
        .map(|f| f as i64)
}
