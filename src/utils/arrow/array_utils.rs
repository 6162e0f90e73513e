//! Utilities for working with Arrow arrays.
//!
//! Column lookups report missing or mistyped columns as schema errors
//! attributed to the stage that needed them.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, StringArray};
use arrow::compute::kernels::cast::cast;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;

use crate::error::{Error, Result, Stage};

/// Get a column from a record batch by name
///
/// # Arguments
///
/// * `batch` - The record batch containing the column
/// * `column_name` - The name of the column to extract
/// * `stage` - Stage requesting the column, for error context
pub fn column_by_name<'a>(
    batch: &'a RecordBatch,
    column_name: &str,
    stage: Stage,
) -> Result<&'a ArrayRef> {
    batch
        .column_by_name(column_name)
        .ok_or_else(|| Error::schema(stage, format!("Column '{column_name}' not found in table")))
}

/// Get a column downcast to a concrete array type
pub fn column_as<'a, T: Array + 'static>(
    batch: &'a RecordBatch,
    column_name: &str,
    stage: Stage,
) -> Result<&'a T> {
    let column = column_by_name(batch, column_name, stage)?;
    column.as_any().downcast_ref::<T>().ok_or_else(|| {
        Error::schema(
            stage,
            format!(
                "Column '{column_name}' has type {}, expected {}",
                column.data_type(),
                std::any::type_name::<T>()
                    .rsplit("::")
                    .next()
                    .unwrap_or("array")
            ),
        )
    })
}

/// Get a column as UTF-8 strings, casting dictionaries and other types
pub fn utf8_column(batch: &RecordBatch, column_name: &str, stage: Stage) -> Result<StringArray> {
    let column = column_by_name(batch, column_name, stage)?;
    let converted = if column.data_type() == &DataType::Utf8 {
        Arc::clone(column)
    } else {
        cast(column, &DataType::Utf8)?
    };

    converted
        .as_any()
        .downcast_ref::<StringArray>()
        .cloned()
        .ok_or_else(|| {
            Error::schema(stage, format!("Column '{column_name}' cannot be read as text"))
        })
}

/// Return a new batch with `array` under `field`'s name, replacing an
/// existing column of that name or appending a new one
pub fn with_column(batch: &RecordBatch, field: Field, array: ArrayRef) -> Result<RecordBatch> {
    let schema = batch.schema();
    let mut fields: Vec<Field> = schema.fields().iter().map(|f| f.as_ref().clone()).collect();
    let mut columns: Vec<ArrayRef> = batch.columns().to_vec();

    match schema.index_of(field.name()) {
        Ok(idx) => {
            fields[idx] = field;
            columns[idx] = array;
        }
        Err(_) => {
            fields.push(field);
            columns.push(array);
        }
    }

    let schema = Schema::new_with_metadata(fields, schema.metadata().clone());
    Ok(RecordBatch::try_new(Arc::new(schema), columns)?)
}

/// Cast dictionary-encoded columns to their value type
///
/// Used before writing formats that expect plain columns.
pub fn flatten_dictionaries(batch: &RecordBatch) -> Result<RecordBatch> {
    let schema = batch.schema();
    let mut fields = Vec::with_capacity(schema.fields().len());
    let mut columns = Vec::with_capacity(batch.num_columns());

    for (field, column) in schema.fields().iter().zip(batch.columns()) {
        if let DataType::Dictionary(_, value_type) = field.data_type() {
            let value_type = value_type.as_ref().clone();
            columns.push(cast(column, &value_type)?);
            fields.push(Field::new(field.name(), value_type, field.is_nullable()));
        } else {
            columns.push(Arc::clone(column));
            fields.push(field.as_ref().clone());
        }
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}
