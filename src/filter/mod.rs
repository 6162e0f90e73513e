//! Row filtering for record batches
//!
//! A small expression language covering the row predicates the cleaner
//! needs (non-null checks and integer bounds), evaluated with Arrow's
//! vectorized kernels.

use std::collections::HashSet;

use arrow::array::{Array, ArrayRef, BooleanArray, Int64Array};
use arrow::compute::kernels::cmp::{gt_eq, lt};
use arrow::compute::{and, filter as arrow_filter, is_not_null};
use arrow::record_batch::RecordBatch;

use crate::error::{Error, Result, Stage};
use crate::utils::arrow::{column_as, column_by_name};

/// Represents a filter expression over the columns of a batch
#[derive(Debug, Clone)]
pub enum Expr {
    /// Column is not null
    IsNotNull(String),

    /// Integer column is greater than or equal to a value
    GtEq(String, i64),

    /// Integer column is less than a value
    Lt(String, i64),

    /// Logical AND of expressions; an empty list matches every row
    And(Vec<Expr>),
}

impl Expr {
    /// All of `columns` must be non-null
    #[must_use]
    pub fn all_not_null(columns: &[&str]) -> Self {
        Self::And(
            columns
                .iter()
                .map(|column| Self::IsNotNull((*column).to_string()))
                .collect(),
        )
    }

    /// Integer column within `[min, max)`
    #[must_use]
    pub fn in_range(column: &str, min: i64, max: i64) -> Self {
        Self::And(vec![
            Self::GtEq(column.to_string(), min),
            Self::Lt(column.to_string(), max),
        ])
    }

    /// Returns a set of all column names required by this expression
    #[must_use]
    pub fn required_columns(&self) -> HashSet<String> {
        let mut columns = HashSet::new();
        self.collect_required_columns(&mut columns);
        columns
    }

    fn collect_required_columns(&self, columns: &mut HashSet<String>) {
        match self {
            Self::IsNotNull(col) | Self::GtEq(col, _) | Self::Lt(col, _) => {
                columns.insert(col.clone());
            }
            Self::And(exprs) => {
                for expr in exprs {
                    expr.collect_required_columns(columns);
                }
            }
        }
    }
}

/// Evaluates a filter expression against a record batch
///
/// Null comparison results are treated as "does not match" by
/// [`filter_record_batch`].
///
/// # Arguments
/// * `batch` - The record batch to evaluate against
/// * `expr` - The filter expression to apply
/// * `stage` - Stage evaluating the filter, for error context
pub fn evaluate_expr(batch: &RecordBatch, expr: &Expr, stage: Stage) -> Result<BooleanArray> {
    match expr {
        Expr::IsNotNull(col_name) => {
            let column = column_by_name(batch, col_name, stage)?;
            Ok(is_not_null(column.as_ref())?)
        }

        Expr::GtEq(col_name, value) => {
            let column = column_as::<Int64Array>(batch, col_name, stage)?;
            Ok(gt_eq(column, &Int64Array::new_scalar(*value))?)
        }

        Expr::Lt(col_name, value) => {
            let column = column_as::<Int64Array>(batch, col_name, stage)?;
            Ok(lt(column, &Int64Array::new_scalar(*value))?)
        }

        Expr::And(exprs) => evaluate_and_expression(batch, exprs, stage),
    }
}

/// Evaluates a logical AND expression
fn evaluate_and_expression(batch: &RecordBatch, exprs: &[Expr], stage: Stage) -> Result<BooleanArray> {
    let Some((first, rest)) = exprs.split_first() else {
        return Ok(BooleanArray::from(vec![true; batch.num_rows()]));
    };

    let mut result = evaluate_expr(batch, first, stage)?;
    for expr in rest {
        let mask = evaluate_expr(batch, expr, stage)?;
        result = and(&result, &mask)?;
    }

    Ok(result)
}

/// Filters a record batch based on a boolean mask
///
/// # Arguments
/// * `batch` - The record batch to filter
/// * `mask` - The boolean mask indicating which rows to keep
///
/// # Returns
/// A new record batch with only rows where mask is true
pub fn filter_record_batch(batch: &RecordBatch, mask: &BooleanArray) -> Result<RecordBatch> {
    if batch.num_rows() != mask.len() {
        return Err(Error::Arrow(arrow::error::ArrowError::InvalidArgumentError(
            format!(
                "Mask length ({}) doesn't match batch row count ({})",
                mask.len(),
                batch.num_rows()
            ),
        )));
    }

    let filtered_columns: Vec<ArrayRef> = batch
        .columns()
        .iter()
        .map(|col| arrow_filter(col, mask))
        .collect::<arrow::error::Result<_>>()?;

    Ok(RecordBatch::try_new(batch.schema(), filtered_columns)?)
}

/// Evaluate `expr` and keep matching rows, returning the filtered batch and
/// the number of rows removed
pub fn apply_filter(batch: &RecordBatch, expr: &Expr, stage: Stage) -> Result<(RecordBatch, usize)> {
    let mask = evaluate_expr(batch, expr, stage)?;
    let filtered = filter_record_batch(batch, &mask)?;
    let removed = batch.num_rows() - filtered.num_rows();

    log::debug!(
        "[{stage}] filter on {:?} kept {} of {} rows",
        expr.required_columns(),
        filtered.num_rows(),
        batch.num_rows()
    );

    Ok((filtered, removed))
}
