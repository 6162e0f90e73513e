//! Arrow data handling utilities
//!
//! Helpers for looking up typed columns and rebuilding record batches with
//! added or replaced columns.

pub mod array_utils;

pub use array_utils::{
    column_as, column_by_name, flatten_dictionaries, utf8_column, with_column,
};
