//! Typed rows and column handles.

use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;

use crate::schema::TableSchema;
use crate::value::{FieldValue, ServiceTime};

/// A field name that a table's schema does not declare.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("table '{table}' has no field '{field}'")]
pub struct UnknownField {
    pub table: String,
    pub field: String,
}

/// Resolved position of a field within a table's rows.
///
/// Resolve once per table with [`TableContainer::column`] and reuse it for
/// every row.
///
/// [`TableContainer::column`]: super::TableContainer::column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Column(pub(crate) usize);

/// One immutable record of a table.
#[derive(Debug, Clone)]
pub struct Row {
    schema: Arc<TableSchema>,
    csv_row_number: u64,
    values: Vec<FieldValue>,
}

impl Row {
    /// Build a row; `values` follow the schema's field order.
    pub fn new(schema: Arc<TableSchema>, csv_row_number: u64, values: Vec<FieldValue>) -> Self {
        debug_assert_eq!(schema.field_count(), values.len());
        Self {
            schema,
            csv_row_number,
            values,
        }
    }

    pub fn csv_row_number(&self) -> u64 {
        self.csv_row_number
    }

    pub fn filename(&self) -> &str {
        &self.schema.filename
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn get(&self, column: Column) -> &FieldValue {
        &self.values[column.0]
    }

    /// Value of a field by name; `None` if the schema has no such field.
    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.schema.index_of(name).map(|i| &self.values[i])
    }

    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }

    /// Whether the cell holds a valid value.
    pub fn has(&self, column: Column) -> bool {
        self.get(column).is_present()
    }

    pub fn text(&self, column: Column) -> Option<&str> {
        self.get(column).as_str()
    }

    pub fn integer(&self, column: Column) -> Option<i64> {
        self.get(column).as_i64()
    }

    pub fn float(&self, column: Column) -> Option<f64> {
        self.get(column).as_f64()
    }

    pub fn time(&self, column: Column) -> Option<ServiceTime> {
        self.get(column).as_time()
    }

    pub fn date(&self, column: Column) -> Option<NaiveDate> {
        self.get(column).as_date()
    }
}
