//! Table-level schema definition.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::field::FieldSchema;

/// A foreign key declared on a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyRef<'a> {
    pub child_table: &'a str,
    pub child_field: &'a str,
    pub parent_table: &'a str,
    pub parent_field: &'a str,
}

/// Schema for one table (one file of the feed).
///
/// Immutable once built and shared by every row of the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Logical table name, e.g. `stop_times`.
    pub name: String,
    /// File name inside the feed, e.g. `stop_times.txt`.
    pub filename: String,
    /// Whether the file must be present in every feed.
    #[serde(default)]
    pub required: bool,
    /// Field descriptors in declaration order.
    pub fields: IndexMap<String, FieldSchema>,
}

impl TableSchema {
    /// Create an empty table schema named `name`, stored in `name.txt`.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            filename: format!("{name}.txt"),
            name,
            required: false,
            fields: IndexMap::new(),
        }
    }

    /// Mark the file as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Append a field.
    pub fn field(mut self, field: FieldSchema) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    /// Get a field by name.
    pub fn get_field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.get(name)
    }

    /// Position of a field in declaration order.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.get_index_of(name)
    }

    /// Get a field by position.
    pub fn field_at(&self, index: usize) -> Option<&FieldSchema> {
        self.fields.get_index(index).map(|(_, f)| f)
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Positions of the primary key parts, in declaration order.
    pub fn primary_key_indices(&self) -> Vec<usize> {
        self.fields
            .values()
            .enumerate()
            .filter(|(_, f)| f.is_primary_key_part())
            .map(|(i, _)| i)
            .collect()
    }

    /// Position of the grouping key, if declared.
    pub fn grouping_index(&self) -> Option<usize> {
        self.fields.values().position(|f| f.is_grouping_key())
    }

    /// Position of the sequence key, if declared.
    pub fn sequence_index(&self) -> Option<usize> {
        self.fields.values().position(|f| f.is_sequence_key())
    }

    /// All foreign keys declared on this table.
    pub fn foreign_keys(&self) -> impl Iterator<Item = ForeignKeyRef<'_>> {
        self.fields.values().filter_map(move |f| {
            f.foreign_key().map(|(parent_table, parent_field)| ForeignKeyRef {
                child_table: &self.name,
                child_field: &f.name,
                parent_table,
                parent_field,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldType;

    fn stop_times() -> TableSchema {
        TableSchema::new("stop_times")
            .required()
            .field(
                FieldSchema::new("trip_id", FieldType::Id)
                    .required()
                    .primary_key()
                    .grouping()
                    .references("trips", "trip_id"),
            )
            .field(FieldSchema::new("arrival_time", FieldType::Time))
            .field(
                FieldSchema::new("stop_sequence", FieldType::Integer)
                    .required()
                    .primary_key()
                    .sequence(),
            )
    }

    #[test]
    fn test_key_lookups() {
        let schema = stop_times();
        assert_eq!(schema.filename, "stop_times.txt");
        assert_eq!(schema.primary_key_indices(), vec![0, 2]);
        assert_eq!(schema.grouping_index(), Some(0));
        assert_eq!(schema.sequence_index(), Some(2));
        assert_eq!(schema.index_of("arrival_time"), Some(1));
    }

    #[test]
    fn test_foreign_keys() {
        let schema = stop_times();
        let fks: Vec<_> = schema.foreign_keys().collect();
        assert_eq!(fks.len(), 1);
        assert_eq!(fks[0].child_field, "trip_id");
        assert_eq!(fks[0].parent_table, "trips");
    }
}
