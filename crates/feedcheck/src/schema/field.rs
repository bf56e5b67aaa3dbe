//! Field descriptor definition.

use serde::{Deserialize, Serialize};

use super::types::{FieldType, KeyRole, NumericRange};

/// Schema for a single field (CSV column) of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    /// Column name as it appears in the header.
    pub name: String,
    /// Declared value type.
    pub field_type: FieldType,
    /// Whether the column and every value in it must be present.
    #[serde(default)]
    pub required: bool,
    /// Key roles; empty for plain data columns.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<KeyRole>,
    /// Allowed numeric range.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<NumericRange>,
}

impl FieldSchema {
    /// Create an optional field with no key roles.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: false,
            roles: Vec::new(),
            range: None,
        }
    }

    /// Mark the field as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Make the field part of the primary key.
    pub fn primary_key(mut self) -> Self {
        self.roles.push(KeyRole::PrimaryKeyPart);
        self
    }

    /// Make the field a foreign key into `table.field`.
    pub fn references(mut self, table: impl Into<String>, field: impl Into<String>) -> Self {
        self.roles.push(KeyRole::ForeignKey {
            table: table.into(),
            field: field.into(),
        });
        self
    }

    /// Make the field the table's grouping key.
    pub fn grouping(mut self) -> Self {
        self.roles.push(KeyRole::GroupingKey);
        self
    }

    /// Make the field the table's intra-group sequence key.
    pub fn sequence(mut self) -> Self {
        self.roles.push(KeyRole::SequenceKey);
        self
    }

    /// Restrict numeric values to a range.
    pub fn with_range(mut self, range: NumericRange) -> Self {
        self.range = Some(range);
        self
    }

    pub fn is_primary_key_part(&self) -> bool {
        self.roles.contains(&KeyRole::PrimaryKeyPart)
    }

    pub fn is_grouping_key(&self) -> bool {
        self.roles.contains(&KeyRole::GroupingKey)
    }

    pub fn is_sequence_key(&self) -> bool {
        self.roles.contains(&KeyRole::SequenceKey)
    }

    /// The `(table, field)` this field references, if it is a foreign key.
    pub fn foreign_key(&self) -> Option<(&str, &str)> {
        self.roles.iter().find_map(|role| match role {
            KeyRole::ForeignKey { table, field } => Some((table.as_str(), field.as_str())),
            _ => None,
        })
    }
}
