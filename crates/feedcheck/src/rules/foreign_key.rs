//! Referential integrity between two tables.

use std::collections::HashSet;

use crate::notice::{Notice, NoticeContainer, Severity};
use crate::schema::ForeignKeyRef;
use crate::table::{Feed, TableContainer};

use super::{Rule, RuleError, require};

const CODE_FOREIGN_KEY_VIOLATION: &str = "foreign_key_violation";

/// Every present child value must exist in the parent field.
#[derive(Debug, Clone)]
pub struct ForeignKeyRule {
    name: String,
    child_table: String,
    child_field: String,
    parent_table: String,
    parent_field: String,
}

impl ForeignKeyRule {
    pub fn new(
        child_table: impl Into<String>,
        child_field: impl Into<String>,
        parent_table: impl Into<String>,
        parent_field: impl Into<String>,
    ) -> Self {
        let (child_table, child_field) = (child_table.into(), child_field.into());
        let (parent_table, parent_field) = (parent_table.into(), parent_field.into());
        Self {
            name: format!("foreign_key:{child_table}.{child_field}->{parent_table}.{parent_field}"),
            child_table,
            child_field,
            parent_table,
            parent_field,
        }
    }

    pub fn from_ref(fk: &ForeignKeyRef<'_>) -> Self {
        Self::new(fk.child_table, fk.child_field, fk.parent_table, fk.parent_field)
    }
}

/// How parent values are looked up.
enum ParentKeys<'a> {
    PrimaryKey(&'a TableContainer),
    Group(&'a TableContainer),
    Scanned(HashSet<String>),
}

impl ParentKeys<'_> {
    fn contains(&self, value: &str) -> bool {
        match self {
            ParentKeys::PrimaryKey(table) => table.by_key(&[value]).is_some(),
            ParentKeys::Group(table) => table.has_group(value),
            ParentKeys::Scanned(values) => values.contains(value),
        }
    }
}

impl Rule for ForeignKeyRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn required_tables(&self) -> Vec<&str> {
        vec![self.child_table.as_str(), self.parent_table.as_str()]
    }

    fn validate(&self, feed: &Feed, notices: &mut NoticeContainer) -> Result<(), RuleError> {
        let child = require(feed, &self.child_table)?;
        let parent = require(feed, &self.parent_table)?;
        let child_column = child.column(&self.child_field)?;

        let parent_keys = if parent.is_single_key(&self.parent_field) {
            ParentKeys::PrimaryKey(parent)
        } else if parent.is_grouped_by(&self.parent_field) {
            ParentKeys::Group(parent)
        } else {
            let column = parent.column(&self.parent_field)?;
            ParentKeys::Scanned(
                parent
                    .all()
                    .iter()
                    .filter(|row| row.has(column))
                    .map(|row| row.get(column).to_string())
                    .collect(),
            )
        };

        for row in child.all() {
            let value = row.get(child_column);
            if !value.is_present() {
                continue;
            }
            let key = value.to_string();
            if !parent_keys.contains(&key) {
                notices.push(
                    Notice::new(CODE_FOREIGN_KEY_VIOLATION, Severity::Error)
                        .with_field("childFilename", child.filename())
                        .with_field("childFieldName", self.child_field.as_str())
                        .with_field("parentFilename", parent.filename())
                        .with_field("parentFieldName", self.parent_field.as_str())
                        .with_field("fieldValue", key)
                        .with_field("csvRowNumber", row.csv_row_number()),
                );
            }
        }
        Ok(())
    }
}
