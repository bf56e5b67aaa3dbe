//! Indexed, read-only table container.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::json;
use tracing::debug;

use crate::notice::{Notice, NoticeContainer, Severity};
use crate::schema::TableSchema;

use super::row::{Column, Row, UnknownField};

/// Rows of one group, sorted by the table's sequence key.
#[derive(Debug, Clone, Copy)]
pub struct Group<'a> {
    rows: &'a [Row],
    indices: &'a [usize],
}

impl<'a> Group<'a> {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&'a Row> {
        self.indices.get(i).map(|&idx| &self.rows[idx])
    }

    pub fn first(&self) -> Option<&'a Row> {
        self.get(0)
    }

    pub fn last(&self) -> Option<&'a Row> {
        self.len().checked_sub(1).and_then(|i| self.get(i))
    }

    pub fn iter(self) -> impl Iterator<Item = &'a Row> {
        let rows = self.rows;
        self.indices.iter().map(move |&idx| &rows[idx])
    }

    /// Consecutive `(previous, current)` pairs in sequence order.
    pub fn pairs(self) -> impl Iterator<Item = (&'a Row, &'a Row)> {
        let rows = self.rows;
        self.indices
            .windows(2)
            .map(move |w| (&rows[w[0]], &rows[w[1]]))
    }
}

/// All rows of one table plus the indexes built over them.
///
/// Built once by [`TableContainer::build`] and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct TableContainer {
    schema: Arc<TableSchema>,
    headers: Vec<String>,
    rows: Vec<Row>,
    primary_index: HashMap<Vec<String>, usize>,
    groups: IndexMap<String, Vec<usize>>,
}

impl TableContainer {
    /// Build the container and its indexes in one pass.
    ///
    /// A primary key that repeats produces a `duplicate_key` notice; the
    /// later row replaces the earlier one in the key index. Every row stays
    /// in [`all`](Self::all).
    pub fn build(
        schema: Arc<TableSchema>,
        headers: Vec<String>,
        rows: Vec<Row>,
        notices: &mut NoticeContainer,
    ) -> Self {
        let pk_indices = schema.primary_key_indices();
        let grouping = schema.grouping_index();
        let sequence = schema.sequence_index();

        let mut primary_index: HashMap<Vec<String>, usize> = HashMap::new();
        let mut groups: IndexMap<String, Vec<usize>> = IndexMap::new();

        for (row_idx, row) in rows.iter().enumerate() {
            if !pk_indices.is_empty() {
                if let Some(key) = primary_key_of(&schema, row, &pk_indices) {
                    if let Some(old_idx) = primary_index.insert(key.clone(), row_idx) {
                        notices.push(duplicate_key_notice(
                            &schema,
                            &pk_indices,
                            &key,
                            rows[old_idx].csv_row_number(),
                            row.csv_row_number(),
                        ));
                    }
                }
            }

            if let Some(g) = grouping {
                let value = &row.values()[g];
                if value.is_present() {
                    groups.entry(value.to_string()).or_default().push(row_idx);
                }
            }
        }

        if let Some(s) = sequence {
            for indices in groups.values_mut() {
                // Stable: equal sequence values keep file order.
                indices.sort_by(|&a, &b| rows[a].values()[s].cmp_sequence(&rows[b].values()[s]));
            }
        }

        debug!(
            table = %schema.name,
            rows = rows.len(),
            keys = primary_index.len(),
            groups = groups.len(),
            "Built table container"
        );

        Self {
            schema,
            headers,
            rows,
            primary_index,
            groups,
        }
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn name(&self) -> &str {
        &self.schema.name
    }

    pub fn filename(&self) -> &str {
        &self.schema.filename
    }

    /// Header as it appeared in the file.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Resolve a field of this table's schema.
    pub fn column(&self, name: &str) -> Result<Column, UnknownField> {
        self.schema.index_of(name).map(Column).ok_or_else(|| UnknownField {
            table: self.schema.name.clone(),
            field: name.to_string(),
        })
    }

    /// Every row, in file order.
    pub fn all(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Look a row up by its full primary key, parts in declaration order.
    pub fn by_key(&self, key: &[&str]) -> Option<&Row> {
        let key: Vec<String> = key.iter().map(|k| k.to_string()).collect();
        self.primary_index.get(&key).map(|&i| &self.rows[i])
    }

    /// Rows of one group, sorted by sequence key; empty for unknown keys.
    pub fn by_group(&self, key: &str) -> Group<'_> {
        let indices = self.groups.get(key).map(|v| v.as_slice()).unwrap_or(&[]);
        Group {
            rows: &self.rows,
            indices,
        }
    }

    pub fn has_group(&self, key: &str) -> bool {
        self.groups.contains_key(key)
    }

    /// Every group once, in order of first appearance in the file.
    pub fn all_groups(&self) -> impl Iterator<Item = (&str, Group<'_>)> + '_ {
        self.groups.iter().map(move |(key, indices)| {
            (
                key.as_str(),
                Group {
                    rows: &self.rows,
                    indices,
                },
            )
        })
    }

    /// Whether the primary key is exactly `field`.
    pub fn is_single_key(&self, field: &str) -> bool {
        let pk = self.schema.primary_key_indices();
        pk.len() == 1 && self.schema.index_of(field) == Some(pk[0])
    }

    /// Whether `field` is the grouping key.
    pub fn is_grouped_by(&self, field: &str) -> bool {
        self.schema.grouping_index().is_some() && self.schema.grouping_index() == self.schema.index_of(field)
    }
}

/// Key tuple for a row; `None` if it cannot be indexed.
fn primary_key_of(schema: &TableSchema, row: &Row, pk_indices: &[usize]) -> Option<Vec<String>> {
    pk_indices
        .iter()
        .map(|&i| {
            let value = &row.values()[i];
            let required = schema.field_at(i).map(|f| f.required).unwrap_or(false);
            if required && !value.is_present() {
                None
            } else {
                value.key_string()
            }
        })
        .collect()
}

fn duplicate_key_notice(
    schema: &TableSchema,
    pk_indices: &[usize],
    key: &[String],
    old_row: u64,
    new_row: u64,
) -> Notice {
    let mut notice = Notice::new("duplicate_key", Severity::Error)
        .with_field("filename", schema.filename.as_str())
        .with_field("oldCsvRowNumber", old_row)
        .with_field("newCsvRowNumber", new_row);
    for (n, (&idx, value)) in pk_indices.iter().zip(key).enumerate() {
        let name = schema.field_at(idx).map(|f| f.name.as_str()).unwrap_or_default();
        notice = notice
            .with_field(format!("fieldName{}", n + 1), json!(name))
            .with_field(format!("fieldValue{}", n + 1), json!(value));
    }
    notice
}
