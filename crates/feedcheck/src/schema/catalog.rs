//! Schema catalog: every table the engine knows about.

use std::sync::Arc;

use indexmap::IndexMap;

use super::table::{ForeignKeyRef, TableSchema};

/// Ordered collection of table schemas keyed by table name.
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    tables: IndexMap<String, Arc<TableSchema>>,
}

impl SchemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table schema, replacing any previous one with the same name.
    pub fn with_table(mut self, schema: TableSchema) -> Self {
        self.insert(schema);
        self
    }

    pub fn insert(&mut self, schema: TableSchema) {
        self.tables.insert(schema.name.clone(), Arc::new(schema));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<TableSchema>> {
        self.tables.get(name)
    }

    /// Look a table up by the file name it is stored in.
    pub fn by_filename(&self, filename: &str) -> Option<&Arc<TableSchema>> {
        self.tables.values().find(|t| t.filename == filename)
    }

    pub fn tables(&self) -> impl Iterator<Item = &Arc<TableSchema>> {
        self.tables.values()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Every foreign key declared across the catalog, in table order.
    pub fn foreign_keys(&self) -> Vec<ForeignKeyRef<'_>> {
        self.tables.values().flat_map(|t| t.foreign_keys()).collect()
    }
}
