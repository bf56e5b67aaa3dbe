//! The set of loaded tables of one feed.

use indexmap::IndexMap;

use super::container::TableContainer;

/// Every table loaded from a feed, keyed by table name.
///
/// A table is present exactly when its file was supplied. The feed is
/// frozen once loaded; rules only read it.
#[derive(Debug, Clone, Default)]
pub struct Feed {
    tables: IndexMap<String, TableContainer>,
}

impl Feed {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, table: TableContainer) {
        self.tables.insert(table.name().to_string(), table);
    }

    pub fn table(&self, name: &str) -> Option<&TableContainer> {
        self.tables.get(name)
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableContainer> {
        self.tables.values()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
