//! Raw feed tables and source metadata.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Metadata about one file of the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name without path, e.g. `stops.txt`.
    pub file: String,
    /// Full path, when the table was read from disk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// SHA-256 hash of the file contents.
    pub hash: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Number of data rows (excluding header).
    pub row_count: usize,
    /// Number of header columns.
    pub column_count: usize,
}

/// One tokenized data row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based row number, header excluded.
    pub csv_row_number: u64,
    /// Cell values as read, aligned with the headers by position. May be
    /// shorter or longer than the header.
    pub values: Vec<String>,
}

/// One tokenized feed file, before typing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    /// File name, e.g. `shapes.txt`.
    pub filename: String,
    /// Column headers.
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    /// Create a table from headers and row cells, numbering rows from 1.
    pub fn new(filename: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(i, values)| RawRow {
                csv_row_number: i as u64 + 1,
                values,
            })
            .collect();
        Self {
            filename: filename.into(),
            headers,
            rows,
        }
    }

    /// Convenience constructor from string slices.
    pub fn from_strs(filename: &str, headers: &[&str], rows: &[&[&str]]) -> Self {
        Self::new(
            filename,
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|v| v.to_string()).collect())
                .collect(),
        )
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Position of a header.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Get a specific cell value.
    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.values.get(col).map(|s| s.as_str()))
    }
}
