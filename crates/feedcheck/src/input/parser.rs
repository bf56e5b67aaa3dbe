//! Feed file reader built on the `csv` crate.

use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::debug;

use super::source::{RawTable, SourceMetadata};
use crate::error::{FeedCheckError, Result};

/// Extension of feed files.
const FEED_FILE_EXTENSION: &str = "txt";

/// Reads feed files into raw tables.
#[derive(Debug, Clone, Default)]
pub struct FeedReader {
    /// Maximum rows to read per file (None = all).
    pub max_rows: Option<usize>,
}

impl FeedReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every `*.txt` file of a directory, sorted by file name.
    pub fn read_dir(&self, dir: impl AsRef<Path>) -> Result<Vec<(RawTable, SourceMetadata)>> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir).map_err(|e| FeedCheckError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| FeedCheckError::Io {
                path: dir.to_path_buf(),
                source: e,
            })?;
            let path = entry.path();
            if path.is_file()
                && path.extension().and_then(|e| e.to_str()) == Some(FEED_FILE_EXTENSION)
            {
                paths.push(path);
            }
        }
        paths.sort();

        if paths.is_empty() {
            return Err(FeedCheckError::EmptyData(format!(
                "no .{FEED_FILE_EXTENSION} files in '{}'",
                dir.display()
            )));
        }

        paths.iter().map(|p| self.read_file(p)).collect()
    }

    /// Read one file from disk.
    pub fn read_file(&self, path: impl AsRef<Path>) -> Result<(RawTable, SourceMetadata)> {
        let path = path.as_ref();
        let contents = fs::read(path).map_err(|e| FeedCheckError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let filename = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let (table, mut metadata) = self.read_bytes(&filename, &contents)?;
        metadata.path = Some(path.to_path_buf());
        Ok((table, metadata))
    }

    /// Parse the bytes of one file.
    pub fn read_bytes(&self, filename: &str, bytes: &[u8]) -> Result<(RawTable, SourceMetadata)> {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let hash = format!("sha256:{:x}", hasher.finalize());

        let csv_error = |source| FeedCheckError::Csv {
            filename: filename.to_string(),
            source,
        };

        // Strip a UTF-8 byte order mark so the first header matches.
        let body = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(body);

        // Invalid UTF-8 becomes U+FFFD instead of failing the file.
        let headers: Vec<String> = reader
            .byte_headers()
            .map_err(csv_error)?
            .iter()
            .map(decode_cell)
            .collect();

        let mut rows = Vec::new();
        for (row_idx, result) in reader.byte_records().enumerate() {
            if let Some(max) = self.max_rows {
                if row_idx >= max {
                    break;
                }
            }

            // Cells are kept as read; the loader reports rows whose width
            // differs from the header.
            let record = result.map_err(csv_error)?;
            rows.push(record.iter().map(decode_cell).collect());
        }

        let table = RawTable::new(filename, headers, rows);
        debug!(
            file = filename,
            rows = table.row_count(),
            columns = table.column_count(),
            "Read feed file"
        );

        let metadata = SourceMetadata {
            file: filename.to_string(),
            path: None,
            hash,
            size_bytes: bytes.len() as u64,
            row_count: table.row_count(),
            column_count: table.column_count(),
        };
        Ok((table, metadata))
    }
}

fn decode_cell(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_bytes() {
        let reader = FeedReader::new();
        let data = b"stop_id,stop_name\nS1,Main St\nS2,\"Oak, Ave\"\n";
        let (table, metadata) = reader.read_bytes("stops.txt", data).unwrap();

        assert_eq!(table.headers, vec!["stop_id", "stop_name"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.get(1, 1), Some("Oak, Ave"));
        assert_eq!(table.rows[1].csv_row_number, 2);
        assert!(metadata.hash.starts_with("sha256:"));
        assert_eq!(metadata.size_bytes, data.len() as u64);
    }

    #[test]
    fn test_row_cells_are_kept_as_read() {
        let reader = FeedReader::new();
        let (table, _) = reader.read_bytes("stops.txt", b"a,b,c\n1\n1,2,3,4\n").unwrap();
        assert_eq!(table.rows[0].values, vec!["1"]);
        assert_eq!(table.rows[1].values, vec!["1", "2", "3", "4"]);
        assert_eq!(table.get(0, 2), None);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let reader = FeedReader::new();
        let (table, metadata) = reader
            .read_bytes("feed_info.txt", b"feed_publisher_name,feed_lang\nM\xfftro,fr\n")
            .unwrap();
        assert_eq!(table.get(0, 0), Some("M\u{FFFD}tro"));
        assert_eq!(table.get(0, 1), Some("fr"));
        assert_eq!(metadata.row_count, 1);

        let (table, _) = reader.read_bytes("stops.txt", b"stop_\xffid\nS1\n").unwrap();
        assert_eq!(table.headers, vec!["stop_\u{FFFD}id"]);
    }

    #[test]
    fn test_byte_order_mark_is_stripped() {
        let reader = FeedReader::new();
        let (table, _) = reader
            .read_bytes("agency.txt", b"\xEF\xBB\xBFagency_name\nMetro\n")
            .unwrap();
        assert_eq!(table.headers, vec!["agency_name"]);
    }

    #[test]
    fn test_read_dir_only_reads_txt() {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in [("stops.txt", "stop_id\nS1\n"), ("notes.md", "# notes\n")] {
            let mut file = std::fs::File::create(dir.path().join(name)).unwrap();
            file.write_all(content.as_bytes()).unwrap();
        }

        let tables = FeedReader::new().read_dir(dir.path()).unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].0.filename, "stops.txt");
        assert!(tables[0].1.path.is_some());
    }

    #[test]
    fn test_read_empty_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            FeedReader::new().read_dir(dir.path()),
            Err(FeedCheckError::EmptyData(_))
        ));
    }
}
