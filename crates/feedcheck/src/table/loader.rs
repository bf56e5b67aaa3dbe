//! Builds typed, indexed tables from raw feed files.
//!
//! Structural problems (unknown or missing files, header problems, blank or
//! malformed cells) become notices; loading always continues.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::input::{RawRow, RawTable};
use crate::notice::{Notice, NoticeContainer, Severity};
use crate::schema::{FieldSchema, SchemaCatalog, TableSchema};
use crate::value::FieldValue;

use super::container::TableContainer;
use super::feed::Feed;
use super::row::Row;

/// Loads raw tables against a schema catalog.
#[derive(Debug, Clone)]
pub struct FeedLoader<'a> {
    catalog: &'a SchemaCatalog,
    cap: usize,
    parallel: bool,
}

impl<'a> FeedLoader<'a> {
    pub fn new(catalog: &'a SchemaCatalog) -> Self {
        Self {
            catalog,
            cap: crate::notice::DEFAULT_MAX_NOTICES_PER_CODE,
            parallel: true,
        }
    }

    /// Per-code sampling cap for load notices.
    pub fn with_cap(mut self, cap: usize) -> Self {
        self.cap = cap;
        self
    }

    /// Load tables on the rayon pool (default) or one after another.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Type, check and index every supplied table.
    pub fn load(&self, raw_tables: Vec<RawTable>) -> (Feed, NoticeContainer) {
        let mut notices = NoticeContainer::with_cap(self.cap);
        let mut seen = HashSet::new();
        let mut to_load = Vec::new();

        for raw in raw_tables {
            let Some(schema) = self.catalog.by_filename(&raw.filename) else {
                notices.push(
                    Notice::new("unknown_file", Severity::Info)
                        .with_field("filename", raw.filename.as_str()),
                );
                continue;
            };
            if !seen.insert(schema.name.clone()) {
                warn!(file = %raw.filename, "File supplied twice, keeping the first copy");
                continue;
            }
            if raw.headers.is_empty() {
                notices.push(empty_file_notice(&raw.filename));
                continue;
            }
            to_load.push((Arc::clone(schema), raw));
        }

        let loaded: Vec<(TableContainer, NoticeContainer)> = if self.parallel {
            to_load
                .into_par_iter()
                .map(|(schema, raw)| self.load_table(schema, raw))
                .collect()
        } else {
            to_load
                .into_iter()
                .map(|(schema, raw)| self.load_table(schema, raw))
                .collect()
        };

        let mut feed = Feed::new();
        for (table, table_notices) in loaded {
            notices.extend(table_notices);
            feed.insert(table);
        }

        for schema in self.catalog.tables() {
            if schema.required && !feed.has_table(&schema.name) {
                notices.push(
                    Notice::new("missing_required_file", Severity::Error)
                        .with_field("filename", schema.filename.as_str()),
                );
            }
        }

        (feed, notices)
    }

    fn load_table(&self, schema: Arc<TableSchema>, raw: RawTable) -> (TableContainer, NoticeContainer) {
        let mut notices = NoticeContainer::with_cap(self.cap);
        let field_columns = map_header(&schema, &raw.headers, &mut notices);

        if raw.rows.is_empty() {
            notices.push(empty_file_notice(&raw.filename));
        }

        let mut rows = Vec::with_capacity(raw.rows.len());
        for raw_row in &raw.rows {
            if raw_row.values.iter().all(|v| v.trim().is_empty()) {
                notices.push(
                    Notice::new("empty_row", Severity::Warning)
                        .with_field("filename", schema.filename.as_str())
                        .with_field("csvRowNumber", raw_row.csv_row_number),
                );
                continue;
            }
            if raw_row.values.len() != raw.headers.len() {
                notices.push(
                    Notice::new("invalid_row_length", Severity::Error)
                        .with_field("filename", schema.filename.as_str())
                        .with_field("csvRowNumber", raw_row.csv_row_number)
                        .with_field("rowLength", raw_row.values.len())
                        .with_field("headerCount", raw.headers.len()),
                );
            }
            let values = schema
                .fields
                .values()
                .zip(&field_columns)
                .map(|(field, column)| read_cell(&schema, field, *column, raw_row, &mut notices))
                .collect();
            rows.push(Row::new(Arc::clone(&schema), raw_row.csv_row_number, values));
        }

        debug!(
            table = %schema.name,
            rows = rows.len(),
            notices = notices.severity_counts().total(),
            "Loaded table"
        );
        let table = TableContainer::build(schema, raw.headers, rows, &mut notices);
        (table, notices)
    }
}

/// Map each schema field to its header position, reporting header problems.
fn map_header(schema: &TableSchema, headers: &[String], notices: &mut NoticeContainer) -> Vec<Option<usize>> {
    let mut field_columns = vec![None; schema.field_count()];
    let mut first_seen: HashMap<&str, usize> = HashMap::new();

    for (index, header) in headers.iter().enumerate() {
        let name = header.trim();
        if name.is_empty() {
            notices.push(
                Notice::new("empty_column_name", Severity::Error)
                    .with_field("filename", schema.filename.as_str())
                    .with_field("index", index),
            );
            continue;
        }
        if let Some(&first) = first_seen.get(name) {
            notices.push(
                Notice::new("duplicated_column", Severity::Error)
                    .with_field("filename", schema.filename.as_str())
                    .with_field("fieldName", name)
                    .with_field("firstIndex", first)
                    .with_field("secondIndex", index),
            );
            continue;
        }
        first_seen.insert(name, index);

        match schema.index_of(name) {
            Some(field_idx) => field_columns[field_idx] = Some(index),
            None => notices.push(
                Notice::new("unknown_column", Severity::Info)
                    .with_field("filename", schema.filename.as_str())
                    .with_field("fieldName", name)
                    .with_field("index", index),
            ),
        }
    }

    for (field, column) in schema.fields.values().zip(&field_columns) {
        if field.required && column.is_none() {
            notices.push(
                Notice::new("missing_required_column", Severity::Error)
                    .with_field("filename", schema.filename.as_str())
                    .with_field("fieldName", field.name.as_str()),
            );
        }
    }

    field_columns
}

/// Type one cell, reporting whitespace, parse, presence and range problems.
fn read_cell(
    schema: &TableSchema,
    field: &FieldSchema,
    column: Option<usize>,
    raw_row: &RawRow,
    notices: &mut NoticeContainer,
) -> FieldValue {
    let Some(cell) = column.and_then(|c| raw_row.values.get(c)) else {
        return FieldValue::Absent;
    };
    let cell_notice = |code: &str, severity: Severity, value: &str| {
        Notice::new(code, severity)
            .with_field("filename", schema.filename.as_str())
            .with_field("csvRowNumber", raw_row.csv_row_number)
            .with_field("fieldName", field.name.as_str())
            .with_field("fieldValue", value)
    };

    let trimmed = cell.trim();
    if !trimmed.is_empty() && trimmed.len() != cell.len() {
        notices.push(cell_notice("leading_or_trailing_whitespaces", Severity::Warning, cell));
    }

    let value = match FieldValue::parse(cell, &field.field_type) {
        Ok(value) => value,
        Err(err) => {
            notices.push(cell_notice(err.code(), err.severity(), trimmed));
            err.recovered_value(trimmed)
        }
    };

    if field.required && value == FieldValue::Absent {
        notices.push(
            Notice::new("missing_required_field", Severity::Error)
                .with_field("filename", schema.filename.as_str())
                .with_field("csvRowNumber", raw_row.csv_row_number)
                .with_field("fieldName", field.name.as_str()),
        );
    }

    if let (Some(range), Some(number)) = (field.range, value.as_f64()) {
        if !range.contains(number) {
            notices.push(cell_notice("number_out_of_range", Severity::Error, trimmed));
        }
    }

    value
}

fn empty_file_notice(filename: &str) -> Notice {
    Notice::new("empty_file", Severity::Error).with_field("filename", filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::gtfs;
    use serde_json::json;

    fn load(tables: Vec<RawTable>) -> (Feed, NoticeContainer) {
        let catalog = gtfs::catalog();
        FeedLoader::new(&catalog).with_parallel(false).load(tables)
    }

    fn codes(notices: &NoticeContainer) -> Vec<&str> {
        notices.iter().map(|n| n.code.as_str()).collect()
    }

    #[test]
    fn test_missing_required_files_and_unknown_file() {
        let (feed, notices) = load(vec![RawTable::from_strs("extra.txt", &["a"], &[&["1"]])]);
        assert!(feed.is_empty());
        assert_eq!(notices.count("unknown_file"), 1);
        assert_eq!(notices.count("missing_required_file"), 5);
    }

    #[test]
    fn test_header_checks() {
        let (feed, notices) = load(vec![RawTable::from_strs(
            "stops.txt",
            &["stop_id", "stop_name", "stop_name", "", "color_of_bench"],
            &[&["S1", "Main", "Main", "", "red"]],
        )]);
        assert!(feed.has_table("stops"));
        let codes = codes(&notices);
        assert!(codes.contains(&"duplicated_column"));
        assert!(codes.contains(&"empty_column_name"));
        assert!(codes.contains(&"unknown_column"));
    }

    #[test]
    fn test_missing_required_column_reported_once() {
        let (_, notices) = load(vec![RawTable::from_strs(
            "routes.txt",
            &["route_id", "route_short_name"],
            &[&["R1", "1"], &["R2", "2"]],
        )]);
        assert_eq!(notices.count("missing_required_column"), 1);
        assert_eq!(notices.count("missing_required_field"), 0);
    }

    #[test]
    fn test_cell_checks() {
        let (feed, notices) = load(vec![RawTable::from_strs(
            "stops.txt",
            &["stop_id", "stop_lat", "stop_lon", "location_type", "stop_url"],
            &[
                &["S1", "91.0", "10.0", "0", "https://example.com"],
                &["", "45.0", "abc", "9", "not a url"],
                &[" S3", "45.0", "10.0", "", ""],
                &["", "", "", "", ""],
            ],
        )]);

        assert_eq!(notices.count("number_out_of_range"), 1);
        assert_eq!(notices.count("missing_required_field"), 1);
        assert_eq!(notices.count("invalid_float"), 1);
        assert_eq!(notices.count("unexpected_enum_value"), 1);
        assert_eq!(notices.count("invalid_url"), 1);
        assert_eq!(notices.count("leading_or_trailing_whitespaces"), 1);
        assert_eq!(notices.count("empty_row"), 1);

        let invalid = notices.iter().find(|n| n.code == "invalid_float").unwrap();
        assert_eq!(invalid.field("csvRowNumber"), Some(&json!(2)));
        assert_eq!(invalid.field("fieldName"), Some(&json!("stop_lon")));
        assert_eq!(invalid.field("fieldValue"), Some(&json!("abc")));

        let stops = feed.table("stops").unwrap();
        assert_eq!(stops.len(), 3);
        let lon = stops.column("stop_lon").unwrap();
        let kind = stops.column("location_type").unwrap();
        assert_eq!(stops.all()[1].get(lon), &FieldValue::Invalid("abc".to_string()));
        assert_eq!(stops.all()[1].integer(kind), Some(9));
        assert!(stops.by_key(&["S3"]).is_some());
    }

    #[test]
    fn test_row_length_checks() {
        let (feed, notices) = load(vec![RawTable::new(
            "stops.txt",
            vec!["stop_id".into(), "stop_name".into()],
            vec![
                vec!["S1".into(), "Main".into(), "extra".into()],
                vec!["S2".into()],
                vec!["S3".into(), "Elm".into()],
            ],
        )]);

        assert_eq!(notices.count("invalid_row_length"), 2);
        let first = notices.iter().find(|n| n.code == "invalid_row_length").unwrap();
        assert_eq!(first.severity, Severity::Error);
        assert_eq!(first.field("csvRowNumber"), Some(&json!(1)));
        assert_eq!(first.field("rowLength"), Some(&json!(3)));
        assert_eq!(first.field("headerCount"), Some(&json!(2)));

        // Short and long rows still load.
        let stops = feed.table("stops").unwrap();
        assert_eq!(stops.len(), 3);
        let name = stops.column("stop_name").unwrap();
        assert_eq!(stops.by_key(&["S1"]).and_then(|r| r.text(name)), Some("Main"));
        assert_eq!(stops.by_key(&["S2"]).map(|r| r.get(name)), Some(&FieldValue::Absent));
    }

    #[test]
    fn test_empty_file() {
        let (feed, notices) = load(vec![
            RawTable::from_strs("agency.txt", &["agency_name"], &[]),
            RawTable::from_strs("shapes.txt", &[], &[]),
        ]);
        assert_eq!(notices.count("empty_file"), 2);
        assert!(feed.has_table("agency"));
        assert!(!feed.has_table("shapes"));
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let tables = vec![
            RawTable::from_strs("stops.txt", &["stop_id"], &[&["S1"], &["S1"]]),
            RawTable::from_strs("routes.txt", &["route_id", "route_type"], &[&["R1", "x"]]),
        ];
        let catalog = gtfs::catalog();
        let (_, sequential) = FeedLoader::new(&catalog).with_parallel(false).load(tables.clone());
        let (_, parallel) = FeedLoader::new(&catalog).load(tables);
        assert_eq!(codes(&sequential), codes(&parallel));
    }
}
