//! FeedCheck: schema-driven validation of GTFS Schedule transit feeds.
//!
//! A feed is a set of CSV files. FeedCheck loads them against a declarative
//! schema catalog, builds typed and indexed tables, then runs a registry of
//! rules that each report problems as structured notices.
//!
//! # Core Principles
//!
//! - **Never abort on bad data**: every problem in the feed is a notice
//! - **Deterministic output**: notices come out in registry order, whatever the scheduling
//! - **Isolated rules**: a failing rule is reported and the others still run
//!
//! # Example
//!
//! ```no_run
//! use feedcheck::FeedCheck;
//!
//! let checker = FeedCheck::new();
//! let result = checker.validate_dir("path/to/feed").unwrap();
//!
//! println!("Errors: {}", result.summary.notices_by_severity.error);
//! println!("{}", result.summary.recommendation);
//! ```

pub mod config;
pub mod error;
pub mod geo;
pub mod input;
pub mod notice;
pub mod rules;
pub mod schema;
pub mod table;
pub mod value;

mod feedcheck;

pub use crate::feedcheck::{FeedCheck, ValidationResult, ValidationSummary};
pub use config::{FeedCheckConfig, Thresholds};
pub use error::{FeedCheckError, Result};
pub use input::{FeedReader, RawTable, SourceMetadata};
pub use notice::{Notice, NoticeReport, Severity};
pub use rules::{Rule, RuleError};
pub use schema::{FieldSchema, FieldType, SchemaCatalog, TableSchema};
pub use table::{Feed, FeedLoader, TableContainer};
