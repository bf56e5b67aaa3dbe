//! Declarative schema: tables, fields, types and key roles.

mod catalog;
mod field;
pub mod gtfs;
mod table;
mod types;

pub use catalog::SchemaCatalog;
pub use field::FieldSchema;
pub use table::{ForeignKeyRef, TableSchema};
pub use types::{FieldType, KeyRole, NumericRange};
