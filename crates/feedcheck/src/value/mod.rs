//! Field value model: typed parsing of raw cells.

mod field_value;
mod parse;
mod time;

pub use field_value::{FieldState, FieldValue};
pub use parse::FieldParseError;
pub use time::{Color, ServiceTime};
