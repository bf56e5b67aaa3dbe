//! Input adapter: feed files to raw, tokenized tables.

mod parser;
mod source;

pub use parser::FeedReader;
pub use source::{RawRow, RawTable, SourceMetadata};
