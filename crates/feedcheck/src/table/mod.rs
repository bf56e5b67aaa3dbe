//! Typed, indexed tables and the loader that builds them.

mod container;
mod feed;
mod loader;
mod row;

pub use container::{Group, TableContainer};
pub use feed::Feed;
pub use loader::FeedLoader;
pub use row::{Column, Row, UnknownField};
