//! Notices: typed findings, per-writer containers and run-wide aggregation.

mod aggregator;
mod container;
mod notice;

pub use aggregator::{NoticeAggregator, NoticeReport};
pub use container::{CodeCount, DEFAULT_MAX_NOTICES_PER_CODE, NoticeContainer, SeverityCounts};
pub use notice::{Notice, Severity};
