//! Run-wide notice aggregation.

use std::sync::Mutex;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::container::{CodeCount, NoticeContainer, SeverityCounts};
use super::notice::{Notice, Severity};

/// Shared, append-only sink for one validation run.
///
/// Writers hand over whole containers tagged with a slot number. Output
/// order depends only on slots, never on which thread finished first.
#[derive(Debug)]
pub struct NoticeAggregator {
    cap: usize,
    batches: Mutex<Vec<(usize, NoticeContainer)>>,
}

impl NoticeAggregator {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            batches: Mutex::new(Vec::new()),
        }
    }

    /// A fresh container for one writer, using the run's cap.
    pub fn container(&self) -> NoticeContainer {
        NoticeContainer::with_cap(self.cap)
    }

    /// Hand over the notices of one writer.
    pub fn merge(&self, slot: usize, container: NoticeContainer) {
        let mut batches = self.batches.lock().unwrap_or_else(|e| e.into_inner());
        batches.push((slot, container));
    }

    /// Stop accepting notices and produce the ordered report.
    pub fn freeze(self) -> NoticeReport {
        let mut batches = self.batches.into_inner().unwrap_or_else(|e| e.into_inner());
        batches.sort_by_key(|(slot, _)| *slot);

        let mut merged = NoticeContainer::with_cap(self.cap);
        for (_, batch) in batches {
            merged.extend(batch);
        }
        let (notices, counts, severity_counts) = merged.into_parts();
        NoticeReport {
            notices,
            counts,
            severity_counts,
        }
    }
}

/// Frozen output of a validation run.
///
/// `notices` holds the sampled examples; `counts` holds the true number of
/// occurrences per code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoticeReport {
    pub notices: Vec<Notice>,
    pub counts: IndexMap<String, CodeCount>,
    pub severity_counts: SeverityCounts,
}

impl NoticeReport {
    /// True occurrence count for `code`.
    pub fn count(&self, code: &str) -> usize {
        self.counts.get(code).map(|c| c.total).unwrap_or(0)
    }

    /// Sampled notices with the given code.
    pub fn with_code<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a Notice> + 'a {
        self.notices.iter().filter(move |n| n.code == code)
    }

    pub fn has_errors(&self) -> bool {
        self.severity_counts.error > 0
    }

    pub fn highest_severity(&self) -> Option<Severity> {
        self.counts.values().map(|c| c.severity).max()
    }

    pub fn total(&self) -> usize {
        self.severity_counts.total()
    }
}
