//! Single-writer notice collection with a per-code sampling cap.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::notice::{Notice, Severity};

/// Default number of notices kept per code.
pub const DEFAULT_MAX_NOTICES_PER_CODE: usize = 1000;

/// Occurrence counts for one notice code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeCount {
    /// Highest severity reported under this code.
    pub severity: Severity,
    /// True number of occurrences.
    pub total: usize,
    /// Number of occurrences kept as examples.
    pub sampled: usize,
}

/// Occurrence counts by severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub error: usize,
    pub warning: usize,
    pub info: usize,
}

impl SeverityCounts {
    pub fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Error => self.error += 1,
            Severity::Warning => self.warning += 1,
            Severity::Info => self.info += 1,
        }
    }

    pub fn add(&mut self, other: &SeverityCounts) {
        self.error += other.error;
        self.warning += other.warning;
        self.info += other.info;
    }

    pub fn total(&self) -> usize {
        self.error + self.warning + self.info
    }
}

/// Notices written by one loader pass or one rule invocation.
///
/// Only the first `cap` notices of each code are kept; every occurrence is
/// counted.
#[derive(Debug, Clone)]
pub struct NoticeContainer {
    cap: usize,
    notices: Vec<Notice>,
    counts: IndexMap<String, CodeCount>,
    by_severity: SeverityCounts,
}

impl NoticeContainer {
    /// Create a container with the default cap.
    pub fn new() -> Self {
        Self::with_cap(DEFAULT_MAX_NOTICES_PER_CODE)
    }

    pub fn with_cap(cap: usize) -> Self {
        Self {
            cap,
            notices: Vec::new(),
            counts: IndexMap::new(),
            by_severity: SeverityCounts::default(),
        }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn push(&mut self, notice: Notice) {
        self.by_severity.record(notice.severity);
        let count = self.counts.entry(notice.code.clone()).or_insert(CodeCount {
            severity: notice.severity,
            total: 0,
            sampled: 0,
        });
        count.total += 1;
        count.severity = count.severity.max(notice.severity);
        if count.sampled < self.cap {
            count.sampled += 1;
            self.notices.push(notice);
        }
    }

    /// Append everything from `other`, keeping its true counts.
    pub fn extend(&mut self, other: NoticeContainer) {
        for (code, theirs) in other.counts {
            let ours = self.counts.entry(code).or_insert(CodeCount {
                severity: theirs.severity,
                total: 0,
                sampled: 0,
            });
            // Sampled counts are recomputed below from the notices that fit.
            ours.total += theirs.total;
            ours.severity = ours.severity.max(theirs.severity);
        }
        self.by_severity.add(&other.by_severity);
        for notice in other.notices {
            if let Some(count) = self.counts.get_mut(&notice.code) {
                if count.sampled < self.cap {
                    count.sampled += 1;
                    self.notices.push(notice);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.notices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    /// True occurrence count for `code`.
    pub fn count(&self, code: &str) -> usize {
        self.counts.get(code).map(|c| c.total).unwrap_or(0)
    }

    pub fn counts(&self) -> &IndexMap<String, CodeCount> {
        &self.counts
    }

    pub fn severity_counts(&self) -> SeverityCounts {
        self.by_severity
    }

    pub(crate) fn into_parts(self) -> (Vec<Notice>, IndexMap<String, CodeCount>, SeverityCounts) {
        (self.notices, self.counts, self.by_severity)
    }
}

impl Default for NoticeContainer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notice(code: &str, severity: Severity) -> Notice {
        Notice::new(code, severity)
    }

    #[test]
    fn test_cap_keeps_true_count() {
        let mut container = NoticeContainer::with_cap(2);
        for _ in 0..5 {
            container.push(notice("decreasing_shape_distance", Severity::Error));
        }
        container.push(notice("unknown_file", Severity::Info));

        assert_eq!(container.len(), 3);
        assert_eq!(container.count("decreasing_shape_distance"), 5);
        assert_eq!(container.counts()["decreasing_shape_distance"].sampled, 2);
        assert_eq!(container.severity_counts().error, 5);
        assert_eq!(container.severity_counts().info, 1);
    }

    #[test]
    fn test_code_severity_is_highest_seen() {
        let mut container = NoticeContainer::new();
        container.push(notice("equal_shape_distance", Severity::Warning));
        container.push(notice("equal_shape_distance", Severity::Error));
        assert_eq!(container.counts()["equal_shape_distance"].severity, Severity::Error);
    }

    #[test]
    fn test_extend_respects_cap() {
        let mut first = NoticeContainer::with_cap(3);
        first.push(notice("a", Severity::Error));
        first.push(notice("a", Severity::Error));
        let mut second = NoticeContainer::with_cap(3);
        second.push(notice("a", Severity::Error));
        second.push(notice("a", Severity::Error));

        first.extend(second);
        assert_eq!(first.len(), 3);
        assert_eq!(first.count("a"), 4);
        assert_eq!(first.counts()["a"].sampled, 3);
    }
}
