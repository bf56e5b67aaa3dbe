//! Validation rules and the runner that executes them.
//!
//! Every rule reads the frozen [`Feed`] and writes notices into its own
//! [`NoticeContainer`]. Rules never see each other's output.

mod block_overlap;
mod calendar;
mod foreign_key;
mod frequency_overlap;
mod increasing_distance;
mod runner;
mod shape_match;
mod stop_time_timing;
mod stops;
mod travel_speed;

use thiserror::Error;

use crate::config::Thresholds;
use crate::notice::NoticeContainer;
use crate::schema::SchemaCatalog;
use crate::table::{Feed, TableContainer, UnknownField};

pub use block_overlap::BlockTripsOverlapRule;
pub use calendar::{MissingCalendarRule, ServiceCalendar};
pub use foreign_key::ForeignKeyRule;
pub use frequency_overlap::FrequencyOverlapRule;
pub use increasing_distance::{ShapeIncreasingDistanceRule, StopTimeIncreasingDistanceRule};
pub use runner::{RuleRunner, RunOutcome, RUNTIME_EXCEPTION_CODE};
pub use shape_match::StopShapeMatchRule;
pub use stop_time_timing::StopTimeTimingRule;
pub use travel_speed::TravelSpeedRule;

/// A failure inside a rule that stops it from finishing.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error(transparent)]
    UnknownField(#[from] UnknownField),

    #[error("table '{0}' is not loaded")]
    MissingTable(String),

    #[error("{0}")]
    Internal(String),
}

impl RuleError {
    /// Short name of the failure kind, reported as `exception`.
    pub fn kind(&self) -> &'static str {
        match self {
            RuleError::UnknownField(_) => "UnknownField",
            RuleError::MissingTable(_) => "MissingTable",
            RuleError::Internal(_) => "Internal",
        }
    }
}

/// One independent check over a loaded feed.
pub trait Rule: Send + Sync {
    /// Stable name used in logs and fault notices.
    fn name(&self) -> &str;

    /// Tables that must be loaded for the rule to run.
    fn required_tables(&self) -> Vec<&str>;

    /// Check the feed and append findings to `notices`.
    fn validate(&self, feed: &Feed, notices: &mut NoticeContainer) -> Result<(), RuleError>;
}

/// Fetch a table a rule declared as required.
pub(crate) fn require<'a>(feed: &'a Feed, name: &str) -> Result<&'a TableContainer, RuleError> {
    feed.table(name)
        .ok_or_else(|| RuleError::MissingTable(name.to_string()))
}

/// The default rule set for a catalog.
///
/// One [`ForeignKeyRule`] per foreign key the catalog declares, then the
/// fixed GTFS rules. Registry order decides notice order in the report.
pub fn default_rules(catalog: &SchemaCatalog, thresholds: &Thresholds) -> Vec<Box<dyn Rule>> {
    let mut rules: Vec<Box<dyn Rule>> = catalog
        .foreign_keys()
        .into_iter()
        .map(|fk| Box::new(ForeignKeyRule::from_ref(&fk)) as Box<dyn Rule>)
        .collect();

    rules.push(Box::new(MissingCalendarRule));
    rules.push(Box::new(ShapeIncreasingDistanceRule::new(
        thresholds.shape_point_closeness_meters,
    )));
    rules.push(Box::new(StopTimeIncreasingDistanceRule::new(
        thresholds.stop_time_closeness_meters,
    )));
    rules.push(Box::new(StopTimeTimingRule));
    rules.push(Box::new(TravelSpeedRule::new(thresholds)));
    rules.push(Box::new(FrequencyOverlapRule));
    rules.push(Box::new(BlockTripsOverlapRule));
    rules.push(Box::new(StopShapeMatchRule::new(thresholds.stop_to_shape_max_meters)));
    rules
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::gtfs;

    #[test]
    fn test_default_rules_have_unique_names() {
        let rules = default_rules(&gtfs::catalog(), &Thresholds::default());
        let mut names: Vec<_> = rules.iter().map(|r| r.name().to_string()).collect();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
        assert!(names.iter().any(|n| n == "foreign_key:stop_times.trip_id->trips.trip_id"));
        assert!(names.iter().any(|n| n == "shape_increasing_distance"));
    }

    #[test]
    fn test_require_reports_missing_table() {
        let feed = Feed::new();
        let err = require(&feed, "shapes").unwrap_err();
        assert_eq!(err.kind(), "MissingTable");
        assert_eq!(err.to_string(), "table 'shapes' is not loaded");
    }
}
