//! Frequency periods of one trip must not overlap.

use crate::notice::{Notice, NoticeContainer, Severity};
use crate::schema::gtfs::FREQUENCIES;
use crate::table::Feed;

use super::{Rule, RuleError, require};

const CODE_OVERLAPPING_FREQUENCY: &str = "overlapping_frequency";

/// Consecutive periods (sorted by start) overlap when the earlier one ends
/// after the later one starts. Touching periods are fine.
#[derive(Debug, Default, Clone, Copy)]
pub struct FrequencyOverlapRule;

impl Rule for FrequencyOverlapRule {
    fn name(&self) -> &str {
        "frequency_overlap"
    }

    fn required_tables(&self) -> Vec<&str> {
        vec![FREQUENCIES]
    }

    fn validate(&self, feed: &Feed, notices: &mut NoticeContainer) -> Result<(), RuleError> {
        let frequencies = require(feed, FREQUENCIES)?;
        let start = frequencies.column("start_time")?;
        let end = frequencies.column("end_time")?;

        for (trip_id, periods) in frequencies.all_groups() {
            for (prev, curr) in periods.pairs() {
                let (Some(prev_end), Some(curr_start)) = (prev.time(end), curr.time(start)) else {
                    continue;
                };
                if prev_end > curr_start {
                    notices.push(
                        Notice::new(CODE_OVERLAPPING_FREQUENCY, Severity::Error)
                            .with_field("prevCsvRowNumber", prev.csv_row_number())
                            .with_field("prevEndTime", prev_end.to_string())
                            .with_field("currCsvRowNumber", curr.csv_row_number())
                            .with_field("currStartTime", curr_start.to_string())
                            .with_field("tripId", trip_id),
                    );
                }
            }
        }
        Ok(())
    }
}
