//! Arrival and departure times along each trip.

use crate::notice::{Notice, NoticeContainer, Severity};
use crate::schema::gtfs::STOP_TIMES;
use crate::table::{Feed, Row};
use crate::value::ServiceTime;

use super::{Rule, RuleError, require};

const CODE_ONLY_ARRIVAL_OR_DEPARTURE: &str = "stop_time_with_only_arrival_or_departure_time";
const CODE_DEPARTURE_BEFORE_ARRIVAL: &str = "stop_time_with_departure_before_arrival_time";
const CODE_ARRIVAL_BEFORE_PREVIOUS_DEPARTURE: &str =
    "stop_time_with_arrival_before_previous_departure_time";

/// Both times or neither must be set, and time never runs backwards.
#[derive(Debug, Default, Clone, Copy)]
pub struct StopTimeTimingRule;

impl Rule for StopTimeTimingRule {
    fn name(&self) -> &str {
        "stop_time_timing"
    }

    fn required_tables(&self) -> Vec<&str> {
        vec![STOP_TIMES]
    }

    fn validate(&self, feed: &Feed, notices: &mut NoticeContainer) -> Result<(), RuleError> {
        let stop_times = require(feed, STOP_TIMES)?;
        let arrival = stop_times.column("arrival_time")?;
        let departure = stop_times.column("departure_time")?;
        let sequence = stop_times.column("stop_sequence")?;

        for (trip_id, trip) in stop_times.all_groups() {
            let mut previous: Option<(&Row, ServiceTime)> = None;

            for row in trip.iter() {
                let base = |code: &str| {
                    Notice::new(code, Severity::Error)
                        .with_field("csvRowNumber", row.csv_row_number())
                        .with_field("tripId", trip_id)
                };

                match (row.time(arrival), row.time(departure)) {
                    (Some(arrival_time), Some(departure_time)) => {
                        if departure_time < arrival_time {
                            notices.push(
                                base(CODE_DEPARTURE_BEFORE_ARRIVAL)
                                    .with_field("stopSequence", row.get(sequence).to_json())
                                    .with_field("arrivalTime", arrival_time.to_string())
                                    .with_field("departureTime", departure_time.to_string()),
                            );
                        }
                        if let Some((prev_row, prev_departure)) = previous {
                            if arrival_time < prev_departure {
                                notices.push(
                                    base(CODE_ARRIVAL_BEFORE_PREVIOUS_DEPARTURE)
                                        .with_field("prevCsvRowNumber", prev_row.csv_row_number())
                                        .with_field("departureTime", prev_departure.to_string())
                                        .with_field("arrivalTime", arrival_time.to_string()),
                                );
                            }
                        }
                        previous = Some((row, departure_time));
                    }
                    (Some(_), None) | (None, Some(_)) => {
                        let specified = if row.has(arrival) {
                            "arrival_time"
                        } else {
                            "departure_time"
                        };
                        notices.push(
                            base(CODE_ONLY_ARRIVAL_OR_DEPARTURE)
                                .with_field("stopSequence", row.get(sequence).to_json())
                                .with_field("specifiedField", specified),
                        );
                    }
                    (None, None) => {}
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::RawTable;
    use crate::rules::testing::{feed, run};
    use serde_json::json;

    fn stop_time_feed(rows: &[&[&str]]) -> Feed {
        feed(vec![RawTable::from_strs(
            "stop_times.txt",
            &["trip_id", "stop_id", "stop_sequence", "arrival_time", "departure_time"],
            rows,
        )])
    }

    #[test]
    fn test_valid_trip_has_no_notices() {
        let feed = stop_time_feed(&[
            &["T", "A", "1", "08:00:00", "08:00:00"],
            &["T", "B", "2", "", ""],
            &["T", "C", "3", "08:10:00", "08:11:00"],
            &["T", "D", "4", "24:30:00", "24:30:00"],
        ]);
        assert!(run(&StopTimeTimingRule, &feed).is_empty());
    }

    #[test]
    fn test_only_one_time() {
        let feed = stop_time_feed(&[
            &["T", "A", "1", "08:00:00", "08:00:00"],
            &["T", "B", "2", "", "08:05:00"],
        ]);
        let notices = run(&StopTimeTimingRule, &feed);
        assert_eq!(notices.count(CODE_ONLY_ARRIVAL_OR_DEPARTURE), 1);
        let notice = notices.iter().next().unwrap();
        assert_eq!(notice.field("specifiedField"), Some(&json!("departure_time")));
        assert_eq!(notice.field("stopSequence"), Some(&json!(2)));
    }

    #[test]
    fn test_time_going_backwards() {
        let feed = stop_time_feed(&[
            &["T", "A", "1", "08:00:00", "08:10:00"],
            &["T", "B", "2", "08:05:00", "08:04:00"],
        ]);
        let notices = run(&StopTimeTimingRule, &feed);
        assert_eq!(notices.count(CODE_DEPARTURE_BEFORE_ARRIVAL), 1);
        assert_eq!(notices.count(CODE_ARRIVAL_BEFORE_PREVIOUS_DEPARTURE), 1);

        let notice = notices
            .iter()
            .find(|n| n.code == CODE_ARRIVAL_BEFORE_PREVIOUS_DEPARTURE)
            .unwrap();
        assert_eq!(notice.field("prevCsvRowNumber"), Some(&json!(1)));
        assert_eq!(notice.field("departureTime"), Some(&json!("08:10:00")));
        assert_eq!(notice.field("arrivalTime"), Some(&json!("08:05:00")));
    }
}
