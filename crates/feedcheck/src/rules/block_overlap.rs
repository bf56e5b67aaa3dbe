//! Trips of one block must not run at the same time on the same day.

use crate::notice::{Notice, NoticeContainer, Severity};
use crate::schema::gtfs::{STOP_TIMES, TRIPS};
use crate::table::{Feed, Row};
use crate::value::ServiceTime;

use super::calendar::ServiceCalendar;
use super::{Rule, RuleError, require};

const CODE_BLOCK_TRIPS_OVERLAP: &str = "block_trips_with_overlapping_stop_times";

/// A trip of a block with its running interval.
struct TimedTrip<'a> {
    row: &'a Row,
    trip_id: &'a str,
    service_id: &'a str,
    start: ServiceTime,
    end: ServiceTime,
}

/// Reports pairs of block trips whose [first departure, last arrival]
/// intervals intersect on a shared service date.
///
/// Without calendar files, trips share a date only when they share a
/// `service_id`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlockTripsOverlapRule;

impl Rule for BlockTripsOverlapRule {
    fn name(&self) -> &str {
        "block_trips_overlap"
    }

    fn required_tables(&self) -> Vec<&str> {
        vec![TRIPS, STOP_TIMES]
    }

    fn validate(&self, feed: &Feed, notices: &mut NoticeContainer) -> Result<(), RuleError> {
        let trips = require(feed, TRIPS)?;
        let stop_times = require(feed, STOP_TIMES)?;
        let trip_id_column = trips.column("trip_id")?;
        let service_column = trips.column("service_id")?;
        let arrival = stop_times.column("arrival_time")?;
        let departure = stop_times.column("departure_time")?;
        let calendar = ServiceCalendar::from_feed(feed)?;

        for (block_id, block) in trips.all_groups() {
            if block.len() < 2 {
                continue;
            }

            let mut timed: Vec<TimedTrip<'_>> = block
                .iter()
                .filter_map(|row| {
                    let trip_id = row.text(trip_id_column)?;
                    let service_id = row.text(service_column)?;
                    let stops = stop_times.by_group(trip_id);
                    let start = stops
                        .iter()
                        .find_map(|st| st.time(departure).or_else(|| st.time(arrival)))?;
                    let end = stops
                        .iter()
                        .filter_map(|st| st.time(arrival).or_else(|| st.time(departure)))
                        .last()?;
                    Some(TimedTrip {
                        row,
                        trip_id,
                        service_id,
                        start,
                        end,
                    })
                })
                .collect();
            timed.sort_by_key(|t| (t.start, t.end));

            for (i, a) in timed.iter().enumerate() {
                for b in &timed[i + 1..] {
                    // Sorted by start: no later trip can overlap `a` either.
                    if b.start >= a.end {
                        break;
                    }
                    let intersection = match &calendar {
                        Some(calendar) => match calendar.first_common_date(a.service_id, b.service_id) {
                            Some(date) => Some(date.format("%Y%m%d").to_string()),
                            None => continue,
                        },
                        None if a.service_id == b.service_id => None,
                        None => continue,
                    };

                    notices.push(
                        Notice::new(CODE_BLOCK_TRIPS_OVERLAP, Severity::Error)
                            .with_field("blockId", block_id)
                            .with_field("csvRowNumberA", a.row.csv_row_number())
                            .with_field("tripIdA", a.trip_id)
                            .with_field("serviceIdA", a.service_id)
                            .with_field("csvRowNumberB", b.row.csv_row_number())
                            .with_field("tripIdB", b.trip_id)
                            .with_field("serviceIdB", b.service_id)
                            // Null when no calendar file gives the shared date.
                            .with_field("intersection", intersection),
                    );
                }
            }
        }
        Ok(())
    }
}
