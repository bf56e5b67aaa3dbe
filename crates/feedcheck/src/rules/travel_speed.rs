//! Implausibly fast travel between stops of a trip.

use crate::config::{SpeedLimits, Thresholds};
use crate::geo::LatLon;
use crate::notice::{Notice, NoticeContainer, Severity};
use crate::schema::gtfs::{ROUTES, STOPS, STOP_TIMES, TRIPS};
use crate::table::{Column, Feed, Row};
use crate::value::ServiceTime;

use super::stops::StopLocator;
use super::{Rule, RuleError, require};

const CODE_FAST_TRAVEL_CONSECUTIVE: &str = "fast_travel_between_consecutive_stops";
const CODE_FAST_TRAVEL_FAR: &str = "fast_travel_between_far_stops";

/// Speed in km/h, with elapsed time rounded up to `min_seconds` (at least one).
fn speed_kph(distance_km: f64, elapsed_seconds: i64, min_seconds: u32) -> f64 {
    distance_km * 3600.0 / elapsed_seconds.max(i64::from(min_seconds.max(1))) as f64
}

/// Flags travel faster than the route type allows.
#[derive(Debug, Clone)]
pub struct TravelSpeedRule {
    limits: SpeedLimits,
    far_stops_km: f64,
    min_seconds: u32,
}

impl TravelSpeedRule {
    pub fn new(thresholds: &Thresholds) -> Self {
        Self {
            limits: thresholds.max_speed_kph.clone(),
            far_stops_km: thresholds.far_stops_distance_km,
            min_seconds: thresholds.min_travel_seconds,
        }
    }
}

/// A stop of the trip being walked.
struct Visit<'a> {
    row: &'a Row,
    location: Option<LatLon>,
    /// Kilometers travelled from the first stop, stop to stop.
    cumulative_km: f64,
}

/// Columns used while walking one trip.
struct Columns {
    arrival: Column,
    departure: Column,
    sequence: Column,
    stop_id: Column,
}

impl Columns {
    /// Arrival, or departure when only that is set.
    fn arrival(&self, row: &Row) -> Option<ServiceTime> {
        row.time(self.arrival).or_else(|| row.time(self.departure))
    }

    /// Departure, or arrival when only that is set.
    fn departure(&self, row: &Row) -> Option<ServiceTime> {
        row.time(self.departure).or_else(|| row.time(self.arrival))
    }
}

fn elapsed_seconds(departure: ServiceTime, arrival: ServiceTime) -> i64 {
    i64::from(arrival.seconds()) - i64::from(departure.seconds())
}

impl Rule for TravelSpeedRule {
    fn name(&self) -> &str {
        "travel_speed"
    }

    fn required_tables(&self) -> Vec<&str> {
        vec![STOP_TIMES, TRIPS, ROUTES, STOPS]
    }

    fn validate(&self, feed: &Feed, notices: &mut NoticeContainer) -> Result<(), RuleError> {
        let stop_times = require(feed, STOP_TIMES)?;
        let trips = require(feed, TRIPS)?;
        let routes = require(feed, ROUTES)?;
        let stops = require(feed, STOPS)?;
        let locator = StopLocator::new(stops)?;

        let trip_route = trips.column("route_id")?;
        let route_type = routes.column("route_type")?;
        let stop_name = stops.column("stop_name")?;
        let columns = Columns {
            arrival: stop_times.column("arrival_time")?,
            departure: stop_times.column("departure_time")?,
            sequence: stop_times.column("stop_sequence")?,
            stop_id: stop_times.column("stop_id")?,
        };

        for (trip_id, group) in stop_times.all_groups() {
            let Some(trip) = trips.by_key(&[trip_id]) else {
                continue;
            };
            let route_id = trip.text(trip_route).unwrap_or_default();
            let kind = routes.by_key(&[route_id]).and_then(|r| r.integer(route_type));
            let max_kph = self.limits.for_route_type(kind);

            let mut visits: Vec<Visit<'_>> = Vec::with_capacity(group.len());
            let mut cumulative_km = 0.0;
            // Last located stop; stops without coordinates are bridged.
            let mut anchor: Option<LatLon> = None;
            for row in group.iter() {
                let location = row.text(columns.stop_id).and_then(|id| locator.locate(id));
                if let Some(here) = location {
                    if let Some(prev) = anchor {
                        cumulative_km += prev.distance_meters(&here) / 1000.0;
                    }
                    anchor = Some(here);
                }
                visits.push(Visit {
                    row,
                    location,
                    cumulative_km,
                });
            }

            let describe = |notice: Notice, n: u8, visit: &Visit<'_>| {
                let stop_id = visit.row.text(columns.stop_id).unwrap_or_default();
                let name = stops
                    .by_key(&[stop_id])
                    .and_then(|s| s.text(stop_name))
                    .unwrap_or_default();
                notice
                    .with_field(format!("csvRowNumber{n}"), visit.row.csv_row_number())
                    .with_field(format!("stopSequence{n}"), visit.row.get(columns.sequence).to_json())
                    .with_field(format!("stopId{n}"), stop_id)
                    .with_field(format!("stopName{n}"), name)
            };
            let report = |code: &str, speed: f64, distance_km: f64, from: &Visit<'_>, to: &Visit<'_>| {
                let notice = Notice::new(code, Severity::Warning)
                    .with_field("tripCsvRowNumber", trip.csv_row_number())
                    .with_field("tripId", trip_id)
                    .with_field("routeId", route_id)
                    .with_field("speedKph", speed)
                    .with_field("distanceKm", distance_km);
                let departure = columns.departure(from.row).map(|t| t.to_string());
                let arrival = columns.arrival(to.row).map(|t| t.to_string());
                let notice = describe(notice, 1, from)
                    .with_field("departureTime1", departure.unwrap_or_default());
                describe(notice, 2, to).with_field("arrivalTime2", arrival.unwrap_or_default())
            };

            // Consecutive stops, direct distance.
            for pair in visits.windows(2) {
                let (from, to) = (&pair[0], &pair[1]);
                let (Some(departure), Some(arrival)) =
                    (columns.departure(from.row), columns.arrival(to.row))
                else {
                    continue;
                };
                let (Some(a), Some(b)) = (from.location, to.location) else {
                    continue;
                };
                let distance_km = a.distance_meters(&b) / 1000.0;
                let elapsed = elapsed_seconds(departure, arrival);
                let speed = speed_kph(distance_km, elapsed, self.min_seconds);
                if speed > max_kph {
                    notices.push(report(CODE_FAST_TRAVEL_CONSECUTIVE, speed, distance_km, from, to));
                }
            }

            // Timed, located stops with other stops between them, path distance.
            let mut last_timed: Option<usize> = None;
            for (i, visit) in visits.iter().enumerate() {
                let Some(arrival) = columns.arrival(visit.row) else {
                    continue;
                };
                if visit.location.is_none() {
                    continue;
                }
                if let Some(j) = last_timed.filter(|&j| j + 1 < i) {
                    let from = &visits[j];
                    let distance_km = visit.cumulative_km - from.cumulative_km;
                    let departure = columns.departure(from.row).unwrap_or(arrival);
                    let elapsed = elapsed_seconds(departure, arrival);
                    let speed = speed_kph(distance_km, elapsed, self.min_seconds);
                    if distance_km > self.far_stops_km && speed > max_kph {
                        notices.push(report(CODE_FAST_TRAVEL_FAR, speed, distance_km, from, visit));
                    }
                }
                last_timed = Some(i);
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

    fn speed_feed(route_type: &str, stop_times: &[&[&str]]) -> Feed {
        feed(vec![
            RawTable::from_strs(
                "stops.txt",
                &["stop_id", "stop_name", "stop_lat", "stop_lon"],
                &[
                    &["A", "Alpha", "0", "0"],
                    &["M", "Middle", "0", "0.05"],
                    &["B", "Beta", "0", "0.1"],
                    &["C", "Gamma", "0", "0.2"],
                    &["X", "Nowhere", "", ""],
                ],
            ),
            RawTable::from_strs("routes.txt", &["route_id", "route_type"], &[&["R", route_type]]),
            RawTable::from_strs(
                "trips.txt",
                &["route_id", "service_id", "trip_id"],
                &[&["R", "WK", "T"]],
            ),
            RawTable::from_strs(
                "stop_times.txt",
                &["trip_id", "stop_id", "stop_sequence", "arrival_time", "departure_time"],
                stop_times,
            ),
        ])
    }

    fn rule() -> TravelSpeedRule {
        TravelSpeedRule::new(&Thresholds::default())
    }

    #[test]
    fn test_speed_rounds_short_times_up() {
        assert_eq!(speed_kph(1.0, 30, 60), 60.0);
        assert_eq!(speed_kph(1.0, -30, 60), 60.0);
        assert_eq!(speed_kph(10.0, 3600, 60), 10.0);
    }

    #[test]
    fn test_fast_consecutive_stops() {
        // About 11.1 km in two minutes by bus.
        let feed = speed_feed(
            "3",
            &[&["T", "A", "1", "08:00:00", "08:00:00"], &["T", "B", "2", "08:02:00", "08:02:00"]],
        );
        let notices = run(&rule(), &feed);
        assert_eq!(notices.count(CODE_FAST_TRAVEL_CONSECUTIVE), 1);
        assert_eq!(notices.count(CODE_FAST_TRAVEL_FAR), 0);

        let notice = notices.iter().next().unwrap();
        assert_eq!(notice.severity, Severity::Warning);
        assert_eq!(notice.field("stopName1"), Some(&json!("Alpha")));
        assert_eq!(notice.field("stopId2"), Some(&json!("B")));
        assert_eq!(notice.field("departureTime1"), Some(&json!("08:00:00")));
        assert_eq!(notice.field("arrivalTime2"), Some(&json!("08:02:00")));
        let speed = notice.field("speedKph").and_then(|v| v.as_f64()).unwrap();
        assert!((speed - 333.6).abs() < 0.5, "{speed}");
    }

    #[test]
    fn test_rail_allows_higher_speed() {
        let feed = speed_feed(
            "2",
            &[&["T", "A", "1", "08:00:00", "08:00:00"], &["T", "B", "2", "08:02:00", "08:02:00"]],
        );
        assert!(run(&rule(), &feed).is_empty());
    }

    #[test]
    fn test_fast_far_stops_with_untimed_stop_between() {
        let feed = speed_feed(
            "3",
            &[
                &["T", "A", "1", "08:00:00", "08:00:00"],
                &["T", "M", "2", "", ""],
                &["T", "B", "3", "08:02:00", "08:02:00"],
            ],
        );
        let notices = run(&rule(), &feed);
        assert_eq!(notices.count(CODE_FAST_TRAVEL_FAR), 1);
        assert_eq!(notices.count(CODE_FAST_TRAVEL_CONSECUTIVE), 0);
        let notice = notices.iter().next().unwrap();
        assert_eq!(notice.field("stopSequence1"), Some(&json!(1)));
        assert_eq!(notice.field("stopSequence2"), Some(&json!(3)));
    }

    #[test]
    fn test_zero_min_travel_seconds_stays_finite() {
        assert!(speed_kph(1.0, 0, 0).is_finite());
        assert_eq!(speed_kph(1.0, 0, 0), 3600.0);

        let rule = TravelSpeedRule::new(&Thresholds {
            min_travel_seconds: 0,
            ..Thresholds::default()
        });
        let feed = speed_feed(
            "3",
            &[
                &["T", "A", "1", "08:00:00", "08:00:00"],
                &["T", "B", "2", "08:00:00", "08:00:00"],
            ],
        );
        let notices = run(&rule, &feed);
        assert_eq!(notices.count(CODE_FAST_TRAVEL_CONSECUTIVE), 1);
        let speed = notices.iter().next().unwrap().field("speedKph").and_then(|v| v.as_f64());
        assert!(speed.is_some_and(f64::is_finite));
    }

    #[test]
    fn test_stop_without_coordinates_is_bridged() {
        // A to C is about 22 km in two minutes; X cannot be located.
        for x_time in ["", "08:01:00"] {
            let feed = speed_feed(
                "3",
                &[
                    &["T", "A", "1", "08:00:00", "08:00:00"],
                    &["T", "X", "2", x_time, x_time],
                    &["T", "C", "3", "08:02:00", "08:02:00"],
                ],
            );
            let notices = run(&rule(), &feed);
            assert_eq!(notices.count(CODE_FAST_TRAVEL_FAR), 1, "x_time={x_time:?}");
            assert_eq!(notices.count(CODE_FAST_TRAVEL_CONSECUTIVE), 0);

            let notice = notices.iter().next().unwrap();
            assert_eq!(notice.field("stopId1"), Some(&json!("A")));
            assert_eq!(notice.field("stopId2"), Some(&json!("C")));
            let distance = notice.field("distanceKm").and_then(|v| v.as_f64()).unwrap();
            assert!((distance - 22.24).abs() < 0.1, "{distance}");
        }
    }

    #[test]
    fn test_plausible_trip() {
        let feed = speed_feed(
            "3",
            &[
                &["T", "A", "1", "08:00:00", "08:00:00"],
                &["T", "M", "2", "", ""],
                &["T", "B", "3", "09:00:00", "09:00:00"],
            ],
        );
        assert!(run(&rule(), &feed).is_empty());
    }
}
