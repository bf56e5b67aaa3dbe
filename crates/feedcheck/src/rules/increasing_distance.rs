//! Distance along a path must strictly increase with the sequence.

use serde_json::Value;

use crate::geo::LatLon;
use crate::notice::{Notice, NoticeContainer, Severity};
use crate::schema::gtfs::{SHAPES, STOPS, STOP_TIMES};
use crate::table::{Column, Feed, Row};

use super::stops::StopLocator;
use super::{Rule, RuleError, require};

const CODE_DECREASING_SHAPE_DISTANCE: &str = "decreasing_shape_distance";
const CODE_EQUAL_SHAPE_DISTANCE: &str = "equal_shape_distance";
const CODE_DECREASING_STOP_TIME_DISTANCE: &str = "decreasing_stop_time_distance";
const CODE_EQUAL_STOP_TIME_DISTANCE: &str = "equal_stop_time_distance";

/// What a consecutive pair of distances violates, if anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Violation {
    Decreasing,
    /// Equal distances; warning when the points are close, error otherwise.
    Equal(Severity),
}

fn classify(prev: f64, curr: f64, are_close: impl FnOnce() -> bool) -> Option<Violation> {
    if prev > curr {
        Some(Violation::Decreasing)
    } else if prev == curr {
        Some(Violation::Equal(if are_close() {
            Severity::Warning
        } else {
            Severity::Error
        }))
    } else {
        None
    }
}

fn close(a: Option<LatLon>, b: Option<LatLon>, threshold_meters: f64) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.is_close(&b, threshold_meters),
        _ => false,
    }
}

/// Shared payload: the current row, then the previous one.
#[allow(clippy::too_many_arguments)]
fn pair_notice(
    code: &str,
    severity: Severity,
    group: (&str, &str),
    extra: Option<(&str, Value)>,
    sequence_field: &str,
    distance: Column,
    sequence: Column,
    prev: &Row,
    curr: &Row,
) -> Notice {
    let mut notice = Notice::new(code, severity).with_field(group.0, group.1);
    if let Some((name, value)) = extra {
        notice = notice.with_field(name, value);
    }
    notice
        .with_field("csvRowNumber", curr.csv_row_number())
        .with_field("shapeDistTraveled", curr.float(distance).unwrap_or(0.0))
        .with_field(sequence_field, curr.get(sequence).to_json())
        .with_field("prevCsvRowNumber", prev.csv_row_number())
        .with_field("prevShapeDistTraveled", prev.float(distance).unwrap_or(0.0))
        .with_field(format!("prev{}", capitalize(sequence_field)), prev.get(sequence).to_json())
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `shape_dist_traveled` must increase along each shape.
///
/// A pair is skipped only when neither point has a distance; a missing
/// distance on one side counts as zero.
#[derive(Debug, Clone)]
pub struct ShapeIncreasingDistanceRule {
    closeness_meters: f64,
}

impl ShapeIncreasingDistanceRule {
    pub fn new(closeness_meters: f64) -> Self {
        Self { closeness_meters }
    }
}

impl Rule for ShapeIncreasingDistanceRule {
    fn name(&self) -> &str {
        "shape_increasing_distance"
    }

    fn required_tables(&self) -> Vec<&str> {
        vec![SHAPES]
    }

    fn validate(&self, feed: &Feed, notices: &mut NoticeContainer) -> Result<(), RuleError> {
        let shapes = require(feed, SHAPES)?;
        let distance = shapes.column("shape_dist_traveled")?;
        let sequence = shapes.column("shape_pt_sequence")?;
        let lat = shapes.column("shape_pt_lat")?;
        let lon = shapes.column("shape_pt_lon")?;
        let location = |row: &Row| Some(LatLon::new(row.float(lat)?, row.float(lon)?));

        for (shape_id, points) in shapes.all_groups() {
            for (prev, curr) in points.pairs() {
                if !prev.has(distance) && !curr.has(distance) {
                    continue;
                }
                let prev_distance = prev.float(distance).unwrap_or(0.0);
                let curr_distance = curr.float(distance).unwrap_or(0.0);
                let violation = classify(prev_distance, curr_distance, || {
                    close(location(prev), location(curr), self.closeness_meters)
                });
                let (code, severity) = match violation {
                    None => continue,
                    Some(Violation::Decreasing) => (CODE_DECREASING_SHAPE_DISTANCE, Severity::Error),
                    Some(Violation::Equal(severity)) => (CODE_EQUAL_SHAPE_DISTANCE, severity),
                };
                notices.push(pair_notice(
                    code,
                    severity,
                    ("shapeId", shape_id),
                    None,
                    "shapePtSequence",
                    distance,
                    sequence,
                    prev,
                    curr,
                ));
            }
        }
        Ok(())
    }
}

/// `stop_times.shape_dist_traveled` must increase along each trip.
///
/// Only pairs where both stops carry a distance are compared.
#[derive(Debug, Clone)]
pub struct StopTimeIncreasingDistanceRule {
    closeness_meters: f64,
}

impl StopTimeIncreasingDistanceRule {
    pub fn new(closeness_meters: f64) -> Self {
        Self { closeness_meters }
    }
}

impl Rule for StopTimeIncreasingDistanceRule {
    fn name(&self) -> &str {
        "stop_time_increasing_distance"
    }

    fn required_tables(&self) -> Vec<&str> {
        vec![STOP_TIMES, STOPS]
    }

    fn validate(&self, feed: &Feed, notices: &mut NoticeContainer) -> Result<(), RuleError> {
        let stop_times = require(feed, STOP_TIMES)?;
        let locator = StopLocator::new(require(feed, STOPS)?)?;
        let distance = stop_times.column("shape_dist_traveled")?;
        let sequence = stop_times.column("stop_sequence")?;
        let stop_id = stop_times.column("stop_id")?;
        let location = |row: &Row| row.text(stop_id).and_then(|id| locator.locate(id));

        for (trip_id, trip) in stop_times.all_groups() {
            for (prev, curr) in trip.pairs() {
                let (Some(prev_distance), Some(curr_distance)) =
                    (prev.float(distance), curr.float(distance))
                else {
                    continue;
                };
                let violation = classify(prev_distance, curr_distance, || {
                    close(location(prev), location(curr), self.closeness_meters)
                });
                let (code, severity) = match violation {
                    None => continue,
                    Some(Violation::Decreasing) => {
                        (CODE_DECREASING_STOP_TIME_DISTANCE, Severity::Error)
                    }
                    Some(Violation::Equal(severity)) => (CODE_EQUAL_STOP_TIME_DISTANCE, severity),
                };
                notices.push(pair_notice(
                    code,
                    severity,
                    ("tripId", trip_id),
                    Some(("stopId", curr.get(stop_id).to_json())),
                    "stopSequence",
                    distance,
                    sequence,
                    prev,
                    curr,
                ));
            }
        }
        Ok(())
    }
}
