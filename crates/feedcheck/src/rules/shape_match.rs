//! Stops of a trip must lie on, and in the order of, the trip's shape.

use std::collections::{HashMap, HashSet};

use serde_json::json;

use crate::geo::{LatLon, ShapePath};
use crate::notice::{Notice, NoticeContainer, Severity};
use crate::schema::gtfs::{SHAPES, STOPS, STOP_TIMES, TRIPS};
use crate::table::{Feed, Group, Row, TableContainer};

use super::stops::StopLocator;
use super::{Rule, RuleError, require};

const CODE_STOP_TOO_FAR_FROM_SHAPE: &str = "stop_too_far_from_shape";
const CODE_STOP_TOO_FAR_USING_USER_DISTANCE: &str = "stop_too_far_from_shape_using_user_distance";
const CODE_STOPS_OUT_OF_ORDER: &str = "stops_match_shape_out_of_order";

/// Projects every stop of a trip onto its shape.
///
/// When both the shape and the stop time carry `shape_dist_traveled`, the
/// point at that distance is compared instead of the geometric projection.
/// Trips sharing a shape and stop pattern are checked once.
#[derive(Debug, Clone)]
pub struct StopShapeMatchRule {
    max_distance_meters: f64,
}

impl StopShapeMatchRule {
    pub fn new(max_distance_meters: f64) -> Self {
        Self { max_distance_meters }
    }
}

/// Last stop matched along the path.
struct Matched<'a> {
    row: &'a Row,
    stop_id: &'a str,
    point: LatLon,
    distance_along: f64,
}

fn shape_path(shapes: &TableContainer, points: Group<'_>) -> Result<ShapePath, RuleError> {
    let lat = shapes.column("shape_pt_lat")?;
    let lon = shapes.column("shape_pt_lon")?;
    let distance = shapes.column("shape_dist_traveled")?;

    let coordinates: Vec<LatLon> = points
        .iter()
        .filter_map(|p| Some(LatLon::new(p.float(lat)?, p.float(lon)?)))
        .collect();
    let user: Option<Vec<f64>> = points.iter().map(|p| p.float(distance)).collect();

    let path = ShapePath::new(coordinates);
    Ok(match user {
        Some(user) => path.with_user_distances(user),
        None => path,
    })
}

fn lat_lon(point: LatLon) -> serde_json::Value {
    json!([point.lat, point.lon])
}

impl Rule for StopShapeMatchRule {
    fn name(&self) -> &str {
        "stop_shape_match"
    }

    fn required_tables(&self) -> Vec<&str> {
        vec![TRIPS, STOP_TIMES, STOPS, SHAPES]
    }

    fn validate(&self, feed: &Feed, notices: &mut NoticeContainer) -> Result<(), RuleError> {
        let trips = require(feed, TRIPS)?;
        let stop_times = require(feed, STOP_TIMES)?;
        let stops = require(feed, STOPS)?;
        let shapes = require(feed, SHAPES)?;
        let locator = StopLocator::new(stops)?;

        let trip_id_column = trips.column("trip_id")?;
        let shape_id_column = trips.column("shape_id")?;
        let stop_id_column = stop_times.column("stop_id")?;
        let distance_column = stop_times.column("shape_dist_traveled")?;
        let stop_name = stops.column("stop_name")?;
        let name_of = |stop_id: &str| {
            stops
                .by_key(&[stop_id])
                .and_then(|s| s.text(stop_name))
                .unwrap_or_default()
                .to_string()
        };

        let mut paths: HashMap<&str, ShapePath> = HashMap::new();
        let mut seen_patterns: HashSet<String> = HashSet::new();

        for trip in trips.all() {
            let (Some(trip_id), Some(shape_id)) = (trip.text(trip_id_column), trip.text(shape_id_column))
            else {
                continue;
            };
            let points = shapes.by_group(shape_id);
            let trip_stops = stop_times.by_group(trip_id);
            if points.is_empty() || trip_stops.is_empty() {
                continue;
            }

            let mut pattern = shape_id.to_string();
            for st in trip_stops.iter() {
                pattern.push('\u{1f}');
                pattern.push_str(st.text(stop_id_column).unwrap_or_default());
                pattern.push('@');
                pattern.push_str(&st.get(distance_column).to_string());
            }
            if !seen_patterns.insert(pattern) {
                continue;
            }

            if !paths.contains_key(shape_id) {
                paths.insert(shape_id, shape_path(shapes, points)?);
            }
            let Some(path) = paths.get(shape_id) else {
                continue;
            };
            if path.is_empty() {
                continue;
            }

            let too_far = |code: &str, st: &Row, stop_id: &str, point: LatLon, distance: f64| {
                Notice::new(code, Severity::Warning)
                    .with_field("tripCsvRowNumber", trip.csv_row_number())
                    .with_field("shapeId", shape_id)
                    .with_field("stopTimeCsvRowNumber", st.csv_row_number())
                    .with_field("stopId", stop_id)
                    .with_field("stopName", name_of(stop_id))
                    .with_field("match", lat_lon(point))
                    .with_field("geoDistanceToShape", distance)
            };

            let mut previous: Option<Matched<'_>> = None;
            for st in trip_stops.iter() {
                let Some(stop_id) = st.text(stop_id_column) else {
                    continue;
                };
                let Some(location) = locator.locate(stop_id) else {
                    continue;
                };

                let user_point = st
                    .float(distance_column)
                    .and_then(|d| path.point_at_user_distance(d));
                if let Some(point) = user_point {
                    let distance = location.distance_meters(&point);
                    if distance > self.max_distance_meters {
                        notices.push(too_far(
                            CODE_STOP_TOO_FAR_USING_USER_DISTANCE,
                            st,
                            stop_id,
                            point,
                            distance,
                        ));
                    }
                    continue;
                }

                let Some(projection) = path.project(location) else {
                    continue;
                };
                if projection.distance_to_path > self.max_distance_meters {
                    notices.push(too_far(
                        CODE_STOP_TOO_FAR_FROM_SHAPE,
                        st,
                        stop_id,
                        projection.point,
                        projection.distance_to_path,
                    ));
                    continue;
                }

                if let Some(prev) = &previous {
                    if projection.distance_along + self.max_distance_meters < prev.distance_along {
                        notices.push(
                            Notice::new(CODE_STOPS_OUT_OF_ORDER, Severity::Warning)
                                .with_field("tripCsvRowNumber", trip.csv_row_number())
                                .with_field("shapeId", shape_id)
                                .with_field("tripId", trip_id)
                                .with_field("stopTimeCsvRowNumber1", prev.row.csv_row_number())
                                .with_field("stopId1", prev.stop_id)
                                .with_field("stopName1", name_of(prev.stop_id))
                                .with_field("match1", lat_lon(prev.point))
                                .with_field("stopTimeCsvRowNumber2", st.csv_row_number())
                                .with_field("stopId2", stop_id)
                                .with_field("stopName2", name_of(stop_id))
                                .with_field("match2", lat_lon(projection.point)),
                        );
                    }
                }
                previous = Some(Matched {
                    row: st,
                    stop_id,
                    point: projection.point,
                    distance_along: projection.distance_along,
                });
            }
        }
        Ok(())
    }
}
