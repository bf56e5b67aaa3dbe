//! Great-circle distances and projection of points onto shape paths.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used for every distance, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_010.0;

/// A WGS84 coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Great-circle distance to `other`, in meters.
    pub fn distance_meters(&self, other: &LatLon) -> f64 {
        haversine_meters(*self, *other)
    }

    /// Whether `other` lies within `threshold_meters` of this point.
    pub fn is_close(&self, other: &LatLon, threshold_meters: f64) -> bool {
        self.distance_meters(other) < threshold_meters
    }
}

/// Haversine distance between two coordinates, in meters.
pub fn haversine_meters(a: LatLon, b: LatLon) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_METERS * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Where a point falls relative to a path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Closest point on the path.
    pub point: LatLon,
    /// Distance from the projected point to the path, meters.
    pub distance_to_path: f64,
    /// Distance along the path to the closest point, meters.
    pub distance_along: f64,
    /// Index of the segment holding the closest point.
    pub segment: usize,
}

/// An ordered polyline with cumulative geodesic lengths.
#[derive(Debug, Clone, Default)]
pub struct ShapePath {
    points: Vec<LatLon>,
    cumulative: Vec<f64>,
    user_distances: Option<Vec<f64>>,
}

impl ShapePath {
    pub fn new(points: Vec<LatLon>) -> Self {
        let mut cumulative = Vec::with_capacity(points.len());
        let mut total = 0.0;
        for (i, point) in points.iter().enumerate() {
            if i > 0 {
                total += points[i - 1].distance_meters(point);
            }
            cumulative.push(total);
        }
        Self {
            points,
            cumulative,
            user_distances: None,
        }
    }

    /// Attach the feed's own distance measure, one value per point.
    ///
    /// Ignored unless it has one value per point and never decreases.
    pub fn with_user_distances(mut self, distances: Vec<f64>) -> Self {
        let usable =
            distances.len() == self.points.len() && distances.windows(2).all(|w| w[0] <= w[1]);
        self.user_distances = usable.then_some(distances);
        self
    }

    pub fn points(&self) -> &[LatLon] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn has_user_distances(&self) -> bool {
        self.user_distances.is_some()
    }

    /// Geodesic length of the whole path, meters.
    pub fn length_meters(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Project `point` onto the closest segment of the path.
    pub fn project(&self, point: LatLon) -> Option<Projection> {
        self.project_from(point, 0)
    }

    /// Project `point` considering only segments from `first_segment` on.
    pub fn project_from(&self, point: LatLon, first_segment: usize) -> Option<Projection> {
        match self.points.len() {
            0 => None,
            1 => Some(Projection {
                point: self.points[0],
                distance_to_path: point.distance_meters(&self.points[0]),
                distance_along: 0.0,
                segment: 0,
            }),
            n => (first_segment.min(n - 2)..n - 1)
                .map(|i| self.project_on_segment(point, i))
                .min_by(|a, b| a.distance_to_path.total_cmp(&b.distance_to_path)),
        }
    }

    fn project_on_segment(&self, point: LatLon, i: usize) -> Projection {
        let a = self.points[i];
        let b = self.points[i + 1];

        // Local equirectangular frame around the segment start.
        let scale = a.lat.to_radians().cos();
        let (bx, by) = ((b.lon - a.lon) * scale, b.lat - a.lat);
        let (px, py) = ((point.lon - a.lon) * scale, point.lat - a.lat);
        let len2 = bx * bx + by * by;
        let t = if len2 > 0.0 {
            ((px * bx + py * by) / len2).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let closest = LatLon::new(a.lat + t * (b.lat - a.lat), a.lon + t * (b.lon - a.lon));
        Projection {
            point: closest,
            distance_to_path: point.distance_meters(&closest),
            distance_along: self.cumulative[i] + a.distance_meters(&closest),
            segment: i,
        }
    }

    /// Point at `distance` measured in the feed's own distance units.
    ///
    /// `None` without user distances or when `distance` is outside the
    /// measured range.
    pub fn point_at_user_distance(&self, distance: f64) -> Option<LatLon> {
        let measures = self.user_distances.as_ref()?;
        let first = *measures.first()?;
        let last = *measures.last()?;
        if distance < first || distance > last {
            return None;
        }
        // First index whose measure is >= distance.
        let upper = measures.partition_point(|&m| m < distance);
        if upper == 0 {
            return Some(self.points[0]);
        }
        let (lo, hi) = (measures[upper - 1], measures[upper]);
        let t = if hi > lo { (distance - lo) / (hi - lo) } else { 0.0 };
        let a = self.points[upper - 1];
        let b = self.points[upper];
        Some(LatLon::new(a.lat + t * (b.lat - a.lat), a.lon + t * (b.lon - a.lon)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_one_degree_of_latitude() {
        let d = haversine_meters(LatLon::new(0.0, 0.0), LatLon::new(1.0, 0.0));
        assert!((d - 111_195.08).abs() < 0.1, "{d}");
        assert_eq!(haversine_meters(LatLon::new(45.0, 7.0), LatLon::new(45.0, 7.0)), 0.0);
    }

    #[test]
    fn test_is_close_uses_threshold() {
        let a = LatLon::new(45.0, 7.0);
        // About 1.11 m north.
        let b = LatLon::new(45.00001, 7.0);
        assert!(a.is_close(&b, 1.2));
        assert!(!a.is_close(&b, 1.0));
    }

    #[test]
    fn test_projection_onto_straight_path() {
        let path = ShapePath::new(vec![
            LatLon::new(0.0, 0.0),
            LatLon::new(0.0, 0.01),
            LatLon::new(0.0, 0.02),
        ]);
        let projection = path.project(LatLon::new(0.001, 0.015)).unwrap();
        assert_eq!(projection.segment, 1);
        assert!((projection.distance_to_path - 111.2).abs() < 0.5);
        assert!((projection.distance_along - 1_667.9).abs() < 1.0);
        assert!((path.length_meters() - 2_223.9).abs() < 1.0);
    }

    #[test]
    fn test_projection_clamps_to_endpoints() {
        let path = ShapePath::new(vec![LatLon::new(0.0, 0.0), LatLon::new(0.0, 0.01)]);
        let before = path.project(LatLon::new(0.0, -0.01)).unwrap();
        assert_eq!(before.distance_along, 0.0);
        assert_eq!(before.point, LatLon::new(0.0, 0.0));
        assert!(ShapePath::default().project(LatLon::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn test_point_at_user_distance() {
        let path = ShapePath::new(vec![
            LatLon::new(0.0, 0.0),
            LatLon::new(0.0, 1.0),
            LatLon::new(1.0, 1.0),
        ])
        .with_user_distances(vec![0.0, 10.0, 20.0]);

        assert_eq!(path.point_at_user_distance(5.0), Some(LatLon::new(0.0, 0.5)));
        assert_eq!(path.point_at_user_distance(15.0), Some(LatLon::new(0.5, 1.0)));
        assert_eq!(path.point_at_user_distance(0.0), Some(LatLon::new(0.0, 0.0)));
        assert_eq!(path.point_at_user_distance(25.0), None);

        let unusable = ShapePath::new(vec![LatLon::new(0.0, 0.0)]).with_user_distances(vec![1.0, 2.0]);
        assert!(!unusable.has_user_distances());
    }
}
