//! Run configuration and the tuning constants used by rules.

use serde::{Deserialize, Serialize};

use crate::error::{FeedCheckError, Result};
use crate::notice::DEFAULT_MAX_NOTICES_PER_CODE;

/// Consecutive shape points with equal distance are "close" under this.
pub const SHAPE_POINT_CLOSENESS_METERS: f64 = 1.11;
/// Consecutive stops with equal distance are "close" under this.
pub const STOP_TIME_CLOSENESS_METERS: f64 = 1.0;
/// A stop farther than this from its trip's shape is reported.
pub const STOP_TO_SHAPE_MAX_METERS: f64 = 100.0;
/// Timed stops farther apart than this are checked for plausible speed.
pub const FAR_STOPS_DISTANCE_KM: f64 = 10.0;
/// Elapsed times shorter than this are rounded up before computing speed.
pub const MIN_TRAVEL_SECONDS: u32 = 60;

/// Configuration for a validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedCheckConfig {
    /// Notices kept per code; totals are always exact.
    pub max_notices_per_code: usize,
    /// Worker threads for rule execution (None = rayon default).
    pub threads: Option<usize>,
    /// Run rules concurrently.
    pub parallel: bool,
    /// Maximum rows read per file (None = all).
    pub max_rows: Option<usize>,
    pub thresholds: Thresholds,
}

impl Default for FeedCheckConfig {
    fn default() -> Self {
        Self {
            max_notices_per_code: DEFAULT_MAX_NOTICES_PER_CODE,
            threads: None,
            parallel: true,
            max_rows: None,
            thresholds: Thresholds::default(),
        }
    }
}

impl FeedCheckConfig {
    /// Parse a JSON config. Missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.check()?;
        Ok(config)
    }

    pub(crate) fn check(&self) -> Result<()> {
        if self.max_notices_per_code == 0 {
            return Err(FeedCheckError::Config(
                "max_notices_per_code must be at least 1".to_string(),
            ));
        }
        if self.threads == Some(0) {
            return Err(FeedCheckError::Config("threads must be at least 1".to_string()));
        }
        let t = &self.thresholds;
        if t.min_travel_seconds == 0 {
            return Err(FeedCheckError::Config(
                "min_travel_seconds must be at least 1".to_string(),
            ));
        }
        let distances = [
            ("shape_point_closeness_meters", t.shape_point_closeness_meters),
            ("stop_time_closeness_meters", t.stop_time_closeness_meters),
            ("stop_to_shape_max_meters", t.stop_to_shape_max_meters),
            ("far_stops_distance_km", t.far_stops_distance_km),
        ];
        for (name, value) in distances {
            if !value.is_finite() || value < 0.0 {
                return Err(FeedCheckError::Config(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Empirically chosen limits that decide when a rule reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub shape_point_closeness_meters: f64,
    pub stop_time_closeness_meters: f64,
    pub stop_to_shape_max_meters: f64,
    pub far_stops_distance_km: f64,
    pub min_travel_seconds: u32,
    pub max_speed_kph: SpeedLimits,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            shape_point_closeness_meters: SHAPE_POINT_CLOSENESS_METERS,
            stop_time_closeness_meters: STOP_TIME_CLOSENESS_METERS,
            stop_to_shape_max_meters: STOP_TO_SHAPE_MAX_METERS,
            far_stops_distance_km: FAR_STOPS_DISTANCE_KM,
            min_travel_seconds: MIN_TRAVEL_SECONDS,
            max_speed_kph: SpeedLimits::default(),
        }
    }
}

/// Highest plausible speed per route type, km/h.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedLimits {
    pub tram: f64,
    pub subway: f64,
    pub rail: f64,
    pub bus: f64,
    pub ferry: f64,
    pub cable_tram: f64,
    pub aerial_lift: f64,
    pub funicular: f64,
    pub trolleybus: f64,
    pub monorail: f64,
    /// Used when the route type is missing or unrecognized.
    pub unknown: f64,
}

impl Default for SpeedLimits {
    fn default() -> Self {
        Self {
            tram: 100.0,
            subway: 150.0,
            rail: 500.0,
            bus: 150.0,
            ferry: 80.0,
            cable_tram: 30.0,
            aerial_lift: 50.0,
            funicular: 50.0,
            trolleybus: 150.0,
            monorail: 150.0,
            unknown: 200.0,
        }
    }
}

impl SpeedLimits {
    /// Limit for a GTFS `route_type` code.
    pub fn for_route_type(&self, route_type: Option<i64>) -> f64 {
        match route_type {
            Some(0) => self.tram,
            Some(1) => self.subway,
            Some(2) => self.rail,
            Some(3) => self.bus,
            Some(4) => self.ferry,
            Some(5) => self.cable_tram,
            Some(6) => self.aerial_lift,
            Some(7) => self.funicular,
            Some(11) => self.trolleybus,
            Some(12) => self.monorail,
            _ => self.unknown,
        }
    }
}
