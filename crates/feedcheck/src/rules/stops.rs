//! Stop coordinate lookup shared by the geometric rules.

use crate::geo::LatLon;
use crate::table::{Column, TableContainer};

use super::RuleError;

/// Parent stations are followed at most this many levels up.
const MAX_PARENT_DEPTH: usize = 3;

/// Resolves a stop id to coordinates, falling back to parent stations.
pub(crate) struct StopLocator<'a> {
    stops: &'a TableContainer,
    lat: Column,
    lon: Column,
    parent: Column,
}

impl<'a> StopLocator<'a> {
    pub(crate) fn new(stops: &'a TableContainer) -> Result<Self, RuleError> {
        Ok(Self {
            stops,
            lat: stops.column("stop_lat")?,
            lon: stops.column("stop_lon")?,
            parent: stops.column("parent_station")?,
        })
    }

    pub(crate) fn locate(&self, stop_id: &str) -> Option<LatLon> {
        let mut id = stop_id;
        for _ in 0..=MAX_PARENT_DEPTH {
            let stop = self.stops.by_key(&[id])?;
            if let (Some(lat), Some(lon)) = (stop.float(self.lat), stop.float(self.lon)) {
                return Some(LatLon::new(lat, lon));
            }
            id = stop.text(self.parent)?;
        }
        None
    }
}
