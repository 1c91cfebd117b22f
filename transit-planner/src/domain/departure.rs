//! Departures: predictions and schedule entries.

use chrono::{DateTime, FixedOffset};

use super::{RouteId, StopId, TripId};

/// A single prediction or schedule entry for a trip at a stop.
///
/// The feed fills either or both times; the first stop of a trip has no
/// arrival and the last has no departure.
#[derive(Debug, Clone, PartialEq)]
pub struct Departure {
    pub stop_id: StopId,
    /// Parent station of `stop_id`, when the feed included it.
    pub parent_station: Option<StopId>,
    pub route_id: RouteId,
    pub trip_id: TripId,
    pub departure_time: Option<DateTime<FixedOffset>>,
    pub arrival_time: Option<DateTime<FixedOffset>>,
    pub wheelchair_accessible: bool,
}

impl Departure {
    /// Departure time, falling back to arrival time.
    pub fn best_time(&self) -> Option<DateTime<FixedOffset>> {
        self.departure_time.or(self.arrival_time)
    }

    /// Arrival time, falling back to departure time.
    pub fn best_arrival(&self) -> Option<DateTime<FixedOffset>> {
        self.arrival_time.or(self.departure_time)
    }

    /// Returns true if this entry is at `id`, either the platform itself
    /// or its parent station.
    pub fn is_at(&self, id: &StopId) -> bool {
        &self.stop_id == id || self.parent_station.as_ref() == Some(id)
    }
}
