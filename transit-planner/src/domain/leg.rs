//! Itinerary legs.
//!
//! A route path is an ordered sequence of legs: rides on a vehicle
//! ([`TransitLeg`]) separated by walks between platforms ([`TransferLeg`]).

use chrono::{DateTime, FixedOffset};

use super::{DomainError, RouteId, StopId, TripId, minutes_between};

/// A ride on one trip from a boarding stop to an alighting stop.
///
/// # Invariants
///
/// - `arrival > departure`
#[derive(Debug, Clone, PartialEq)]
pub struct TransitLeg {
    route_id: RouteId,
    trip_id: Option<TripId>,
    board_stop: StopId,
    alight_stop: StopId,
    departure: DateTime<FixedOffset>,
    arrival: DateTime<FixedOffset>,
    estimated: bool,
}

impl TransitLeg {
    /// Construct a leg from live data.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the arrival is not after the departure.
    pub fn new(
        route_id: RouteId,
        trip_id: TripId,
        board_stop: StopId,
        alight_stop: StopId,
        departure: DateTime<FixedOffset>,
        arrival: DateTime<FixedOffset>,
    ) -> Result<Self, DomainError> {
        Self::build(
            route_id,
            Some(trip_id),
            board_stop,
            alight_stop,
            departure,
            arrival,
            false,
        )
    }

    /// Construct a leg whose times come from a fixed timing estimate rather
    /// than a schedule. The trip is unknown when the leg was never looked up.
    pub fn estimated(
        route_id: RouteId,
        trip_id: Option<TripId>,
        board_stop: StopId,
        alight_stop: StopId,
        departure: DateTime<FixedOffset>,
        arrival: DateTime<FixedOffset>,
    ) -> Result<Self, DomainError> {
        Self::build(
            route_id,
            trip_id,
            board_stop,
            alight_stop,
            departure,
            arrival,
            true,
        )
    }

    fn build(
        route_id: RouteId,
        trip_id: Option<TripId>,
        board_stop: StopId,
        alight_stop: StopId,
        departure: DateTime<FixedOffset>,
        arrival: DateTime<FixedOffset>,
        estimated: bool,
    ) -> Result<Self, DomainError> {
        if arrival <= departure {
            return Err(DomainError::InvalidLeg("arrival must be after departure"));
        }
        Ok(Self {
            route_id,
            trip_id,
            board_stop,
            alight_stop,
            departure,
            arrival,
            estimated,
        })
    }

    pub fn route_id(&self) -> &RouteId {
        &self.route_id
    }

    pub fn trip_id(&self) -> Option<&TripId> {
        self.trip_id.as_ref()
    }

    pub fn board_stop(&self) -> &StopId {
        &self.board_stop
    }

    pub fn alight_stop(&self) -> &StopId {
        &self.alight_stop
    }

    pub fn departure(&self) -> DateTime<FixedOffset> {
        self.departure
    }

    pub fn arrival(&self) -> DateTime<FixedOffset> {
        self.arrival
    }

    /// Returns true if the times are a heuristic estimate.
    pub fn is_estimated(&self) -> bool {
        self.estimated
    }

    /// Ride time in whole minutes.
    pub fn minutes(&self) -> i64 {
        minutes_between(self.departure, self.arrival)
    }
}

/// A walk between platforms at an interchange station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferLeg {
    pub station_id: StopId,
    pub station_name: String,
    pub walk_minutes: u32,
}

/// One segment of an itinerary.
#[derive(Debug, Clone, PartialEq)]
pub enum Leg {
    Transit(TransitLeg),
    Transfer(TransferLeg),
}

impl Leg {
    /// Returns the transit leg if this is a ride.
    pub fn as_transit(&self) -> Option<&TransitLeg> {
        match self {
            Leg::Transit(leg) => Some(leg),
            Leg::Transfer(_) => None,
        }
    }

    /// Returns the transfer leg if this is a walk.
    pub fn as_transfer(&self) -> Option<&TransferLeg> {
        match self {
            Leg::Transit(_) => None,
            Leg::Transfer(walk) => Some(walk),
        }
    }

    pub fn is_transit(&self) -> bool {
        matches!(self, Leg::Transit(_))
    }
}
