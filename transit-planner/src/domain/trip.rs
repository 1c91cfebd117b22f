//! Trip option: one complete itinerary from origin to destination.

use chrono::{DateTime, FixedOffset};

use super::{DomainError, Leg, Stop, TransitLeg, minutes_between};

/// A computed itinerary.
///
/// # Invariants
///
/// - The route path starts and ends with a transit leg, and transfer legs
///   only appear between transit legs
/// - `num_transfers` is the number of transit legs minus one
/// - `transit_time_minutes` spans first departure to final arrival
/// - `total_time_minutes == origin_walk_minutes + transit_time_minutes + dest_walk_minutes`
#[derive(Debug, Clone, PartialEq)]
pub struct TripOption {
    route_path: Vec<Leg>,
    final_stop: Stop,
    transit_time_minutes: i64,
    num_transfers: usize,
    arrival_time: DateTime<FixedOffset>,
    origin_walk_minutes: u32,
    dest_walk_minutes: u32,
    total_time_minutes: i64,
    estimated: bool,
}

impl TripOption {
    /// Construct a trip option, deriving the times and transfer count from
    /// the route path.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the path is empty, does not start and end with a
    /// ride, has two walks in a row, or goes backwards in time.
    pub fn new(
        route_path: Vec<Leg>,
        final_stop: Stop,
        origin_walk_minutes: u32,
        dest_walk_minutes: u32,
    ) -> Result<Self, DomainError> {
        let (first, last) = match (route_path.first(), route_path.last()) {
            (Some(Leg::Transit(first)), Some(Leg::Transit(last))) => (first, last),
            (None, _) => return Err(DomainError::EmptyItinerary),
            _ => {
                return Err(DomainError::InvalidPath(
                    "route path must start and end with a ride",
                ));
            }
        };

        if route_path
            .windows(2)
            .any(|w| !w[0].is_transit() && !w[1].is_transit())
        {
            return Err(DomainError::InvalidPath("consecutive transfer legs"));
        }

        let rides: Vec<&TransitLeg> = route_path.iter().filter_map(Leg::as_transit).collect();
        if rides.windows(2).any(|w| w[1].departure() < w[0].arrival()) {
            return Err(DomainError::InvalidPath(
                "ride departs before the previous ride arrives",
            ));
        }

        let transit_time_minutes = minutes_between(first.departure(), last.arrival());
        let arrival_time = last.arrival();
        let num_transfers = rides.len() - 1;
        let estimated = rides.iter().any(|r| r.is_estimated());
        let total_time_minutes =
            i64::from(origin_walk_minutes) + transit_time_minutes + i64::from(dest_walk_minutes);

        Ok(Self {
            route_path,
            final_stop,
            transit_time_minutes,
            num_transfers,
            arrival_time,
            origin_walk_minutes,
            dest_walk_minutes,
            total_time_minutes,
            estimated,
        })
    }

    pub fn route_path(&self) -> &[Leg] {
        &self.route_path
    }

    /// The rides in this itinerary, in order.
    pub fn transit_legs(&self) -> impl Iterator<Item = &TransitLeg> {
        self.route_path.iter().filter_map(Leg::as_transit)
    }

    pub fn final_stop(&self) -> &Stop {
        &self.final_stop
    }

    pub fn transit_time_minutes(&self) -> i64 {
        self.transit_time_minutes
    }

    pub fn num_transfers(&self) -> usize {
        self.num_transfers
    }

    pub fn arrival_time(&self) -> DateTime<FixedOffset> {
        self.arrival_time
    }

    /// Departure of the first ride.
    pub fn departure_time(&self) -> DateTime<FixedOffset> {
        self.transit_legs()
            .next()
            .map(TransitLeg::departure)
            .unwrap_or(self.arrival_time)
    }

    pub fn origin_walk_minutes(&self) -> u32 {
        self.origin_walk_minutes
    }

    pub fn dest_walk_minutes(&self) -> u32 {
        self.dest_walk_minutes
    }

    pub fn total_time_minutes(&self) -> i64 {
        self.total_time_minutes
    }

    /// Returns true if any ride uses estimated timings.
    pub fn is_estimated(&self) -> bool {
        self.estimated
    }

    /// Returns true if the final stop is one of `stops`.
    pub fn ends_at_any(&self, stops: &[Stop]) -> bool {
        stops.iter().any(|s| s.id == self.final_stop.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RouteId, StopId, TransferLeg, TripId};

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn stop(id: &str) -> Stop {
        Stop::new(StopId::parse(id).unwrap(), id, None)
    }

    fn ride(route: &str, from: &str, to: &str, dep: &str, arr: &str) -> Leg {
        Leg::Transit(
            TransitLeg::new(
                RouteId::parse(route).unwrap(),
                TripId::parse(&format!("{route}-{dep}")).unwrap(),
                StopId::parse(from).unwrap(),
                StopId::parse(to).unwrap(),
                at(&format!("2025-01-10T{dep}:00-05:00")),
                at(&format!("2025-01-10T{arr}:00-05:00")),
            )
            .unwrap(),
        )
    }

    fn walk(station: &str, mins: u32) -> Leg {
        Leg::Transfer(TransferLeg {
            station_id: StopId::parse(station).unwrap(),
            station_name: station.into(),
            walk_minutes: mins,
        })
    }

    #[test]
    fn direct_trip() {
        let trip = TripOption::new(
            vec![ride("Red", "a", "b", "08:00", "08:12")],
            stop("b"),
            4,
            3,
        )
        .unwrap();

        assert_eq!(trip.num_transfers(), 0);
        assert_eq!(trip.transit_time_minutes(), 12);
        assert_eq!(trip.total_time_minutes(), 19);
        assert_eq!(trip.arrival_time(), at("2025-01-10T08:12:00-05:00"));
        assert_eq!(trip.departure_time(), at("2025-01-10T08:00:00-05:00"));
        assert!(!trip.is_estimated());
    }

    #[test]
    fn transfer_trip_counts_wait() {
        let trip = TripOption::new(
            vec![
                ride("Red", "a", "x", "08:00", "08:06"),
                walk("x", 3),
                ride("Green-B", "x", "b", "08:15", "08:20"),
            ],
            stop("b"),
            1,
            1,
        )
        .unwrap();

        assert_eq!(trip.num_transfers(), 1);
        assert_eq!(trip.transit_time_minutes(), 20);
        assert_eq!(
            trip.total_time_minutes(),
            i64::from(trip.origin_walk_minutes())
                + trip.transit_time_minutes()
                + i64::from(trip.dest_walk_minutes())
        );
        assert_eq!(trip.transit_legs().count(), 2);
    }

    #[test]
    fn rejects_bad_paths() {
        assert!(matches!(
            TripOption::new(vec![], stop("b"), 1, 1),
            Err(DomainError::EmptyItinerary)
        ));
        assert!(TripOption::new(vec![walk("x", 2)], stop("b"), 1, 1).is_err());
        assert!(
            TripOption::new(
                vec![ride("Red", "a", "x", "08:00", "08:06"), walk("x", 2)],
                stop("b"),
                1,
                1
            )
            .is_err()
        );
        assert!(
            TripOption::new(
                vec![
                    ride("Red", "a", "x", "08:00", "08:06"),
                    walk("x", 2),
                    walk("x", 2),
                    ride("Green-B", "x", "b", "08:15", "08:20"),
                ],
                stop("b"),
                1,
                1
            )
            .is_err()
        );
    }

    #[test]
    fn rejects_overlapping_rides() {
        let result = TripOption::new(
            vec![
                ride("Red", "a", "x", "08:00", "08:10"),
                ride("Green-B", "x", "b", "08:05", "08:20"),
            ],
            stop("b"),
            1,
            1,
        );
        assert!(result.is_err());
    }

    #[test]
    fn ends_at_any() {
        let trip = TripOption::new(
            vec![ride("Red", "a", "b", "08:00", "08:12")],
            stop("b"),
            1,
            1,
        )
        .unwrap();
        assert!(trip.ends_at_any(&[stop("c"), stop("b")]));
        assert!(!trip.ends_at_any(&[stop("c")]));
    }
}
