//! Direct (no-transfer) route search.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::domain::{Departure, Leg, Stop, TransitLeg, TripId, TripOption};

use super::context::SearchContext;
use super::feed::TransitFeed;
use super::ride::{Constraints, StopSet, prefetch_schedules, scan_trip, stop_walk_minutes};

/// Find single-ride trips from `origin` to any of `dest_stops`.
///
/// Looks at the first few `origin_departures` that satisfy `constraints`,
/// and for each one scans its trip for the first destination stop. At most
/// one option per departure.
pub async fn find_direct_routes<F: TransitFeed>(
    ctx: &SearchContext<'_, F>,
    origin: &Stop,
    dest_stops: &[Stop],
    origin_departures: &[Departure],
    constraints: Constraints,
    schedules: &mut HashMap<TripId, Vec<Departure>>,
) -> Vec<TripOption> {
    let candidates: Vec<_> = origin_departures
        .iter()
        .take(ctx.config.direct_departures)
        .filter_map(|d| constraints.boarding_time(d).map(|t| (d, t)))
        .collect();

    let trips: Vec<TripId> = candidates.iter().map(|(d, _)| d.trip_id.clone()).collect();
    prefetch_schedules(ctx, &trips, schedules).await;

    let targets = StopSet::new(dest_stops);
    let origin_walk = stop_walk_minutes(origin);
    let mut options = Vec::new();

    for (departure, depart_at) in candidates {
        let Some(schedule) = schedules.get(&departure.trip_id) else {
            continue;
        };
        let Some(ride) = scan_trip(schedule, origin, targets, depart_at) else {
            trace!(trip = %departure.trip_id, "Trip does not reach destination");
            continue;
        };

        let leg = match TransitLeg::new(
            departure.route_id.clone(),
            departure.trip_id.clone(),
            origin.id.clone(),
            ride.alight.stop_id.clone(),
            depart_at,
            ride.arrival,
        ) {
            Ok(l) => l,
            Err(e) => {
                debug!(trip = %departure.trip_id, error = %e, "Skipping direct ride");
                continue;
            }
        };

        match TripOption::new(
            vec![Leg::Transit(leg)],
            ride.target.clone(),
            origin_walk,
            stop_walk_minutes(ride.target),
        ) {
            Ok(option) => options.push(option),
            Err(e) => debug!(error = %e, "Skipping direct option"),
        }

        if options.len() >= ctx.config.max_direct_results {
            break;
        }
    }

    debug!(
        origin = %origin.id,
        found = options.len(),
        "Direct search complete"
    );

    options
}
