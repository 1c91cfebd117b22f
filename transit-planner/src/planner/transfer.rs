//! Two-leg route search through an interchange.
//!
//! The exact variant rides real trips on both legs. The estimated variant
//! is a degraded mode: it boards a real departure but replaces both ride
//! times with figures from the timing table, and flags the result.

use std::collections::{HashMap, HashSet};
use std::slice;

use chrono::{DateTime, Duration, FixedOffset};
use tracing::{debug, trace};

use crate::domain::{
    Alert, Departure, Leg, RouteId, Stop, TransferLeg, TransitLeg, TripId, TripOption,
};
use crate::registry::{StaticNetwork, TransferStation};

use super::context::SearchContext;
use super::feed::{PredictionQuery, TransitFeed};
use super::interchange::{TransferCandidate, find_transfer_stations};
use super::ride::{
    Constraints, Ride, StopSet, prefetch_schedules, scan_trip, stop_walk_minutes,
};

/// Routes departing from the origin.
pub fn origin_routes(departures: &[Departure]) -> HashSet<RouteId> {
    departures.iter().map(|d| d.route_id.clone()).collect()
}

/// The interchange as a stop, with catalog coordinates when known.
fn station_stop(network: &StaticNetwork, station: &TransferStation) -> Stop {
    let coords = network.catalog.get(&station.id).map(|c| c.coords);
    Stop::new(station.id.clone(), station.name.clone(), coords)
}

fn minutes(m: u32) -> Duration {
    Duration::minutes(i64::from(m))
}

fn transfer_leg(station: &TransferStation) -> Leg {
    Leg::Transfer(TransferLeg {
        station_id: station.id.clone(),
        station_name: station.name.clone(),
        walk_minutes: station.walk_minutes,
    })
}

fn ride_leg(
    departure: &Departure,
    board: &Stop,
    depart_at: DateTime<FixedOffset>,
    ride: &Ride<'_, '_>,
) -> Option<TransitLeg> {
    TransitLeg::new(
        departure.route_id.clone(),
        departure.trip_id.clone(),
        board.id.clone(),
        ride.alight.stop_id.clone(),
        depart_at,
        ride.arrival,
    )
    .map_err(|e| debug!(trip = %departure.trip_id, error = %e, "Skipping ride"))
    .ok()
}

/// Find two-leg trips from `origin` to `dest_stops` using live schedules
/// for both legs.
///
/// First legs come from the first few `origin_departures`. For each one
/// that reaches an interchange, departures at the interchange leaving at
/// least the platform walk after arrival are scanned in order until a few
/// of them reach a destination.
pub async fn find_transfer_routes<F: TransitFeed>(
    ctx: &SearchContext<'_, F>,
    origin: &Stop,
    dest_stops: &[Stop],
    origin_departures: &[Departure],
    alerts: &[Alert],
    constraints: Constraints,
    schedules: &mut HashMap<TripId, Vec<Departure>>,
) -> Vec<TripOption> {
    let routes = origin_routes(origin_departures);
    let stations = find_transfer_stations(&ctx.network.transfers, &routes, dest_stops, alerts);
    if stations.is_empty() {
        debug!(origin = %origin.id, "No usable interchange");
        return Vec::new();
    }

    let first_candidates: Vec<_> = origin_departures
        .iter()
        .take(ctx.config.transfer_first_legs)
        .filter_map(|d| constraints.boarding_time(d).map(|t| (d, t)))
        .collect();
    let trips: Vec<TripId> = first_candidates.iter().map(|(d, _)| d.trip_id.clone()).collect();
    prefetch_schedules(ctx, &trips, schedules).await;

    let dest_targets = StopSet::new(dest_stops);
    let origin_walk = stop_walk_minutes(origin);
    let mut options = Vec::new();

    'stations: for TransferCandidate { station, .. } in &stations {
        if ctx.out_of_time() {
            break;
        }

        let transfer_stop = station_stop(ctx.network, station);
        let transfer_target = slice::from_ref(&transfer_stop);

        let first_legs: Vec<TransitLeg> = first_candidates
            .iter()
            .filter_map(|(departure, depart_at)| {
                let schedule = schedules.get(&departure.trip_id)?;
                let ride = scan_trip(schedule, origin, StopSet::new(transfer_target), *depart_at)?;
                ride_leg(departure, origin, *depart_at, &ride)
            })
            .collect();
        if first_legs.is_empty() {
            trace!(station = %station.id, "No first leg reaches interchange");
            continue;
        }

        let query = PredictionQuery::at(station.id.clone(), ctx.config.transfer_prediction_limit);
        let Some(onward) = ctx.predictions(&query).await.found() else {
            continue;
        };

        for first in first_legs {
            let ready = first.arrival() + minutes(station.walk_minutes);
            let after_walk = constraints.departing_after(ready);

            let second_candidates: Vec<_> = onward
                .iter()
                .filter_map(|d| after_walk.boarding_time(d).map(|t| (d, t)))
                .collect();

            let mut rides = 0;
            for batch in second_candidates.chunks(ctx.config.batch_size.max(1)) {
                if rides >= ctx.config.transfer_second_legs || ctx.out_of_time() {
                    break;
                }
                let trips: Vec<TripId> = batch.iter().map(|(d, _)| d.trip_id.clone()).collect();
                prefetch_schedules(ctx, &trips, schedules).await;

                for &(departure, depart_at) in batch {
                    let Some(schedule) = schedules.get(&departure.trip_id) else {
                        continue;
                    };
                    let Some(ride) = scan_trip(schedule, &transfer_stop, dest_targets, depart_at)
                    else {
                        continue;
                    };
                    let Some(second) = ride_leg(departure, &transfer_stop, depart_at, &ride) else {
                        continue;
                    };

                    let path = vec![
                        Leg::Transit(first.clone()),
                        transfer_leg(station),
                        Leg::Transit(second),
                    ];
                    match TripOption::new(
                        path,
                        ride.target.clone(),
                        origin_walk,
                        stop_walk_minutes(ride.target),
                    ) {
                        Ok(option) => options.push(option),
                        Err(e) => debug!(error = %e, "Skipping transfer option"),
                    }

                    if options.len() >= ctx.config.max_transfer_results {
                        break 'stations;
                    }
                    rides += 1;
                    if rides >= ctx.config.transfer_second_legs {
                        break;
                    }
                }
            }
        }
    }

    debug!(
        origin = %origin.id,
        interchanges = stations.len(),
        found = options.len(),
        "Transfer search complete"
    );

    options
}

/// Build estimated two-leg trips from fixed timing patterns.
///
/// Boards each of the first few origin departures and routes it through
/// each of the best interchanges to the nearest destination stop, adding
/// table ride times and the platform walk to the real departure time. No
/// feed calls are made.
pub fn find_estimated_routes<F: TransitFeed>(
    ctx: &SearchContext<'_, F>,
    origin: &Stop,
    dest_stops: &[Stop],
    origin_departures: &[Departure],
    alerts: &[Alert],
    constraints: Constraints,
) -> Vec<TripOption> {
    let Some(dest) = dest_stops.first() else {
        return Vec::new();
    };

    let routes = origin_routes(origin_departures);
    let stations = find_transfer_stations(&ctx.network.transfers, &routes, dest_stops, alerts);
    if stations.is_empty() {
        return Vec::new();
    }

    let dest_family = ctx
        .network
        .transfers
        .infer_routes(&dest.name)
        .first()
        .map(|r| r.family().to_string())
        .unwrap_or_default();

    let origin_walk = stop_walk_minutes(origin);
    let dest_walk = stop_walk_minutes(dest);
    let mut options = Vec::new();

    for departure in origin_departures.iter().take(ctx.config.estimated_departures) {
        let Some(depart_at) = constraints.boarding_time(departure) else {
            continue;
        };

        for candidate in stations.iter().take(ctx.config.estimated_stations) {
            let station = candidate.station;
            let estimate = ctx.network.timings.estimate(
                &departure.route_id,
                &origin.name,
                &station.name,
                &dest_family,
                &dest.name,
            );

            let at_interchange = depart_at + minutes(estimate.first_leg_minutes);
            let onward = at_interchange + minutes(station.walk_minutes);
            let arrival = onward + minutes(estimate.second_leg_minutes);

            let legs = TransitLeg::estimated(
                departure.route_id.clone(),
                Some(departure.trip_id.clone()),
                origin.id.clone(),
                station.id.clone(),
                depart_at,
                at_interchange,
            )
            .and_then(|first| {
                let second = TransitLeg::estimated(
                    estimate.second_route.clone(),
                    None,
                    station.id.clone(),
                    dest.id.clone(),
                    onward,
                    arrival,
                )?;
                Ok((first, second))
            });

            let option = legs.and_then(|(first, second)| {
                TripOption::new(
                    vec![
                        Leg::Transit(first),
                        transfer_leg(station),
                        Leg::Transit(second),
                    ],
                    dest.clone(),
                    origin_walk,
                    dest_walk,
                )
            });

            match option {
                Ok(option) => options.push(option),
                Err(e) => debug!(station = %station.id, error = %e, "Skipping estimate"),
            }
        }
    }

    options.truncate(ctx.config.max_estimated_results);

    debug!(
        origin = %origin.id,
        found = options.len(),
        "Estimated transfer search complete"
    );

    options
}
