//! Riding one trip between two stops.
//!
//! Every search stage answers the same question: "if I board this
//! departure here, where does its trip reach one of those stops?" The
//! answer comes from the trip's schedule, scanned forward from the boarding
//! position.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};
use futures::future::join_all;
use tracing::debug;

use crate::domain::{Departure, Stop, StopId, TripId};
use crate::geo;

use super::context::SearchContext;
use super::feed::{PredictionQuery, TransitFeed};

/// Per-request boarding constraints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraints {
    /// Nothing departs before this.
    pub not_before: DateTime<FixedOffset>,
    pub wheelchair: bool,
}

impl Constraints {
    /// When `departure` can be boarded, if it can.
    pub fn boarding_time(&self, departure: &Departure) -> Option<DateTime<FixedOffset>> {
        if self.wheelchair && !departure.wheelchair_accessible {
            return None;
        }
        let at = departure.best_time()?;
        (at >= self.not_before).then_some(at)
    }

    /// The same constraints with a later earliest departure.
    pub fn departing_after(self, at: DateTime<FixedOffset>) -> Self {
        Self {
            not_before: at,
            ..self
        }
    }
}

/// Returns true if the schedule entry is at `stop`: the same platform, or
/// either side's parent station.
pub fn at_stop(entry: &Departure, stop: &Stop) -> bool {
    entry.is_at(&stop.id)
        || stop.matches(&entry.stop_id)
        || (stop.parent_station.is_some() && entry.parent_station == stop.parent_station)
}

/// A set of target stops.
#[derive(Debug, Clone, Copy)]
pub struct StopSet<'a> {
    stops: &'a [Stop],
}

impl<'a> StopSet<'a> {
    pub fn new(stops: &'a [Stop]) -> Self {
        Self { stops }
    }

    /// The target stop `entry` is at, if any.
    pub fn find(&self, entry: &Departure) -> Option<&'a Stop> {
        self.stops.iter().find(|s| at_stop(entry, s))
    }

    pub fn stops(&self) -> &'a [Stop] {
        self.stops
    }
}

/// Where a boarded trip first reaches a target.
#[derive(Debug, Clone, Copy)]
pub struct Ride<'s, 't> {
    pub board_index: usize,
    pub alight_index: usize,
    pub alight: &'s Departure,
    pub arrival: DateTime<FixedOffset>,
    pub target: &'t Stop,
}

/// Scan `schedule` forward from where it visits `origin` for the first
/// target stop reached after `depart_at`.
///
/// Returns `None` if the trip never visits `origin`, or visits no target
/// afterwards.
pub fn scan_trip<'s, 't>(
    schedule: &'s [Departure],
    origin: &Stop,
    targets: StopSet<'t>,
    depart_at: DateTime<FixedOffset>,
) -> Option<Ride<'s, 't>> {
    let board_index = schedule.iter().position(|e| at_stop(e, origin))?;

    schedule
        .iter()
        .enumerate()
        .skip(board_index + 1)
        .find_map(|(alight_index, entry)| {
            let target = targets.find(entry)?;
            let arrival = entry.best_arrival().filter(|t| *t > depart_at)?;
            Some(Ride {
                board_index,
                alight_index,
                alight: entry,
                arrival,
                target,
            })
        })
}

/// Walking minutes to or from a located stop. Stops without a distance
/// annotation are treated as zero distance away.
pub fn stop_walk_minutes(stop: &Stop) -> u32 {
    geo::walk_minutes(stop.distance_km.unwrap_or(0.0))
}

/// Fetch schedules for `trips` not already in `cache`, `batch_size` at a
/// time. Failed or empty fetches are cached as empty so they are not
/// retried within the request.
pub async fn prefetch_schedules<F: TransitFeed>(
    ctx: &SearchContext<'_, F>,
    trips: &[TripId],
    cache: &mut HashMap<TripId, Vec<Departure>>,
) {
    let missing: Vec<&TripId> = trips.iter().filter(|t| !cache.contains_key(*t)).collect();
    if missing.is_empty() {
        return;
    }

    for batch in missing.chunks(ctx.config.batch_size.max(1)) {
        if ctx.out_of_time() {
            break;
        }
        let futures: Vec<_> = batch
            .iter()
            .map(|trip| async move {
                let schedule = ctx.trip_schedule(trip).await.found().unwrap_or_default();
                ((*trip).clone(), schedule)
            })
            .collect();

        for (trip, schedule) in join_all(futures).await {
            cache.insert(trip, schedule);
        }
    }

    debug!(trips = missing.len(), "Prefetched trip schedules");
}

/// Fetch predictions at `stops` not already in `cache`, `batch_size` at a
/// time. Failures are cached as empty.
pub async fn prefetch_predictions<F: TransitFeed>(
    ctx: &SearchContext<'_, F>,
    stops: &[StopId],
    limit: usize,
    cache: &mut HashMap<StopId, Vec<Departure>>,
) {
    let missing: Vec<&StopId> = stops.iter().filter(|s| !cache.contains_key(*s)).collect();
    if missing.is_empty() {
        return;
    }

    for batch in missing.chunks(ctx.config.batch_size.max(1)) {
        if ctx.out_of_time() {
            break;
        }
        let futures: Vec<_> = batch
            .iter()
            .map(|stop| async move {
                let query = PredictionQuery::at((*stop).clone(), limit);
                let departures = ctx.predictions(&query).await.found().unwrap_or_default();
                ((*stop).clone(), departures)
            })
            .collect();

        for (stop, departures) in join_all(futures).await {
            cache.insert(stop, departures);
        }
    }
}
