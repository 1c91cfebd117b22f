//! Best-first multi-hop search.
//!
//! The deeper fallback when the fixed one- and two-leg searches come up
//! empty. States are rides in progress, ordered by elapsed time then
//! transfer count. Popping a ride scans its trip downstream: reaching a
//! destination queues a finished itinerary, and every other stop is a
//! place to change onto a different route.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::slice;

use chrono::{DateTime, FixedOffset};
use tracing::{debug, trace};

use crate::domain::{
    Departure, Leg, Stop, StopId, TransferLeg, TransitLeg, TripId, TripOption, minutes_between,
};

use super::context::SearchContext;
use super::feed::TransitFeed;
use super::ride::{
    Constraints, StopSet, at_stop, prefetch_predictions, prefetch_schedules, stop_walk_minutes,
};

/// Priority of a queued state. Smaller is better; `seq` breaks ties in
/// insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct QueueKey {
    pub elapsed_minutes: i64,
    pub transfers: usize,
    pub seq: u64,
}

#[derive(Debug)]
enum State {
    /// On board `departure`'s trip since `board`.
    Riding {
        board: Stop,
        departure: Departure,
        depart_at: DateTime<FixedOffset>,
        legs: Vec<Leg>,
    },
    /// At a destination stop.
    Arrived(TripOption),
}

#[derive(Debug)]
struct Queued {
    key: QueueKey,
    state: State,
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Queued {}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Queued {
    // Reversed: BinaryHeap is a max-heap.
    fn cmp(&self, other: &Self) -> Ordering {
        other.key.cmp(&self.key)
    }
}

/// Min-queue of states with FIFO tie-breaking.
#[derive(Debug, Default)]
struct Frontier {
    heap: BinaryHeap<Queued>,
    next_seq: u64,
}

impl Frontier {
    fn push(&mut self, elapsed_minutes: i64, transfers: usize, state: State) {
        let key = QueueKey {
            elapsed_minutes,
            transfers,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.heap.push(Queued { key, state });
    }

    fn pop(&mut self) -> Option<Queued> {
        self.heap.pop()
    }
}

/// Where a state has been. Rides are told apart by trip so that every
/// departure from the same stop is explored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Visit {
    station: StopId,
    transfers: usize,
    trip: Option<TripId>,
}

/// A downstream stop on the current ride where a change is possible.
struct ChangePoint<'s> {
    entry: &'s Departure,
    arrival: DateTime<FixedOffset>,
}

fn entry_station(entry: &Departure) -> &StopId {
    entry.parent_station.as_ref().unwrap_or(&entry.stop_id)
}

fn boarding_stop(departure: &Departure) -> Stop {
    let stop = Stop::new(departure.stop_id.clone(), departure.stop_id.as_str(), None);
    match &departure.parent_station {
        Some(parent) => stop.with_parent(parent.clone()),
        None => stop,
    }
}

/// Search for itineraries of up to `max_transfers` changes.
///
/// Seeds one ride per qualifying origin departure. Connections must be on
/// a different route and leave at least the minimum connection time after
/// arrival. Stops at the result quota, the expansion cap, the deadline or
/// when the queue runs dry.
pub async fn find_graph_routes<F: TransitFeed>(
    ctx: &SearchContext<'_, F>,
    origin: &Stop,
    dest_stops: &[Stop],
    origin_departures: &[Departure],
    constraints: Constraints,
    max_transfers: usize,
    schedules: &mut HashMap<TripId, Vec<Departure>>,
) -> Vec<TripOption> {
    let start = constraints.not_before;
    let targets = StopSet::new(dest_stops);
    let origin_walk = stop_walk_minutes(origin);

    let mut frontier = Frontier::default();
    for departure in origin_departures.iter().take(ctx.config.graph_seed_departures) {
        let Some(depart_at) = constraints.boarding_time(departure) else {
            continue;
        };
        frontier.push(
            minutes_between(start, depart_at),
            0,
            State::Riding {
                board: origin.clone(),
                departure: departure.clone(),
                depart_at,
                legs: Vec::new(),
            },
        );
    }

    let mut visited: HashSet<Visit> = HashSet::new();
    let mut connections: HashMap<StopId, Vec<Departure>> = HashMap::new();
    let mut results = Vec::new();
    let mut expansions = 0;

    while let Some(Queued { key, state }) = frontier.pop() {
        if results.len() >= ctx.config.graph_max_results || ctx.out_of_time() {
            break;
        }

        let (board, departure, depart_at, legs) = match state {
            State::Arrived(option) => {
                let visit = Visit {
                    station: option.final_stop().id.clone(),
                    transfers: key.transfers,
                    trip: None,
                };
                if visited.insert(visit) {
                    trace!(
                        elapsed = key.elapsed_minutes,
                        transfers = key.transfers,
                        stop = %option.final_stop().id,
                        "Reached destination"
                    );
                    results.push(option);
                }
                continue;
            }
            State::Riding {
                board,
                departure,
                depart_at,
                legs,
            } => (board, departure, depart_at, legs),
        };

        let visit = Visit {
            station: board.station_id().clone(),
            transfers: key.transfers,
            trip: Some(departure.trip_id.clone()),
        };
        if !visited.insert(visit) {
            continue;
        }

        expansions += 1;
        if expansions > ctx.config.graph_max_expansions {
            debug!(expansions, "Graph search expansion cap reached");
            break;
        }

        trace!(
            elapsed = key.elapsed_minutes,
            transfers = key.transfers,
            stop = %board.id,
            route = %departure.route_id,
            trip = %departure.trip_id,
            "Expanding ride"
        );

        prefetch_schedules(ctx, slice::from_ref(&departure.trip_id), schedules).await;
        let Some(schedule) = schedules.get(&departure.trip_id) else {
            continue;
        };
        let Some(board_index) = schedule.iter().position(|e| at_stop(e, &board)) else {
            continue;
        };

        let may_change = key.transfers < max_transfers;
        let mut change_points = Vec::new();

        for entry in &schedule[board_index + 1..] {
            let Some(arrival) = entry.best_arrival().filter(|t| *t > depart_at) else {
                continue;
            };

            if let Some(target) = targets.find(entry) {
                let finished = ride(&departure, &board, entry, depart_at, arrival).and_then(|leg| {
                    let mut path = legs.clone();
                    path.push(Leg::Transit(leg));
                    TripOption::new(path, target.clone(), origin_walk, stop_walk_minutes(target))
                        .ok()
                });
                if let Some(option) = finished {
                    frontier.push(
                        minutes_between(start, arrival),
                        key.transfers,
                        State::Arrived(option),
                    );
                }
                break;
            }

            if may_change {
                change_points.push(ChangePoint { entry, arrival });
            }
        }

        if change_points.is_empty() {
            continue;
        }

        let stations: Vec<StopId> = change_points
            .iter()
            .map(|p| entry_station(p.entry).clone())
            .collect();
        prefetch_predictions(
            ctx,
            &stations,
            ctx.config.graph_prediction_limit,
            &mut connections,
        )
        .await;

        for point in change_points {
            let station = entry_station(point.entry);
            let Some(onward) = connections.get(station) else {
                continue;
            };
            let Some(first) = ride(&departure, &board, point.entry, depart_at, point.arrival) else {
                continue;
            };

            let ready = constraints.departing_after(point.arrival + ctx.config.min_connection());
            let walk = change_walk(ctx, station);

            let eligible = onward
                .iter()
                .filter(|conn| conn.route_id != departure.route_id)
                .filter(|conn| conn.departure_time.is_some())
                .filter_map(|conn| ready.boarding_time(conn).map(|t| (conn, t)))
                .take(ctx.config.graph_connections_per_stop);

            for (conn, conn_at) in eligible {
                let mut path = legs.clone();
                path.push(Leg::Transit(first.clone()));
                path.push(Leg::Transfer(walk.clone()));

                frontier.push(
                    minutes_between(start, conn_at),
                    key.transfers + 1,
                    State::Riding {
                        board: boarding_stop(conn),
                        departure: conn.clone(),
                        depart_at: conn_at,
                        legs: path,
                    },
                );
            }
        }
    }

    debug!(
        origin = %origin.id,
        max_transfers,
        expansions,
        found = results.len(),
        "Graph search complete"
    );

    results
}

fn ride(
    departure: &Departure,
    board: &Stop,
    alight: &Departure,
    depart_at: DateTime<FixedOffset>,
    arrival: DateTime<FixedOffset>,
) -> Option<TransitLeg> {
    TransitLeg::new(
        departure.route_id.clone(),
        departure.trip_id.clone(),
        board.id.clone(),
        alight.stop_id.clone(),
        depart_at,
        arrival,
    )
    .ok()
}

/// The change at `station`, named and timed from the static network when
/// it is a known interchange.
fn change_walk<F: TransitFeed>(ctx: &SearchContext<'_, F>, station: &StopId) -> TransferLeg {
    if let Some(known) = ctx.network.transfers.get(station) {
        return TransferLeg {
            station_id: known.id.clone(),
            station_name: known.name.clone(),
            walk_minutes: known.walk_minutes,
        };
    }

    let station_name = ctx
        .network
        .catalog
        .get(station)
        .map(|s| s.name.clone())
        .unwrap_or_else(|| station.to_string());

    TransferLeg {
        station_id: station.clone(),
        station_name,
        walk_minutes: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RouteId;

    fn departure(stop: &str, parent: Option<&str>) -> Departure {
        Departure {
            stop_id: StopId::parse(stop).unwrap(),
            parent_station: parent.map(|p| StopId::parse(p).unwrap()),
            route_id: RouteId::parse("Red").unwrap(),
            trip_id: TripId::parse("T1").unwrap(),
            departure_time: None,
            arrival_time: None,
            wheelchair_accessible: true,
        }
    }

    fn riding(stop: &str) -> State {
        State::Riding {
            board: Stop::new(StopId::parse(stop).unwrap(), stop, None),
            departure: departure(stop, None),
            depart_at: DateTime::parse_from_rfc3339("2025-01-10T08:00:00-05:00").unwrap(),
            legs: Vec::new(),
        }
    }

    fn popped_stops(frontier: &mut Frontier) -> Vec<String> {
        std::iter::from_fn(|| frontier.pop())
            .map(|q| match q.state {
                State::Riding { board, .. } => board.id.to_string(),
                State::Arrived(o) => o.final_stop().id.to_string(),
            })
            .collect()
    }

    #[test]
    fn queue_orders_by_time_then_transfers() {
        let mut frontier = Frontier::default();
        frontier.push(10, 0, riding("slow"));
        frontier.push(5, 1, riding("fast-change"));
        frontier.push(5, 0, riding("fast-direct"));

        assert_eq!(
            popped_stops(&mut frontier),
            vec!["fast-direct", "fast-change", "slow"]
        );
    }

    #[test]
    fn queue_ties_are_first_in_first_out() {
        let mut frontier = Frontier::default();
        for stop in ["a", "b", "c"] {
            frontier.push(7, 1, riding(stop));
        }
        assert_eq!(popped_stops(&mut frontier), vec!["a", "b", "c"]);
    }

    #[test]
    fn queue_key_ordering() {
        let key = |elapsed_minutes, transfers, seq| QueueKey {
            elapsed_minutes,
            transfers,
            seq,
        };
        assert!(key(5, 3, 9) < key(6, 0, 0));
        assert!(key(5, 0, 9) < key(5, 1, 0));
        assert!(key(5, 1, 0) < key(5, 1, 1));
    }

    #[test]
    fn boarding_stop_keeps_parent() {
        let platform = departure("70076", Some("place-pktrm"));

        let stop = boarding_stop(&platform);
        assert_eq!(stop.id.as_str(), "70076");
        assert_eq!(stop.station_id().as_str(), "place-pktrm");
        assert_eq!(entry_station(&platform).as_str(), "place-pktrm");

        let bare = departure("70076", None);
        assert_eq!(entry_station(&bare).as_str(), "70076");
    }
}
