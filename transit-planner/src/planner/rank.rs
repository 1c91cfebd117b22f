//! Itinerary ranking for search results.
//!
//! Candidate itineraries come from several searches over several origin
//! stops, so near-identical options are common. They are collapsed first,
//! then sorted and cut to the result count.

use std::collections::HashSet;

use crate::domain::{StopId, TripOption};

/// Width of the total-time bucket used to spot duplicates (minutes).
const DUPLICATE_BUCKET_MINUTES: i64 = 5;

/// Identity of an itinerary for deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    pub num_transfers: usize,
    pub final_stop: StopId,
    pub time_bucket: i64,
}

impl Signature {
    pub fn of(option: &TripOption) -> Self {
        Self {
            num_transfers: option.num_transfers(),
            final_stop: option.final_stop().id.clone(),
            time_bucket: option
                .total_time_minutes()
                .div_euclid(DUPLICATE_BUCKET_MINUTES),
        }
    }
}

/// Remove itineraries that are effectively identical.
///
/// Two itineraries are duplicates if they have the same number of
/// transfers, end at the same stop, and take the same total time to within
/// a five-minute bucket. The first of each group is kept and the input
/// order is otherwise preserved.
pub fn dedupe(routes: Vec<TripOption>) -> Vec<TripOption> {
    let mut seen = HashSet::with_capacity(routes.len());
    routes
        .into_iter()
        .filter(|r| seen.insert(Signature::of(r)))
        .collect()
}

/// Sort itineraries best-first and keep the top `max_results`.
///
/// With `prefer_fewer_transfers`, itineraries are ordered by transfer
/// count and then total time; otherwise by total time alone. The sort is
/// stable, so equal itineraries keep their input order.
pub fn rank(
    mut routes: Vec<TripOption>,
    prefer_fewer_transfers: bool,
    max_results: usize,
) -> Vec<TripOption> {
    if prefer_fewer_transfers {
        routes.sort_by_key(|r| (r.num_transfers(), r.total_time_minutes()));
    } else {
        routes.sort_by_key(|r| r.total_time_minutes());
    }
    routes.truncate(max_results);
    routes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Leg, RouteId, Stop, TransferLeg, TransitLeg, TripId};
    use chrono::{DateTime, Duration, FixedOffset};

    fn base() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2025-01-10T08:00:00-05:00").unwrap()
    }

    fn stop(id: &str) -> Stop {
        Stop::new(StopId::parse(id).unwrap(), id, None)
    }

    fn leg(trip: &str, dep: i64, arr: i64) -> Leg {
        Leg::Transit(
            TransitLeg::new(
                RouteId::parse("Red").unwrap(),
                TripId::parse(trip).unwrap(),
                StopId::parse("a").unwrap(),
                StopId::parse("b").unwrap(),
                base() + Duration::minutes(dep),
                base() + Duration::minutes(arr),
            )
            .unwrap(),
        )
    }

    /// A trip departing `dep` minutes after 08:00, riding `ride` minutes,
    /// with `transfers` extra rides of one minute each.
    fn trip(id: &str, dest: &str, dep: i64, ride: i64, transfers: usize) -> TripOption {
        let mut path = vec![leg(id, dep, dep + ride)];
        let mut at = dep + ride;
        for i in 0..transfers {
            path.push(Leg::Transfer(TransferLeg {
                station_id: StopId::parse("x").unwrap(),
                station_name: "X".into(),
                walk_minutes: 2,
            }));
            path.push(leg(&format!("{id}-{i}"), at, at + 1));
            at += 1;
        }
        TripOption::new(path, stop(dest), 1, 1).unwrap()
    }

    fn totals(routes: &[TripOption]) -> Vec<i64> {
        routes.iter().map(TripOption::total_time_minutes).collect()
    }

    #[test]
    fn dedupe_collapses_same_bucket() {
        // Totals 12 and 14 share a bucket; 15 does not.
        let routes = vec![
            trip("A", "b", 0, 10, 0),
            trip("B", "b", 3, 12, 0),
            trip("C", "b", 0, 13, 0),
        ];
        let result = dedupe(routes);

        assert_eq!(totals(&result), vec![12, 15]);
        assert_eq!(
            result[0].transit_legs().next().and_then(|l| l.trip_id()).map(|t| t.as_str()),
            Some("A")
        );
    }

    #[test]
    fn dedupe_distinguishes_stop_and_transfers() {
        let routes = vec![
            trip("A", "b", 0, 10, 0),
            trip("B", "c", 0, 10, 0),
            trip("C", "b", 0, 9, 1),
        ];
        assert_eq!(dedupe(routes).len(), 3);
    }

    #[test]
    fn rank_by_time_alone() {
        let routes = vec![
            trip("A", "b", 0, 20, 0),
            trip("B", "b", 0, 8, 1),
            trip("C", "b", 0, 15, 0),
        ];
        let ranked = rank(routes, false, 5);
        assert_eq!(totals(&ranked), vec![11, 17, 22]);
    }

    #[test]
    fn rank_prefers_fewer_transfers() {
        let routes = vec![
            trip("A", "b", 0, 20, 0),
            trip("B", "b", 0, 8, 1),
            trip("C", "b", 0, 15, 0),
        ];
        let ranked = rank(routes, true, 5);
        let transfers: Vec<_> = ranked.iter().map(TripOption::num_transfers).collect();
        assert_eq!(transfers, vec![0, 0, 1]);
        assert_eq!(totals(&ranked), vec![17, 22, 11]);
    }

    #[test]
    fn rank_keeps_top_results() {
        let routes: Vec<_> = (0..8)
            .map(|i| trip(&format!("T{i}"), "b", 0, 30 - i, 0))
            .collect();
        let ranked = rank(routes, true, 5);
        assert_eq!(ranked.len(), 5);
        assert_eq!(ranked[0].total_time_minutes(), 25);
    }

    #[test]
    fn empty_input() {
        assert!(dedupe(vec![]).is_empty());
        assert!(rank(vec![], true, 5).is_empty());
    }
}
