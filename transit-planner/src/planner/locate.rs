//! Stop location.
//!
//! Finds the stops within walking distance of a point using progressively
//! more expensive sources, stopping as soon as one yields enough rail:
//!
//! 1. The static major-station catalog, by distance.
//! 2. The same catalog again, picking up stations the first pass could not
//!    categorise by mode.
//! 3. The live geographic stop listing, over-fetched and re-filtered since
//!    its own radius filter is unreliable.
//! 4. Name searches for area-specific terms.
//!
//! Rapid transit is returned if any was found, otherwise bus stops.

use std::collections::HashSet;

use tracing::debug;

use crate::domain::{Coordinates, Stop, StopId, TransitMode};
use crate::geo;

use super::context::SearchContext;
use super::feed::TransitFeed;

/// Rail stops needed before the locator stops trying further tiers.
const ENOUGH_RAIL: usize = 2;

/// Candidate stops collected across tiers.
#[derive(Debug, Default)]
struct Candidates {
    rapid: Vec<Stop>,
    bus: Vec<Stop>,
    seen: HashSet<StopId>,
}

impl Candidates {
    fn enough(&self) -> bool {
        self.rapid.len() >= ENOUGH_RAIL
    }

    fn contains(&self, id: &StopId) -> bool {
        self.seen.contains(id)
    }

    fn push_rapid(&mut self, stop: Stop) {
        if self.seen.insert(stop.id.clone()) {
            self.rapid.push(stop);
        }
    }

    fn push_bus(&mut self, stop: Stop) {
        if self.seen.insert(stop.id.clone()) {
            self.bus.push(stop);
        }
    }

    /// Rapid transit if any, otherwise bus, nearest first.
    fn finish(self, limit: usize) -> Vec<Stop> {
        let mut stops = if self.rapid.is_empty() {
            self.bus
        } else {
            self.rapid
        };
        stops.sort_by(|a, b| {
            let da = a.distance_km.unwrap_or(f64::INFINITY);
            let db = b.distance_km.unwrap_or(f64::INFINITY);
            da.total_cmp(&db)
        });
        stops.truncate(limit);
        stops
    }
}

/// Find stops within `max_walk_m` metres of `at`.
///
/// Every returned stop has coordinates and a distance annotation. When
/// `wheelchair` is set, only stops known or assumed to be accessible are
/// returned.
pub async fn find_nearby_stops<F: TransitFeed>(
    ctx: &SearchContext<'_, F>,
    at: Coordinates,
    max_walk_m: f64,
    limit: usize,
    wheelchair: bool,
) -> Vec<Stop> {
    let radius_km = max_walk_m / 1000.0;
    let mut found = Candidates::default();

    scan_catalog(ctx, at, radius_km, wheelchair, &mut found);
    if !found.enough() {
        rescan_catalog(ctx, at, radius_km, wheelchair, &mut found);
    }
    if !found.enough() && !ctx.out_of_time() {
        scan_live(ctx, at, max_walk_m, limit, wheelchair, &mut found).await;
    }
    if !found.enough() && !ctx.out_of_time() {
        search_by_name(ctx, at, radius_km, limit, wheelchair, &mut found).await;
    }

    debug!(
        lat = at.lat,
        lon = at.lon,
        rapid = found.rapid.len(),
        bus = found.bus.len(),
        "Located stops"
    );

    found.finish(limit)
}

/// Tier 1: catalog stations with a known mode. Unknown accessibility is
/// assumed accessible.
fn scan_catalog<F: TransitFeed>(
    ctx: &SearchContext<'_, F>,
    at: Coordinates,
    radius_km: f64,
    wheelchair: bool,
    found: &mut Candidates,
) {
    for (station, distance) in ctx.network.catalog.within(at, radius_km) {
        let Some(mode) = station.mode else {
            continue;
        };
        if wheelchair && station.wheelchair_boarding == Some(false) {
            continue;
        }
        let stop = station.to_stop(distance);
        if mode.is_rail() {
            found.push_rapid(stop);
        } else {
            found.push_bus(stop);
        }
    }
}

/// Tier 2: catalog stations the first pass skipped for lack of a mode.
/// The catalog only lists major stations, so these count as rapid transit.
/// Accessibility must be known here.
fn rescan_catalog<F: TransitFeed>(
    ctx: &SearchContext<'_, F>,
    at: Coordinates,
    radius_km: f64,
    wheelchair: bool,
    found: &mut Candidates,
) {
    for (station, distance) in ctx.network.catalog.within(at, radius_km) {
        if found.contains(&station.id) {
            continue;
        }
        if wheelchair && station.wheelchair_boarding != Some(true) {
            continue;
        }
        found.push_rapid(station.to_stop(distance));
    }
}

/// Fill in a stop's missing coordinates from its parent station and
/// annotate its distance. Returns `None` if it is out of range or still
/// has no position.
async fn place<F: TransitFeed>(
    ctx: &SearchContext<'_, F>,
    mut stop: Stop,
    at: Coordinates,
    radius_km: f64,
) -> Option<Stop> {
    if stop.coords.is_none() {
        let parent_id = stop.parent_station.clone()?;
        let parent = ctx.stop(&parent_id).await.found()?;
        if !stop.backfill_from_parent(&parent) {
            return None;
        }
    }

    let distance = geo::distance_between(at, stop.coords?);
    if distance > radius_km {
        return None;
    }
    stop.distance_km = Some(distance);
    Some(stop)
}

/// Tier 3: the live geographic listing, at twice the radius and three times
/// the limit.
async fn scan_live<F: TransitFeed>(
    ctx: &SearchContext<'_, F>,
    at: Coordinates,
    max_walk_m: f64,
    limit: usize,
    wheelchair: bool,
    found: &mut Candidates,
) {
    let Some(stops) = ctx
        .nearby_stops(at, max_walk_m * 2.0, limit * 3)
        .await
        .found()
    else {
        return;
    };

    let radius_km = max_walk_m / 1000.0;
    for stop in stops {
        if ctx.out_of_time() {
            break;
        }
        if found.contains(&stop.id) {
            continue;
        }
        if wheelchair && !stop.wheelchair_accessible {
            continue;
        }
        let Some(mode) = stop.mode else {
            continue;
        };
        let rapid = mode.is_rapid_transit();
        if !rapid && mode != TransitMode::Bus {
            continue;
        }
        let Some(stop) = place(ctx, stop, at, radius_km).await else {
            continue;
        };
        if rapid {
            found.push_rapid(stop);
        } else {
            found.push_bus(stop);
        }
    }
}

/// Tier 4: name searches for the area's terms, rapid transit only.
async fn search_by_name<F: TransitFeed>(
    ctx: &SearchContext<'_, F>,
    at: Coordinates,
    radius_km: f64,
    limit: usize,
    wheelchair: bool,
    found: &mut Candidates,
) {
    for term in ctx.network.areas.terms_for(at) {
        if found.enough() || ctx.out_of_time() {
            break;
        }
        let Some(stops) = ctx.search_stops(&term, limit).await.found() else {
            continue;
        };

        for stop in stops {
            if found.contains(&stop.id) || !stop.mode.is_some_and(|m| m.is_rapid_transit()) {
                continue;
            }
            if wheelchair && !stop.wheelchair_accessible {
                continue;
            }
            if let Some(stop) = place(ctx, stop, at, radius_km).await {
                found.push_rapid(stop);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Alert, Departure, RouteId, TripId};
    use crate::planner::{Deadline, FeedError, PlannerConfig, PredictionQuery, SearchStats};
    use crate::registry::{StaticNetwork, StationCatalog};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Inside the Kendall search area.
    const QUERY: (f64, f64) = (42.3600, -71.0850);

    fn stop_at(id: &str, km: Option<f64>) -> Stop {
        let mut stop = Stop::new(StopId::parse(id).unwrap(), id, None);
        stop.distance_km = km;
        stop
    }

    #[test]
    fn candidates_prefer_rapid_transit() {
        let mut c = Candidates::default();
        c.push_bus(stop_at("bus-1", Some(0.1)));
        c.push_rapid(stop_at("rail-1", Some(0.5)));
        c.push_rapid(stop_at("rail-2", Some(0.3)));

        let ids: Vec<_> = c.finish(10).into_iter().map(|s| s.id.to_string()).collect();
        assert_eq!(ids, vec!["rail-2", "rail-1"]);
    }

    #[test]
    fn candidates_fall_back_to_bus() {
        let mut c = Candidates::default();
        c.push_bus(stop_at("bus-2", Some(0.4)));
        c.push_bus(stop_at("bus-1", Some(0.2)));
        c.push_bus(stop_at("bus-3", Some(0.6)));
        assert!(!c.enough());

        let ids: Vec<_> = c.finish(2).into_iter().map(|s| s.id.to_string()).collect();
        assert_eq!(ids, vec!["bus-1", "bus-2"]);
    }

    #[test]
    fn candidates_deduplicate_across_buckets() {
        let mut c = Candidates::default();
        c.push_rapid(stop_at("place-pktrm", Some(0.1)));
        c.push_bus(stop_at("place-pktrm", Some(0.1)));
        c.push_rapid(stop_at("place-pktrm", Some(0.1)));

        assert_eq!(c.rapid.len(), 1);
        assert!(c.bus.is_empty());
        assert!(c.contains(&StopId::parse("place-pktrm").unwrap()));
    }

    /// A point `dlat` degrees north of the query point (about 111 m per
    /// thousandth).
    fn north(dlat: f64) -> Coordinates {
        Coordinates::new(QUERY.0 + dlat, QUERY.1).unwrap()
    }

    fn query_point() -> Coordinates {
        north(0.0)
    }

    fn live_stop(id: &str, mode: TransitMode, coords: Option<Coordinates>) -> Stop {
        Stop::new(StopId::parse(id).unwrap(), id, coords)
            .with_mode(mode)
            .with_wheelchair(true)
    }

    /// Feed serving stop listings only.
    #[derive(Default)]
    struct StopsFeed {
        nearby: Vec<Stop>,
        by_name: HashMap<String, Vec<Stop>>,
        parents: HashMap<StopId, Stop>,
        nearby_args: Mutex<Option<(f64, usize)>>,
        searched: Mutex<Vec<String>>,
    }

    impl StopsFeed {
        fn add_parent(&mut self, parent: Stop) {
            self.parents.insert(parent.id.clone(), parent);
        }
    }

    impl TransitFeed for StopsFeed {
        async fn nearby_stops(
            &self,
            _at: Coordinates,
            radius_m: f64,
            limit: usize,
        ) -> Result<Vec<Stop>, FeedError> {
            *self.nearby_args.lock().unwrap() = Some((radius_m, limit));
            Ok(self.nearby.clone())
        }

        async fn predictions(&self, _query: &PredictionQuery) -> Result<Vec<Departure>, FeedError> {
            Ok(Vec::new())
        }

        async fn trip_schedule(
            &self,
            trip: &TripId,
            _limit: usize,
        ) -> Result<Vec<Departure>, FeedError> {
            Err(FeedError::NotFound(format!("trip {trip}")))
        }

        async fn alerts(&self, _limit: usize) -> Result<Vec<Alert>, FeedError> {
            Ok(Vec::new())
        }

        async fn search_stops(&self, query: &str, _limit: usize) -> Result<Vec<Stop>, FeedError> {
            self.searched.lock().unwrap().push(query.to_string());
            Ok(self.by_name.get(query).cloned().unwrap_or_default())
        }

        async fn stop(&self, id: &StopId) -> Result<Stop, FeedError> {
            self.parents
                .get(id)
                .cloned()
                .ok_or_else(|| FeedError::NotFound(format!("stop {id}")))
        }

        async fn route_mode(&self, _route: &RouteId) -> Result<Option<TransitMode>, FeedError> {
            Ok(None)
        }
    }

    async fn locate(
        feed: &StopsFeed,
        network: &StaticNetwork,
        max_walk_m: f64,
        wheelchair: bool,
    ) -> Vec<Stop> {
        let config = PlannerConfig::default();
        let stats = SearchStats::new();
        let ctx = SearchContext::new(feed, network, &config, &stats, Deadline::never());
        find_nearby_stops(&ctx, query_point(), max_walk_m, 5, wheelchair).await
    }

    fn empty_network() -> StaticNetwork {
        StaticNetwork::boston(StationCatalog::new(Vec::new()))
    }

    fn ids(stops: &[Stop]) -> Vec<&str> {
        stops.iter().map(|s| s.id.as_str()).collect()
    }

    /// A platform with no position of its own, under a parent 330 m north.
    fn platform_with_parent(feed: &mut StopsFeed, mode: TransitMode) -> Stop {
        feed.add_parent(Stop::new(
            StopId::parse("place-test").unwrap(),
            "Test Square",
            Some(north(0.003)),
        ));
        live_stop("70070", mode, None).with_parent(StopId::parse("place-test").unwrap())
    }

    #[tokio::test]
    async fn live_listing_is_overfetched_and_refiltered() {
        let mut feed = StopsFeed::default();
        let platform = platform_with_parent(&mut feed, TransitMode::Subway);
        feed.nearby = vec![
            live_stop("far-rail", TransitMode::Subway, Some(north(0.008))),
            live_stop("bus-stop", TransitMode::Bus, Some(north(0.002))),
            live_stop("ferry", TransitMode::Ferry, Some(north(0.001))),
            platform,
            live_stop("near-rail", TransitMode::Subway, Some(north(0.001))),
        ];
        let network = empty_network();

        let stops = locate(&feed, &network, 500.0, false).await;

        assert_eq!(*feed.nearby_args.lock().unwrap(), Some((1000.0, 15)));
        assert_eq!(ids(&stops), vec!["near-rail", "70070"]);

        let platform = &stops[1];
        assert_eq!(platform.coords, Some(north(0.003)));
        let km = platform.distance_km.unwrap();
        assert!((0.32..0.35).contains(&km), "platform at {km} km");

        // Two rapid transit stops are enough, so no name search.
        assert!(feed.searched.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn live_listing_falls_back_to_bus() {
        let mut feed = StopsFeed::default();
        feed.nearby = vec![
            live_stop("bus-far", TransitMode::Bus, Some(north(0.004))),
            live_stop("bus-near", TransitMode::Bus, Some(north(0.002))),
        ];
        let network = empty_network();

        let stops = locate(&feed, &network, 500.0, false).await;

        assert_eq!(ids(&stops), vec!["bus-near", "bus-far"]);
    }

    #[tokio::test]
    async fn live_listing_respects_wheelchair() {
        let mut feed = StopsFeed::default();
        let platform = platform_with_parent(&mut feed, TransitMode::LightRail);
        feed.nearby = vec![
            live_stop("near-rail", TransitMode::Subway, Some(north(0.001))).with_wheelchair(false),
            platform,
        ];
        let network = empty_network();

        let stops = locate(&feed, &network, 500.0, true).await;
        assert_eq!(ids(&stops), vec!["70070"]);

        let stops = locate(&feed, &network, 500.0, false).await;
        assert_eq!(ids(&stops), vec!["near-rail", "70070"]);
    }

    #[tokio::test]
    async fn live_listing_merges_with_catalog() {
        let catalog = StationCatalog::from_json(&format!(
            r#"{{"rapid_transit": [
                {{"id": "place-cat", "name": "Catalog Station", "latitude": {}, "longitude": {},
                  "route_type": 1, "wheelchair_boarding": 1}}
            ]}}"#,
            QUERY.0 + 0.002,
            QUERY.1
        ))
        .unwrap();
        let network = StaticNetwork::boston(catalog);

        let mut feed = StopsFeed::default();
        feed.nearby = vec![
            live_stop("place-cat", TransitMode::Subway, Some(north(0.002))),
            live_stop("near-rail", TransitMode::Subway, Some(north(0.001))),
        ];

        let stops = locate(&feed, &network, 500.0, false).await;

        assert_eq!(ids(&stops), vec!["near-rail", "place-cat"]);
        assert_eq!(stops[1].name, "Catalog Station");
    }

    #[tokio::test]
    async fn name_search_uses_area_terms() {
        let mut feed = StopsFeed::default();
        let platform = platform_with_parent(&mut feed, TransitMode::LightRail);
        feed.by_name.insert(
            "kendall".into(),
            vec![
                platform,
                live_stop("bus-stop", TransitMode::Bus, Some(north(0.001))),
            ],
        );
        feed.by_name.insert(
            "mit".into(),
            vec![live_stop("far-rail", TransitMode::Subway, Some(north(0.008)))],
        );
        let network = empty_network();

        let stops = locate(&feed, &network, 500.0, false).await;

        assert_eq!(ids(&stops), vec!["70070"]);
        assert_eq!(stops[0].coords, Some(north(0.003)));

        // One rail stop is not enough, so every term is tried.
        let searched = feed.searched.lock().unwrap().clone();
        assert_eq!(searched, network.areas.terms_for(query_point()));
        assert_eq!(searched[0], "kendall");
    }

    #[tokio::test]
    async fn orphan_platform_is_dropped() {
        let mut feed = StopsFeed::default();
        feed.nearby = vec![
            live_stop("70099", TransitMode::Subway, None)
                .with_parent(StopId::parse("place-gone").unwrap()),
            live_stop("no-parent", TransitMode::Subway, None),
        ];
        let network = empty_network();

        let stops = locate(&feed, &network, 500.0, false).await;

        assert!(stops.is_empty());
    }
}
