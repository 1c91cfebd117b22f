//! Trip planning orchestration.
//!
//! A planning call resolves alerts, locates stops on both sides, then runs
//! the route searches for each origin stop in turn:
//!
//! 1. direct rides;
//! 2. exact two-leg transfers, if no direct ride was found;
//! 3. the multi-hop graph search, if still nothing and two or more
//!    transfers are allowed;
//! 4. estimated two-leg transfers as a last resort.
//!
//! If nothing at all is found and alerts are in force, the search is re-run
//! without stops on the affected routes. Failing that, the caller gets
//! non-transit suggestions instead of itineraries.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Local};
use serde::Serialize;
use tracing::{debug, info};

use crate::domain::{Alert, Coordinates, Departure, RouteId, Stop, TransitMode, TripId, TripOption};
use crate::registry::StaticNetwork;

use super::alerts::{affected_routes, relevant_alerts, stop_affected};
use super::alternatives::{ModeSuggestion, suggest};
use super::config::PlannerConfig;
use super::context::{Deadline, SearchContext, SearchStats, StatsSnapshot};
use super::direct::find_direct_routes;
use super::feed::{PredictionQuery, TransitFeed};
use super::graph::find_graph_routes;
use super::locate::find_nearby_stops;
use super::rank::{dedupe, rank};
use super::ride::Constraints;
use super::transfer::{find_estimated_routes, find_transfer_routes};

/// Error from trip planning.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PlanError {
    /// The request is malformed
    #[error("invalid trip request: {0}")]
    InvalidRequest(String),

    /// The deadline passed before stops were located
    #[error("planning deadline expired before stops were located")]
    Timeout,
}

/// Default walking radius in metres.
pub const DEFAULT_MAX_WALK_M: f64 = 800.0;

/// Default transfer allowance.
pub const DEFAULT_MAX_TRANSFERS: usize = 3;

/// A trip to plan.
#[derive(Debug, Clone, PartialEq)]
pub struct TripRequest {
    pub origin: Coordinates,
    pub destination: Coordinates,

    /// Nothing departs before this. Defaults to now.
    pub departure_time: Option<DateTime<FixedOffset>>,

    /// Itineraries arriving after this are dropped.
    pub arrival_time: Option<DateTime<FixedOffset>>,

    pub max_walk_distance_m: f64,
    pub max_transfers: usize,
    pub prefer_fewer_transfers: bool,
    pub wheelchair_accessible: bool,
}

impl TripRequest {
    /// A request with default parameters.
    pub fn new(origin: Coordinates, destination: Coordinates) -> Self {
        Self {
            origin,
            destination,
            departure_time: None,
            arrival_time: None,
            max_walk_distance_m: DEFAULT_MAX_WALK_M,
            max_transfers: DEFAULT_MAX_TRANSFERS,
            prefer_fewer_transfers: true,
            wheelchair_accessible: false,
        }
    }

    pub fn departing_at(mut self, at: DateTime<FixedOffset>) -> Self {
        self.departure_time = Some(at);
        self
    }

    pub fn arriving_by(mut self, at: DateTime<FixedOffset>) -> Self {
        self.arrival_time = Some(at);
        self
    }

    pub fn with_max_walk(mut self, metres: f64) -> Self {
        self.max_walk_distance_m = metres;
        self
    }

    pub fn with_max_transfers(mut self, transfers: usize) -> Self {
        self.max_transfers = transfers;
        self
    }

    pub fn prefer_fewer_transfers(mut self, prefer: bool) -> Self {
        self.prefer_fewer_transfers = prefer;
        self
    }

    pub fn wheelchair(mut self, required: bool) -> Self {
        self.wheelchair_accessible = required;
        self
    }

    /// Validate the request.
    pub fn validate(&self) -> Result<(), PlanError> {
        if !self.max_walk_distance_m.is_finite() || self.max_walk_distance_m <= 0.0 {
            return Err(PlanError::InvalidRequest(
                "max walk distance must be positive".to_string(),
            ));
        }

        if let (Some(dep), Some(arr)) = (self.departure_time, self.arrival_time) {
            if arr < dep {
                return Err(PlanError::InvalidRequest(
                    "arrival time is before departure time".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// The parameters a plan was computed with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchParameters {
    pub departure_time: Option<DateTime<FixedOffset>>,
    pub arrival_time: Option<DateTime<FixedOffset>>,
    pub max_walk_distance: f64,
    pub max_transfers: usize,
    pub prefer_fewer_transfers: bool,
    pub wheelchair_accessible: bool,
}

/// Why alternatives were offered instead of itineraries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlternativeReason {
    ServiceDisruption,
    NoRoutesFound,
}

/// What a planning call found.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanOutcome {
    /// Ranked itineraries, best first.
    Routes(Vec<TripOption>),

    /// No itinerary; non-transit suggestions instead.
    Alternatives {
        reason: AlternativeReason,
        affected_routes: Vec<RouteId>,
        suggestions: Vec<ModeSuggestion>,
    },

    /// One side has no stop within walking distance.
    NoStops {
        origin_stops_found: usize,
        dest_stops_found: usize,
    },
}

/// Result of a planning call.
#[derive(Debug, Clone, PartialEq)]
pub struct TripPlan {
    pub origin: Coordinates,
    pub destination: Coordinates,
    pub outcome: PlanOutcome,
    pub alerts: Vec<Alert>,
    pub parameters: SearchParameters,
    pub stats: StatsSnapshot,
}

impl TripPlan {
    /// The itineraries, if any were found.
    pub fn routes(&self) -> &[TripOption] {
        match &self.outcome {
            PlanOutcome::Routes(routes) => routes,
            PlanOutcome::Alternatives { .. } | PlanOutcome::NoStops { .. } => &[],
        }
    }
}

/// Trip planner over a live feed and a static network.
pub struct TripPlanner<'a, F: TransitFeed> {
    feed: &'a F,
    network: &'a StaticNetwork,
    config: &'a PlannerConfig,
}

impl<'a, F: TransitFeed> TripPlanner<'a, F> {
    pub fn new(feed: &'a F, network: &'a StaticNetwork, config: &'a PlannerConfig) -> Self {
        Self {
            feed,
            network,
            config,
        }
    }

    fn context<'s>(&'s self, stats: &'s SearchStats) -> SearchContext<'s, F> {
        SearchContext::new(
            self.feed,
            self.network,
            self.config,
            stats,
            Deadline::after(self.config.deadline()),
        )
    }

    /// Plan a trip.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the request is invalid, or if the deadline passes
    /// before stops are located. Running out of stops or routes is not an
    /// error; see [`PlanOutcome`].
    pub async fn plan_trip(&self, request: &TripRequest) -> Result<TripPlan, PlanError> {
        let stats = SearchStats::new();
        let ctx = self.context(&stats);
        self.plan(&ctx, request).await
    }

    /// Plan a trip with default parameters, dropping itineraries that ride
    /// any of `excluded` modes.
    ///
    /// Route modes are looked up once per route. A route whose mode cannot
    /// be found is not excluded.
    pub async fn get_route_alternatives(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        excluded: &[TransitMode],
    ) -> Result<TripPlan, PlanError> {
        let stats = SearchStats::new();
        let ctx = self.context(&stats);
        let mut plan = self
            .plan(&ctx, &TripRequest::new(origin, destination))
            .await?;

        if excluded.is_empty() {
            return Ok(plan);
        }

        if let PlanOutcome::Routes(routes) = &mut plan.outcome {
            let mut modes: HashMap<RouteId, Option<TransitMode>> = HashMap::new();
            let mut kept = Vec::with_capacity(routes.len());

            for option in routes.drain(..) {
                let mut uses_excluded = false;
                for leg in option.transit_legs() {
                    let mode = match modes.get(leg.route_id()) {
                        Some(mode) => *mode,
                        None => {
                            let mode = route_mode(&ctx, leg.route_id()).await;
                            modes.insert(leg.route_id().clone(), mode);
                            mode
                        }
                    };
                    if mode.is_some_and(|m| excluded.contains(&m)) {
                        uses_excluded = true;
                        break;
                    }
                }
                if !uses_excluded {
                    kept.push(option);
                }
            }

            kept.truncate(self.config.max_results);
            debug!(kept = kept.len(), "Filtered itineraries by mode");
            *routes = kept;
        }

        plan.stats = stats.snapshot();
        Ok(plan)
    }

    async fn plan(
        &self,
        ctx: &SearchContext<'_, F>,
        request: &TripRequest,
    ) -> Result<TripPlan, PlanError> {
        request.validate()?;

        let alerts = relevant_alerts(ctx, request.origin, request.destination).await;

        let origin_stops = find_nearby_stops(
            ctx,
            request.origin,
            request.max_walk_distance_m,
            self.config.stops_per_side,
            request.wheelchair_accessible,
        )
        .await;
        let dest_stops = find_nearby_stops(
            ctx,
            request.destination,
            request.max_walk_distance_m,
            self.config.stops_per_side,
            request.wheelchair_accessible,
        )
        .await;
        if ctx.out_of_time() {
            return Err(PlanError::Timeout);
        }

        // Departure defaults to now only if neither end is pinned.
        let departure_time = match (request.departure_time, request.arrival_time) {
            (None, None) => Some(now()),
            (dep, _) => dep,
        };
        let parameters = SearchParameters {
            departure_time,
            arrival_time: request.arrival_time,
            max_walk_distance: request.max_walk_distance_m,
            max_transfers: request.max_transfers,
            prefer_fewer_transfers: request.prefer_fewer_transfers,
            wheelchair_accessible: request.wheelchair_accessible,
        };

        let finish = |outcome, alerts| TripPlan {
            origin: request.origin,
            destination: request.destination,
            outcome,
            alerts,
            parameters: parameters.clone(),
            stats: ctx.stats.snapshot(),
        };

        if origin_stops.is_empty() || dest_stops.is_empty() {
            info!(
                origin_stops = origin_stops.len(),
                dest_stops = dest_stops.len(),
                "No stops within walking distance"
            );
            let outcome = PlanOutcome::NoStops {
                origin_stops_found: origin_stops.len(),
                dest_stops_found: dest_stops.len(),
            };
            return Ok(finish(outcome, alerts));
        }

        let constraints = Constraints {
            not_before: departure_time.unwrap_or_else(now),
            wheelchair: request.wheelchair_accessible,
        };

        let mut routes = self
            .search(ctx, &origin_stops, &dest_stops, &alerts, constraints, request)
            .await;

        if routes.is_empty() && !alerts.is_empty() {
            let affected = affected_routes(&alerts);
            let keep = |stops: &[Stop]| -> Vec<Stop> {
                stops
                    .iter()
                    .filter(|s| !stop_affected(s, &affected))
                    .cloned()
                    .collect()
            };
            let origin_clear = keep(&origin_stops);
            let dest_clear = keep(&dest_stops);
            let changed =
                origin_clear.len() < origin_stops.len() || dest_clear.len() < dest_stops.len();

            if changed && !origin_clear.is_empty() && !dest_clear.is_empty() {
                info!(
                    origin_stops = origin_clear.len(),
                    dest_stops = dest_clear.len(),
                    "Re-planning around disrupted stops"
                );
                routes = self
                    .search(ctx, &origin_clear, &dest_clear, &alerts, constraints, request)
                    .await;
            }
        }

        if let Some(arrive_by) = request.arrival_time {
            routes.retain(|r| r.arrival_time() <= arrive_by);
        }

        let outcome = if routes.is_empty() {
            let reason = if alerts.is_empty() {
                AlternativeReason::NoRoutesFound
            } else {
                AlternativeReason::ServiceDisruption
            };
            let mut affected: Vec<RouteId> = affected_routes(&alerts).into_iter().collect();
            affected.sort();

            info!(?reason, "No itineraries, offering alternatives");
            PlanOutcome::Alternatives {
                reason,
                affected_routes: affected,
                suggestions: suggest(
                    request.origin,
                    request.destination,
                    &alerts,
                    request.wheelchair_accessible,
                ),
            }
        } else {
            let found = routes.len();
            let ranked = rank(
                dedupe(routes),
                request.prefer_fewer_transfers,
                self.config.max_results,
            );
            info!(found, returned = ranked.len(), "Trip planned");
            PlanOutcome::Routes(ranked)
        };

        Ok(finish(outcome, alerts))
    }

    /// Run the route searches from each origin stop.
    async fn search(
        &self,
        ctx: &SearchContext<'_, F>,
        origin_stops: &[Stop],
        dest_stops: &[Stop],
        alerts: &[Alert],
        constraints: Constraints,
        request: &TripRequest,
    ) -> Vec<TripOption> {
        let max_transfers = request.max_transfers;
        let mut schedules: HashMap<TripId, Vec<Departure>> = HashMap::new();
        let mut routes = Vec::new();

        for origin in origin_stops.iter().take(self.config.max_origin_stops) {
            if ctx.out_of_time() {
                info!("Deadline reached, returning partial results");
                break;
            }

            let query = PredictionQuery::at(origin.id.clone(), self.config.prediction_limit);
            let Some(departures) = ctx.predictions(&query).await.found() else {
                continue;
            };

            let mut found = find_direct_routes(
                ctx,
                origin,
                dest_stops,
                &departures,
                constraints,
                &mut schedules,
            )
            .await;
            let mut tier = "direct";

            if found.is_empty() && max_transfers >= 1 {
                found = find_transfer_routes(
                    ctx,
                    origin,
                    dest_stops,
                    &departures,
                    alerts,
                    constraints,
                    &mut schedules,
                )
                .await;
                tier = "transfer";
            }

            if found.is_empty() && max_transfers >= 2 {
                found = find_graph_routes(
                    ctx,
                    origin,
                    dest_stops,
                    &departures,
                    constraints,
                    max_transfers,
                    &mut schedules,
                )
                .await;
                tier = "graph";
            }

            if found.is_empty() && max_transfers >= 1 {
                found = find_estimated_routes(
                    ctx,
                    origin,
                    dest_stops,
                    &departures,
                    alerts,
                    constraints,
                );
                tier = "estimated";
            }

            debug!(origin = %origin.id, tier, found = found.len(), "Searched origin stop");
            routes.extend(found);
        }

        routes
    }
}

fn now() -> DateTime<FixedOffset> {
    Local::now().into()
}

async fn route_mode<F: TransitFeed>(
    ctx: &SearchContext<'_, F>,
    route: &RouteId,
) -> Option<TransitMode> {
    if ctx.out_of_time() {
        return None;
    }
    let result = ctx.feed.route_mode(route).await;
    ctx.stats
        .record(format_args!("mode of route {route}"), result.into())
        .found()
        .flatten()
}
