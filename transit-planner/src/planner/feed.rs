//! Live feed capabilities consumed by the planner.
//!
//! The planner never talks HTTP itself. It asks a [`TransitFeed`] for stops,
//! predictions, trip schedules and alerts. This keeps the search testable
//! with an in-memory feed and lets the cache wrap any implementation.

use std::fmt;
use std::future::Future;

use crate::domain::{Alert, Coordinates, Departure, RouteId, Stop, StopId, TransitMode, TripId};

/// Error from a feed call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FeedError {
    /// Network failure, timeout or non-success status
    #[error("{resource} unavailable: {message}")]
    Unavailable { resource: String, message: String },

    /// Upstream rate limit hit
    #[error("rate limited by upstream feed")]
    RateLimited,

    /// Requested entity does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Response could not be understood
    #[error("malformed feed response: {0}")]
    Malformed(String),
}

/// Parameters for a prediction lookup at one stop.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PredictionQuery {
    pub stop: StopId,
    pub route: Option<RouteId>,
    pub direction: Option<u8>,
    pub limit: usize,
}

impl PredictionQuery {
    /// All routes and directions at `stop`.
    pub fn at(stop: StopId, limit: usize) -> Self {
        Self {
            stop,
            route: None,
            direction: None,
            limit,
        }
    }

    pub fn on_route(mut self, route: RouteId) -> Self {
        self.route = Some(route);
        self
    }

    pub fn in_direction(mut self, direction: u8) -> Self {
        self.direction = Some(direction);
        self
    }
}

/// Source of live transit data.
///
/// Every method is an idempotent read. Implementations return `Send`
/// futures so a planning call can run inside a multi-threaded server.
pub trait TransitFeed: Send + Sync {
    /// Stops near a point. The provider's own geographic filter is not
    /// trusted; callers re-check distances.
    fn nearby_stops(
        &self,
        at: Coordinates,
        radius_m: f64,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Stop>, FeedError>> + Send;

    /// Upcoming predictions at a stop, soonest first.
    fn predictions(
        &self,
        query: &PredictionQuery,
    ) -> impl Future<Output = Result<Vec<Departure>, FeedError>> + Send;

    /// A trip's stops in travel order.
    fn trip_schedule(
        &self,
        trip: &TripId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Departure>, FeedError>> + Send;

    /// Current service alerts.
    fn alerts(&self, limit: usize) -> impl Future<Output = Result<Vec<Alert>, FeedError>> + Send;

    /// Stops whose name matches `query`, best match first.
    fn search_stops(
        &self,
        query: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Stop>, FeedError>> + Send;

    /// A single stop, used to backfill platform coordinates from the parent.
    fn stop(&self, id: &StopId) -> impl Future<Output = Result<Stop, FeedError>> + Send;

    /// Mode of a route. `None` if the feed reports a mode we do not model.
    fn route_mode(
        &self,
        route: &RouteId,
    ) -> impl Future<Output = Result<Option<TransitMode>, FeedError>> + Send;
}

/// Outcome of one best-effort feed call inside a search loop.
///
/// Search loops skip an iteration on anything but `Found`. Keeping the
/// three cases apart lets the caller count failures separately from
/// legitimately empty answers.
#[derive(Debug)]
pub enum Attempt<T> {
    Found(T),
    Empty,
    Failed(FeedError),
}

impl<T> Attempt<T> {
    /// The value, if the call produced one.
    pub fn found(self) -> Option<T> {
        match self {
            Attempt::Found(v) => Some(v),
            Attempt::Empty | Attempt::Failed(_) => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Attempt::Failed(_))
    }
}

impl<T> Attempt<Vec<T>> {
    /// Classify a list result: an empty list is `Empty`, not `Found`.
    pub fn from_list(result: Result<Vec<T>, FeedError>) -> Self {
        match result {
            Ok(v) if v.is_empty() => Attempt::Empty,
            Ok(v) => Attempt::Found(v),
            Err(e) => Attempt::Failed(e),
        }
    }
}

impl<T> From<Result<T, FeedError>> for Attempt<T> {
    fn from(result: Result<T, FeedError>) -> Self {
        match result {
            Ok(v) => Attempt::Found(v),
            Err(e) => Attempt::Failed(e),
        }
    }
}

impl<T> fmt::Display for Attempt<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attempt::Found(_) => f.write_str("found"),
            Attempt::Empty => f.write_str("empty"),
            Attempt::Failed(e) => write!(f, "failed: {e}"),
        }
    }
}
