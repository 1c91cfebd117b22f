//! Per-request search context.
//!
//! Bundles the feed, static network and configuration every search stage
//! needs, together with the request's deadline and call statistics. Feed
//! calls made through the context are counted and classified as
//! [`Attempt`]s, so a failed call is logged once and the caller just skips.

use std::fmt::Display;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::debug;

use crate::domain::{Coordinates, Departure, Stop, StopId, TripId};
use crate::registry::StaticNetwork;

use super::config::PlannerConfig;
use super::feed::{Attempt, FeedError, PredictionQuery, TransitFeed};

/// Soft wall-clock limit, checked before each suspension point.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    /// A deadline `budget` from now.
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Some(Instant::now() + budget),
        }
    }

    /// A deadline that never expires.
    pub fn never() -> Self {
        Self { at: None }
    }

    pub fn expired(&self) -> bool {
        self.at.is_some_and(|at| Instant::now() >= at)
    }
}

/// Counters for feed calls made during one planning call.
#[derive(Debug, Default)]
pub struct SearchStats {
    calls: AtomicUsize,
    empty: AtomicUsize,
    failures: AtomicUsize,
    deadline_hit: AtomicBool,
}

/// Point-in-time copy of [`SearchStats`], returned with every plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub api_calls: usize,
    pub empty_responses: usize,
    pub failed_calls: usize,
    pub deadline_hit: bool,
}

impl SearchStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a call and log it if it failed.
    pub fn record<T>(&self, what: impl Display, attempt: Attempt<T>) -> Attempt<T> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        match &attempt {
            Attempt::Found(_) => {}
            Attempt::Empty => {
                self.empty.fetch_add(1, Ordering::Relaxed);
            }
            Attempt::Failed(e) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                debug!(call = %what, error = %e, "Feed call failed, skipping");
            }
        }
        attempt
    }

    pub fn mark_deadline(&self) {
        self.deadline_hit.store(true, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            api_calls: self.calls.load(Ordering::Relaxed),
            empty_responses: self.empty.load(Ordering::Relaxed),
            failed_calls: self.failures.load(Ordering::Relaxed),
            deadline_hit: self.deadline_hit.load(Ordering::Relaxed),
        }
    }
}

/// Everything a search stage needs for one request.
pub struct SearchContext<'a, F> {
    pub feed: &'a F,
    pub network: &'a StaticNetwork,
    pub config: &'a PlannerConfig,
    pub stats: &'a SearchStats,
    pub deadline: Deadline,
}

impl<'a, F: TransitFeed> SearchContext<'a, F> {
    pub fn new(
        feed: &'a F,
        network: &'a StaticNetwork,
        config: &'a PlannerConfig,
        stats: &'a SearchStats,
        deadline: Deadline,
    ) -> Self {
        Self {
            feed,
            network,
            config,
            stats,
            deadline,
        }
    }

    /// Returns true, and records it, once the deadline has passed.
    pub fn out_of_time(&self) -> bool {
        if self.deadline.expired() {
            self.stats.mark_deadline();
            true
        } else {
            false
        }
    }

    /// Predictions at a stop.
    pub async fn predictions(&self, query: &PredictionQuery) -> Attempt<Vec<Departure>> {
        let result = self.feed.predictions(query).await;
        self.stats.record(
            format_args!("predictions at {}", query.stop),
            Attempt::from_list(result),
        )
    }

    /// A trip's ordered stop sequence.
    pub async fn trip_schedule(&self, trip: &TripId) -> Attempt<Vec<Departure>> {
        let result = self
            .feed
            .trip_schedule(trip, self.config.schedule_limit)
            .await;
        self.stats
            .record(format_args!("schedule for trip {trip}"), Attempt::from_list(result))
    }

    /// Live geographic stop listing.
    pub async fn nearby_stops(
        &self,
        at: Coordinates,
        radius_m: f64,
        limit: usize,
    ) -> Attempt<Vec<Stop>> {
        let result = self.feed.nearby_stops(at, radius_m, limit).await;
        self.stats.record(
            format_args!("nearby stops around {:.5},{:.5}", at.lat, at.lon),
            Attempt::from_list(result),
        )
    }

    /// Name search.
    pub async fn search_stops(&self, query: &str, limit: usize) -> Attempt<Vec<Stop>> {
        let result = self.feed.search_stops(query, limit).await;
        self.stats
            .record(format_args!("stop search {query:?}"), Attempt::from_list(result))
    }

    /// A single stop.
    pub async fn stop(&self, id: &StopId) -> Attempt<Stop> {
        let result: Result<Stop, FeedError> = self.feed.stop(id).await;
        self.stats.record(format_args!("stop {id}"), result.into())
    }
}
