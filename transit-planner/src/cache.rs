//! Caching layer for live feed responses.
//!
//! A single planning call asks for the same stop's predictions, or the same
//! trip's schedule, several times across its search stages, and concurrent
//! requests overlap heavily around busy stations. Every [`TransitFeed`]
//! operation gets its own short-lived cache keyed by the call's parameters.
//!
//! Only successes are cached: a failed call is retried by the next caller.
//! Coordinates are bucketed to five decimal places (about a metre) so that
//! floating point noise does not defeat the cache.

use std::future::Future;
use std::hash::Hash;
use std::time::Duration;

use moka::future::Cache as MokaCache;

use crate::domain::{Alert, Coordinates, Departure, RouteId, Stop, StopId, TransitMode, TripId};
use crate::planner::{FeedError, PredictionQuery, TransitFeed};

/// Cache key for nearby stop lookups: (lat bucket, lon bucket, radius in
/// metres, limit).
type NearbyKey = (i64, i64, u64, usize);

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries per operation.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(10),
            max_capacity: 2000,
        }
    }
}

fn build<K, V>(config: &CacheConfig) -> MokaCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    MokaCache::builder()
        .time_to_live(config.ttl)
        .max_capacity(config.max_capacity)
        .build()
}

/// Round a coordinate to a cache bucket.
fn bucket(degrees: f64) -> i64 {
    (degrees * 1e5).round() as i64
}

/// Return the cached value for `key`, or run `fetch` and cache its success.
async fn cached<K, V, Fut>(cache: &MokaCache<K, V>, key: K, fetch: Fut) -> Result<V, FeedError>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<V, FeedError>>,
{
    if let Some(hit) = cache.get(&key).await {
        return Ok(hit);
    }

    let value = fetch.await?;
    cache.insert(key, value.clone()).await;
    Ok(value)
}

/// Transit feed with caching.
///
/// Wraps any [`TransitFeed`] and is itself one, so the planner is unaware
/// of it.
pub struct CachedFeed<F> {
    inner: F,
    nearby: MokaCache<NearbyKey, Vec<Stop>>,
    predictions: MokaCache<PredictionQuery, Vec<Departure>>,
    schedules: MokaCache<(TripId, usize), Vec<Departure>>,
    alerts: MokaCache<usize, Vec<Alert>>,
    searches: MokaCache<(String, usize), Vec<Stop>>,
    stops: MokaCache<StopId, Stop>,
    route_modes: MokaCache<RouteId, Option<TransitMode>>,
}

impl<F: TransitFeed> CachedFeed<F> {
    /// Create a new cached feed.
    pub fn new(inner: F, config: &CacheConfig) -> Self {
        Self {
            inner,
            nearby: build(config),
            predictions: build(config),
            schedules: build(config),
            alerts: build(config),
            searches: build(config),
            stops: build(config),
            route_modes: build(config),
        }
    }

    /// Access the underlying feed for operations that bypass the cache.
    pub fn inner(&self) -> &F {
        &self.inner
    }

    /// Approximate number of cached entries across all operations.
    pub fn entry_count(&self) -> u64 {
        self.nearby.entry_count()
            + self.predictions.entry_count()
            + self.schedules.entry_count()
            + self.alerts.entry_count()
            + self.searches.entry_count()
            + self.stops.entry_count()
            + self.route_modes.entry_count()
    }

    /// Invalidate all cached entries.
    pub fn invalidate_all(&self) {
        self.nearby.invalidate_all();
        self.predictions.invalidate_all();
        self.schedules.invalidate_all();
        self.alerts.invalidate_all();
        self.searches.invalidate_all();
        self.stops.invalidate_all();
        self.route_modes.invalidate_all();
    }
}

impl<F: TransitFeed> TransitFeed for CachedFeed<F> {
    async fn nearby_stops(
        &self,
        at: Coordinates,
        radius_m: f64,
        limit: usize,
    ) -> Result<Vec<Stop>, FeedError> {
        let key = (bucket(at.lat), bucket(at.lon), radius_m.round() as u64, limit);
        cached(
            &self.nearby,
            key,
            self.inner.nearby_stops(at, radius_m, limit),
        )
        .await
    }

    async fn predictions(&self, query: &PredictionQuery) -> Result<Vec<Departure>, FeedError> {
        cached(
            &self.predictions,
            query.clone(),
            self.inner.predictions(query),
        )
        .await
    }

    async fn trip_schedule(&self, trip: &TripId, limit: usize) -> Result<Vec<Departure>, FeedError> {
        cached(
            &self.schedules,
            (trip.clone(), limit),
            self.inner.trip_schedule(trip, limit),
        )
        .await
    }

    async fn alerts(&self, limit: usize) -> Result<Vec<Alert>, FeedError> {
        cached(&self.alerts, limit, self.inner.alerts(limit)).await
    }

    async fn search_stops(&self, query: &str, limit: usize) -> Result<Vec<Stop>, FeedError> {
        let key = (query.trim().to_lowercase(), limit);
        cached(&self.searches, key, self.inner.search_stops(query, limit)).await
    }

    async fn stop(&self, id: &StopId) -> Result<Stop, FeedError> {
        cached(&self.stops, id.clone(), self.inner.stop(id)).await
    }

    async fn route_mode(&self, route: &RouteId) -> Result<Option<TransitMode>, FeedError> {
        cached(&self.route_modes, route.clone(), self.inner.route_mode(route)).await
    }
}
