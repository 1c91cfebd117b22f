//! MBTA V3 API HTTP client.
//!
//! Provides async methods for querying the MBTA V3 API and implements
//! [`TransitFeed`] on top of them. Handles authentication, concurrency
//! limiting, and conversion to domain types.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::domain::{Alert, Coordinates, Departure, RouteId, Stop, StopId, TransitMode, TripId};
use crate::planner::{FeedError, PredictionQuery, TransitFeed};

use super::convert::{
    convert_alerts, convert_departures, convert_route_mode, convert_stop, convert_stops,
};
use super::error::MbtaError;
use super::types::{
    AlertAttributes, Document, Resource, RouteAttributes, StopAttributes, TimeAttributes,
};

/// Default base URL for the MBTA V3 API.
const DEFAULT_BASE_URL: &str = "https://api-v3.mbta.com";

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 5;

/// Metres per degree of latitude. The API's radius filter is in degrees.
const METRES_PER_DEGREE: f64 = 111_320.0;

/// Route types searched by name: light rail and subway.
const NAME_SEARCH_ROUTE_TYPES: &str = "0,1";

/// Configuration for the MBTA client.
#[derive(Debug, Clone)]
pub struct MbtaConfig {
    /// API key. The API serves anonymous requests at a lower rate limit.
    pub api_key: Option<String>,
    /// Base URL for the API (defaults to production)
    pub base_url: String,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl MbtaConfig {
    /// Create a new config with an optional API key.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: 30,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// MBTA V3 API client.
///
/// Uses a semaphore to limit concurrent requests and avoid rate limiting.
#[derive(Debug, Clone)]
pub struct MbtaClient {
    http: reqwest::Client,
    base_url: String,
    semaphore: Arc<Semaphore>,
}

impl MbtaClient {
    /// Create a new MBTA client with the given configuration.
    pub fn new(config: MbtaConfig) -> Result<Self, MbtaError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "accept",
            HeaderValue::from_static("application/vnd.api+json"),
        );

        if let Some(key) = &config.api_key {
            let api_key = HeaderValue::from_str(key).map_err(|_| MbtaError::ApiError {
                status: 0,
                message: "Invalid API key format".to_string(),
            })?;
            headers.insert("x-api-key", api_key);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            semaphore: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
        })
    }

    /// GET a path and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, MbtaError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| MbtaError::ApiError {
                status: 0,
                message: "Semaphore closed".to_string(),
            })?;

        let url = format!("{}{}", self.base_url, path);
        debug!(%url, ?query, "MBTA request");

        let response = self.http.get(&url).query(query).send().await?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(MbtaError::Unauthorized);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(MbtaError::RateLimited);
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(MbtaError::NotFound(path.to_string()));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MbtaError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| MbtaError::Json {
            message: e.to_string(),
            body: Some(body.chars().take(500).collect()),
        })
    }

    /// Stops near a point, nearest first.
    pub async fn get_nearby_stops(
        &self,
        at: Coordinates,
        radius_m: f64,
        limit: usize,
    ) -> Result<Vec<Stop>, MbtaError> {
        let doc: Document<Vec<Resource<StopAttributes>>> = self
            .get_json(
                "/stops",
                &[
                    ("filter[latitude]", at.lat.to_string()),
                    ("filter[longitude]", at.lon.to_string()),
                    ("filter[radius]", (radius_m / METRES_PER_DEGREE).to_string()),
                    ("sort", "distance".to_string()),
                    ("page[limit]", limit.to_string()),
                ],
            )
            .await?;
        Ok(convert_stops(&doc.data))
    }

    /// Predictions at a stop, with trip and stop resources included.
    pub async fn get_predictions(
        &self,
        query: &PredictionQuery,
    ) -> Result<Vec<Departure>, MbtaError> {
        let mut params = vec![
            ("filter[stop]", query.stop.to_string()),
            ("sort", "departure_time".to_string()),
            ("include", "stop,trip".to_string()),
            ("page[limit]", query.limit.to_string()),
        ];
        if let Some(route) = &query.route {
            params.push(("filter[route]", route.to_string()));
        }
        if let Some(direction) = query.direction {
            params.push(("filter[direction_id]", direction.to_string()));
        }

        let doc: Document<Vec<Resource<TimeAttributes>>> =
            self.get_json("/predictions", &params).await?;
        Ok(convert_departures(&doc))
    }

    /// Scheduled stops of one trip, in stop sequence order.
    pub async fn get_trip_schedule(
        &self,
        trip: &TripId,
        limit: usize,
    ) -> Result<Vec<Departure>, MbtaError> {
        let doc: Document<Vec<Resource<TimeAttributes>>> = self
            .get_json(
                "/schedules",
                &[
                    ("filter[trip]", trip.to_string()),
                    ("sort", "stop_sequence".to_string()),
                    ("include", "stop,trip".to_string()),
                    ("page[limit]", limit.to_string()),
                ],
            )
            .await?;
        Ok(convert_departures(&doc))
    }

    /// Current service alerts.
    pub async fn get_alerts(&self, limit: usize) -> Result<Vec<Alert>, MbtaError> {
        let doc: Document<Vec<Resource<AlertAttributes>>> = self
            .get_json("/alerts", &[("page[limit]", limit.to_string())])
            .await?;
        Ok(convert_alerts(&doc.data))
    }

    /// Rapid transit stops whose name contains `query`, best match first.
    ///
    /// The API has no name filter, so matching happens client side.
    pub async fn search_stops_by_name(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Stop>, MbtaError> {
        let doc: Document<Vec<Resource<StopAttributes>>> = self
            .get_json(
                "/stops",
                &[("filter[route_type]", NAME_SEARCH_ROUTE_TYPES.to_string())],
            )
            .await?;
        Ok(rank_by_name(convert_stops(&doc.data), query, limit))
    }

    /// A single stop by id.
    pub async fn get_stop(&self, id: &StopId) -> Result<Stop, MbtaError> {
        let doc: Document<Resource<StopAttributes>> =
            self.get_json(&format!("/stops/{id}"), &[]).await?;
        convert_stop(&doc.data).map_err(|e| MbtaError::Json {
            message: e.to_string(),
            body: None,
        })
    }

    /// Mode of a route.
    pub async fn get_route_mode(&self, route: &RouteId) -> Result<Option<TransitMode>, MbtaError> {
        let doc: Document<Resource<RouteAttributes>> =
            self.get_json(&format!("/routes/{route}"), &[]).await?;
        Ok(convert_route_mode(&doc.data))
    }
}

/// Keep stops whose name contains `query` (case-insensitive), exact
/// matches first, then prefix matches, then the rest.
fn rank_by_name(stops: Vec<Stop>, query: &str, limit: usize) -> Vec<Stop> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let mut matches: Vec<(u8, Stop)> = stops
        .into_iter()
        .filter_map(|stop| {
            let name = stop.name.to_lowercase();
            let score = if name == needle {
                0
            } else if name.starts_with(&needle) {
                1
            } else if name.contains(&needle) {
                2
            } else {
                return None;
            };
            Some((score, stop))
        })
        .collect();

    matches.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.name.cmp(&b.1.name)));
    matches.into_iter().take(limit).map(|(_, s)| s).collect()
}

impl TransitFeed for MbtaClient {
    async fn nearby_stops(
        &self,
        at: Coordinates,
        radius_m: f64,
        limit: usize,
    ) -> Result<Vec<Stop>, FeedError> {
        self.get_nearby_stops(at, radius_m, limit)
            .await
            .map_err(|e| e.into_feed_error("nearby stops"))
    }

    async fn predictions(&self, query: &PredictionQuery) -> Result<Vec<Departure>, FeedError> {
        self.get_predictions(query)
            .await
            .map_err(|e| e.into_feed_error("predictions"))
    }

    async fn trip_schedule(&self, trip: &TripId, limit: usize) -> Result<Vec<Departure>, FeedError> {
        self.get_trip_schedule(trip, limit)
            .await
            .map_err(|e| e.into_feed_error("schedules"))
    }

    async fn alerts(&self, limit: usize) -> Result<Vec<Alert>, FeedError> {
        self.get_alerts(limit)
            .await
            .map_err(|e| e.into_feed_error("alerts"))
    }

    async fn search_stops(&self, query: &str, limit: usize) -> Result<Vec<Stop>, FeedError> {
        self.search_stops_by_name(query, limit)
            .await
            .map_err(|e| e.into_feed_error("stop search"))
    }

    async fn stop(&self, id: &StopId) -> Result<Stop, FeedError> {
        self.get_stop(id)
            .await
            .map_err(|e| e.into_feed_error("stops"))
    }

    async fn route_mode(&self, route: &RouteId) -> Result<Option<TransitMode>, FeedError> {
        self.get_route_mode(route)
            .await
            .map_err(|e| e.into_feed_error("routes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder() {
        let config = MbtaConfig::new(Some("test-key".into()))
            .with_base_url("http://localhost:8080")
            .with_max_concurrent(10)
            .with_timeout(60);

        assert_eq!(config.api_key.as_deref(), Some("test-key"));
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.max_concurrent, 10);
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn config_defaults() {
        let config = MbtaConfig::new(None);

        assert!(config.api_key.is_none());
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.max_concurrent, DEFAULT_MAX_CONCURRENT);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn client_creation() {
        assert!(MbtaClient::new(MbtaConfig::new(None)).is_ok());
        assert!(MbtaClient::new(MbtaConfig::new(Some("key".into()))).is_ok());
        assert!(MbtaClient::new(MbtaConfig::new(Some("bad\nkey".into()))).is_err());
    }

    fn named(id: &str, name: &str) -> Stop {
        Stop::new(StopId::parse(id).unwrap(), name, None)
    }

    #[test]
    fn name_ranking() {
        let stops = vec![
            named("place-sstat", "South Station"),
            named("place-pktrm", "Park Street"),
            named("place-harsq", "Harvard"),
            named("place-symcl", "Symphony"),
            named("place-state", "State"),
        ];

        let found = rank_by_name(stops.clone(), "state", 10);
        let names: Vec<_> = found.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["State"]);

        let found = rank_by_name(stops.clone(), "st", 10);
        let names: Vec<_> = found.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["State", "Park Street", "South Station"]);

        assert!(rank_by_name(stops.clone(), "  ", 10).is_empty());
        assert_eq!(rank_by_name(stops, "st", 1).len(), 1);
    }

    // Live API tests would go here, but they make real HTTP requests and
    // depend on current service. They should be marked #[ignore].
}
