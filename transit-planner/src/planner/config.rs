//! Planner configuration.
//!
//! The planner is best-effort: it bounds work with fixed candidate and
//! result caps rather than searching exhaustively. Every cap lives here.

use std::time::Duration;

/// Configuration parameters for trip planning.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Stops located on each side of the trip.
    pub stops_per_side: usize,

    /// Origin stops searched from.
    pub max_origin_stops: usize,

    /// Predictions fetched per origin stop.
    pub prediction_limit: usize,

    /// Stops fetched per trip schedule.
    pub schedule_limit: usize,

    /// Near-term departures inspected per origin stop by direct search.
    pub direct_departures: usize,

    /// Direct results kept per origin stop.
    pub max_direct_results: usize,

    /// Departures inspected for first legs by exact transfer search.
    pub transfer_first_legs: usize,

    /// Second legs reaching a destination combined with each first leg.
    pub transfer_second_legs: usize,

    /// Predictions fetched at an interchange.
    pub transfer_prediction_limit: usize,

    /// Exact transfer results kept per origin stop.
    pub max_transfer_results: usize,

    /// Departures used by the estimated transfer search.
    pub estimated_departures: usize,

    /// Interchanges used by the estimated transfer search.
    pub estimated_stations: usize,

    /// Estimated results kept per origin stop.
    pub max_estimated_results: usize,

    /// Departures seeding the graph search.
    pub graph_seed_departures: usize,

    /// Graph search result quota.
    pub graph_max_results: usize,

    /// Connections considered at each downstream stop.
    pub graph_connections_per_stop: usize,

    /// Predictions fetched per downstream stop.
    pub graph_prediction_limit: usize,

    /// States popped before the graph search gives up.
    pub graph_max_expansions: usize,

    /// Minimum time required for a connection (minutes).
    /// Connections tighter than this are rejected.
    pub min_connection_mins: i64,

    /// Itineraries returned to the caller.
    pub max_results: usize,

    /// Alerts fetched per request.
    pub alert_limit: usize,

    /// Severity at or above which an alert is always relevant.
    pub high_severity: u8,

    /// Maximum number of stops to fetch predictions for in parallel.
    pub batch_size: usize,

    /// Wall-clock budget for one planning call (seconds).
    pub deadline_secs: u64,
}

impl PlannerConfig {
    /// Returns the planning deadline as a Duration.
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }

    /// Returns the minimum connection time as a chrono Duration.
    pub fn min_connection(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.min_connection_mins)
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            stops_per_side: 10,
            max_origin_stops: 5,
            prediction_limit: 50,
            schedule_limit: 50,
            direct_departures: 3,
            max_direct_results: 5,
            transfer_first_legs: 3,
            transfer_second_legs: 2,
            transfer_prediction_limit: 30,
            max_transfer_results: 10,
            estimated_departures: 2,
            estimated_stations: 2,
            max_estimated_results: 3,
            graph_seed_departures: 20,
            graph_max_results: 10,
            graph_connections_per_stop: 10,
            graph_prediction_limit: 20,
            graph_max_expansions: 250,
            min_connection_mins: 5,
            max_results: 5,
            alert_limit: 100,
            high_severity: 5,
            batch_size: 8,
            deadline_secs: 20,
        }
    }
}
