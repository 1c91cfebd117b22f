//! Application state for the web layer.

use std::sync::Arc;

use crate::planner::{PlannerConfig, TransitFeed, TripPlanner};
use crate::registry::StaticNetwork;

/// Shared application state.
///
/// Contains all the services needed to handle requests.
pub struct AppState<F> {
    /// Live feed, usually a cached MBTA client
    pub feed: Arc<F>,

    /// Static catalog, interchanges and timing patterns
    pub network: Arc<StaticNetwork>,

    /// Trip planner configuration
    pub config: Arc<PlannerConfig>,
}

impl<F> Clone for AppState<F> {
    fn clone(&self) -> Self {
        Self {
            feed: Arc::clone(&self.feed),
            network: Arc::clone(&self.network),
            config: Arc::clone(&self.config),
        }
    }
}

impl<F: TransitFeed> AppState<F> {
    /// Create a new app state.
    pub fn new(feed: F, network: StaticNetwork, config: PlannerConfig) -> Self {
        Self {
            feed: Arc::new(feed),
            network: Arc::new(network),
            config: Arc::new(config),
        }
    }

    /// A planner borrowing this state.
    pub fn planner(&self) -> TripPlanner<'_, F> {
        TripPlanner::new(&self.feed, &self.network, &self.config)
    }
}
