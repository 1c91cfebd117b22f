//! Trip planning and route search.
//!
//! This module answers "how do I get from here to there on the network
//! right now?" It locates stops near both ends, then searches live
//! predictions and trip schedules for direct rides, two-leg transfers and
//! longer multi-hop itineraries, falling back to estimated timings and
//! finally to non-transit suggestions.
//!
//! Every search is best-effort. A failed feed call skips one candidate
//! rather than failing the plan, and all work is bounded by fixed caps in
//! [`PlannerConfig`] and a per-call deadline.

mod alerts;
mod alternatives;
mod config;
mod context;
mod direct;
mod feed;
mod graph;
mod interchange;
mod locate;
mod rank;
mod ride;
mod search;
mod transfer;


pub use alerts::{affected_routes, is_relevant};
pub use alternatives::{Cost, ModeSuggestion, Reliability, TravelMode, suggest};
pub use config::PlannerConfig;
pub use context::{Deadline, SearchStats, StatsSnapshot};
pub use feed::{Attempt, FeedError, PredictionQuery, TransitFeed};
pub use graph::QueueKey;
pub use interchange::{Accessibility, TransferCandidate, find_transfer_stations};
pub use rank::{Signature, dedupe, rank};
pub use search::{
    AlternativeReason, DEFAULT_MAX_TRANSFERS, DEFAULT_MAX_WALK_M, PlanError, PlanOutcome,
    SearchParameters, TripPlan, TripPlanner, TripRequest,
};
