//! Interchange selection.
//!
//! Picks the registry stations that can join the origin's routes to the
//! destination's, drops the ones current alerts make unsafe, and orders the
//! rest by reliability and accessibility.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::Serialize;

use crate::domain::{Alert, RouteId, Stop};
use crate::registry::{TransferRegistry, TransferStation};

use super::alerts::affected_routes;

/// Accessibility class of an interchange. Ordered worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Accessibility {
    Unknown,
    Medium,
    High,
}

/// A usable interchange, scored against the current alerts.
#[derive(Debug, Clone)]
pub struct TransferCandidate<'a> {
    pub station: &'a TransferStation,
    /// 0.0 (avoid) to 1.0 (no known issues).
    pub reliability: f64,
    pub accessibility: Accessibility,
}

impl TransferCandidate<'_> {
    fn rank_cmp(&self, other: &Self) -> Ordering {
        self.reliability
            .total_cmp(&other.reliability)
            .then(self.accessibility.cmp(&other.accessibility))
            .then(self.station.walk_minutes.cmp(&other.station.walk_minutes))
    }
}

/// Routes assumed to serve the destination, inferred from stop names.
pub fn destination_routes(registry: &TransferRegistry, dest_stops: &[Stop]) -> HashSet<RouteId> {
    dest_stops
        .iter()
        .flat_map(|s| registry.infer_routes(&s.name))
        .collect()
}

/// Score one station: start at 1.0, lose 0.5, 0.3 or 0.1 for every alert
/// entity naming it (severity 7+, 5+, below 5), gain 0.1 for a reliable
/// hub, clamp to `[0, 1]`.
pub fn reliability(
    registry: &TransferRegistry,
    station: &TransferStation,
    alerts: &[Alert],
) -> f64 {
    let mut score = 1.0;

    for alert in alerts {
        let hits = alert.stops().filter(|s| **s == station.id).count();
        let penalty = match alert.severity {
            7.. => 0.5,
            5..=6 => 0.3,
            _ => 0.1,
        };
        score -= penalty * hits as f64;
    }

    if registry.is_reliable_hub(&station.id) {
        score += 0.1;
    }

    f64::clamp(score, 0.0, 1.0)
}

fn accessibility(registry: &TransferRegistry, station: &TransferStation) -> Accessibility {
    if registry.is_accessible_hub(&station.id) {
        Accessibility::High
    } else {
        Accessibility::Medium
    }
}

/// Interchanges joining `origin_routes` to the routes inferred for
/// `dest_stops`, best first.
///
/// Nothing is returned if either side's routes are named by an alert.
/// Stations named by an alert are dropped individually.
pub fn find_transfer_stations<'a>(
    registry: &'a TransferRegistry,
    origin_routes: &HashSet<RouteId>,
    dest_stops: &[Stop],
    alerts: &[Alert],
) -> Vec<TransferCandidate<'a>> {
    let dest_routes = destination_routes(registry, dest_stops);
    let affected = affected_routes(alerts);

    if !origin_routes.is_disjoint(&affected) || !dest_routes.is_disjoint(&affected) {
        return Vec::new();
    }

    let mut candidates: Vec<TransferCandidate<'a>> = registry
        .stations()
        .iter()
        .filter(|s| s.serves_any(origin_routes) && s.serves_any(&dest_routes))
        .filter(|s| !alerts.iter().any(|a| a.names_stop(&s.id)))
        .map(|station| TransferCandidate {
            station,
            reliability: reliability(registry, station, alerts),
            accessibility: accessibility(registry, station),
        })
        .collect();

    candidates.sort_by(|a, b| b.rank_cmp(a));
    candidates
}
