//! Alert filtering.
//!
//! Alerts are an optimisation: they steer interchange choice and explain an
//! empty result, but planning never waits on them. A failed fetch is
//! treated as "no alerts".

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::domain::{Alert, Coordinates, RouteId, Stop};

use super::context::SearchContext;
use super::feed::{Attempt, TransitFeed};

/// Routes whose disruption plausibly affects any trip across the core.
const MAJOR_ROUTES: [&str; 7] = [
    "Red", "Orange", "Blue", "Green-B", "Green-C", "Green-D", "Green-E",
];

/// Returns true if `alert` is worth considering for a trip planned now.
///
/// The alert must be ongoing, and either at or above `high_severity` or
/// naming one of the major routes.
pub fn is_relevant(alert: &Alert, high_severity: u8) -> bool {
    if !alert.lifecycle.is_active() {
        return false;
    }
    alert.severity >= high_severity || alert.routes().any(|r| MAJOR_ROUTES.contains(&r.as_str()))
}

/// Fetch the alerts relevant to a trip between `origin` and `dest`.
///
/// The corridor is approximated by the major routes; the coordinates are
/// only logged.
pub async fn relevant_alerts<F: TransitFeed>(
    ctx: &SearchContext<'_, F>,
    origin: Coordinates,
    dest: Coordinates,
) -> Vec<Alert> {
    let result = ctx.feed.alerts(ctx.config.alert_limit).await;
    let alerts = match ctx.stats.record("alerts", Attempt::from_list(result)) {
        Attempt::Found(alerts) => alerts,
        Attempt::Empty => return Vec::new(),
        Attempt::Failed(e) => {
            warn!(error = %e, "Alert fetch failed, planning without alerts");
            return Vec::new();
        }
    };

    let fetched = alerts.len();
    let relevant: Vec<Alert> = alerts
        .into_iter()
        .filter(|a| is_relevant(a, ctx.config.high_severity))
        .collect();

    debug!(
        fetched,
        relevant = relevant.len(),
        origin = ?(origin.lat, origin.lon),
        dest = ?(dest.lat, dest.lon),
        "Resolved alerts"
    );

    relevant
}

/// Every route named by any of `alerts`.
pub fn affected_routes(alerts: &[Alert]) -> HashSet<RouteId> {
    alerts.iter().flat_map(|a| a.routes().cloned()).collect()
}

/// Returns true if the stop id mentions any affected route id,
/// case-insensitively.
///
/// Stop ids rarely carry route names, so this is a coarse filter used only
/// for the re-plan after an empty first search.
pub fn stop_affected(stop: &Stop, routes: &HashSet<RouteId>) -> bool {
    let id = stop.id.as_str().to_lowercase();
    routes
        .iter()
        .any(|r| id.contains(&r.as_str().to_lowercase()))
}
