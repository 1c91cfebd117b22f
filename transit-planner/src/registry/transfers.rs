//! Interchange stations and line inference.
//!
//! The registry lists the stations where two or more lines meet, with a
//! fixed platform-to-platform walking time. It also carries the hub
//! allowlists used when scoring interchanges, and the name tokens used to
//! guess which line serves a stop when no route data is available.

use std::collections::HashSet;

use crate::domain::{RouteId, StopId};

/// A known interchange between lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferStation {
    pub id: StopId,
    pub name: String,
    pub lines: Vec<RouteId>,
    /// Walking time between platforms, in minutes.
    pub walk_minutes: u32,
}

impl TransferStation {
    /// Returns true if this station serves any of `routes`.
    pub fn serves_any(&self, routes: &HashSet<RouteId>) -> bool {
        self.lines.iter().any(|l| routes.contains(l))
    }
}

/// Registry of interchange stations.
#[derive(Debug, Clone, Default)]
pub struct TransferRegistry {
    stations: Vec<TransferStation>,
    /// Hubs that get a reliability bonus (more service, more alternatives).
    reliable_hubs: HashSet<StopId>,
    /// Hubs classed as highly accessible.
    accessible_hubs: HashSet<StopId>,
    /// Lowercase name token and the route it implies, checked in order.
    line_tokens: Vec<(String, RouteId)>,
    /// Routes assumed when no token matches.
    default_routes: Vec<RouteId>,
}

impl TransferRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// All interchange stations in registration order.
    pub fn stations(&self) -> &[TransferStation] {
        &self.stations
    }

    pub fn get(&self, id: &StopId) -> Option<&TransferStation> {
        self.stations.iter().find(|s| &s.id == id)
    }

    pub fn is_reliable_hub(&self, id: &StopId) -> bool {
        self.reliable_hubs.contains(id)
    }

    pub fn is_accessible_hub(&self, id: &StopId) -> bool {
        self.accessible_hubs.contains(id)
    }

    /// Guess the routes serving a stop from its name.
    ///
    /// The first matching token wins. With no match the default routes are
    /// returned. This is a coarse stand-in for real stop-to-route data.
    pub fn infer_routes(&self, stop_name: &str) -> Vec<RouteId> {
        let lower = stop_name.to_lowercase();
        self.line_tokens
            .iter()
            .find(|(token, _)| lower.contains(token.as_str()))
            .map(|(_, route)| vec![route.clone()])
            .unwrap_or_else(|| self.default_routes.clone())
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

/// Builder for a transfer registry.
///
/// Entries with invalid ids are skipped.
#[derive(Debug, Default)]
pub struct TransferRegistryBuilder {
    inner: TransferRegistry,
}

impl TransferRegistryBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an interchange station.
    pub fn station(mut self, id: &str, name: &str, lines: &[&str], walk_minutes: u32) -> Self {
        if let Ok(id) = StopId::parse(id) {
            let lines = lines.iter().filter_map(|l| RouteId::parse(l).ok()).collect();
            self.inner.stations.push(TransferStation {
                id,
                name: name.to_string(),
                lines,
                walk_minutes,
            });
        }
        self
    }

    /// Mark a station as a reliability hub.
    pub fn reliable_hub(mut self, id: &str) -> Self {
        if let Ok(id) = StopId::parse(id) {
            self.inner.reliable_hubs.insert(id);
        }
        self
    }

    /// Mark a station as highly accessible.
    pub fn accessible_hub(mut self, id: &str) -> Self {
        if let Ok(id) = StopId::parse(id) {
            self.inner.accessible_hubs.insert(id);
        }
        self
    }

    /// Map a name token to a route for line inference.
    pub fn line_token(mut self, token: &str, route: &str) -> Self {
        if let Ok(route) = RouteId::parse(route) {
            self.inner.line_tokens.push((token.to_lowercase(), route));
        }
        self
    }

    /// Routes assumed when no line token matches.
    pub fn default_routes(mut self, routes: &[&str]) -> Self {
        self.inner.default_routes = routes.iter().filter_map(|r| RouteId::parse(r).ok()).collect();
        self
    }

    /// Build the registry.
    pub fn build(self) -> TransferRegistry {
        self.inner
    }
}

/// The major interchanges of the Boston subway network.
pub fn boston_interchanges() -> TransferRegistry {
    const GREEN: [&str; 4] = ["Green-B", "Green-C", "Green-D", "Green-E"];

    TransferRegistryBuilder::new()
        .station("place-dtnxg", "Downtown Crossing", &["Red", "Orange"], 2)
        .station(
            "place-pktrm",
            "Park Street",
            &["Red", GREEN[0], GREEN[1], GREEN[2], GREEN[3]],
            3,
        )
        .station("place-state", "State", &["Blue", "Orange"], 2)
        .station(
            "place-gover",
            "Government Center",
            &["Blue", GREEN[0], GREEN[1], GREEN[2], GREEN[3]],
            3,
        )
        .station(
            "place-north",
            "North Station",
            &["Green-C", "Green-E", "Orange"],
            3,
        )
        .station(
            "place-bbsta",
            "Back Bay",
            &["Orange", "CR-Worcester", "CR-Needham", "CR-Franklin", "CR-Providence"],
            3,
        )
        .station(
            "place-rugg",
            "Ruggles",
            &["Orange", "CR-Needham", "CR-Franklin", "CR-Providence"],
            2,
        )
        .station("place-forhl", "Forest Hills", &["Orange", "CR-Needham"], 3)
        .reliable_hub("place-dtnxg")
        .reliable_hub("place-pktrm")
        .reliable_hub("place-state")
        .reliable_hub("place-gover")
        .accessible_hub("place-dtnxg")
        .accessible_hub("place-pktrm")
        .accessible_hub("place-state")
        .accessible_hub("place-gover")
        .accessible_hub("place-north")
        .accessible_hub("place-sstat")
        .line_token("red", "Red")
        .line_token("blue", "Blue")
        .line_token("orange", "Orange")
        .default_routes(&GREEN)
        .build()
}
