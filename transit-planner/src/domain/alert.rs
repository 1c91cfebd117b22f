//! Service alerts.

use serde::Serialize;

use super::{RouteId, StopId};

/// Alert lifecycle as reported by the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Lifecycle {
    New,
    Ongoing,
    OngoingUpcoming,
    Upcoming,
    Other(String),
}

impl Lifecycle {
    pub fn parse(s: &str) -> Self {
        match s {
            "NEW" => Lifecycle::New,
            "ONGOING" => Lifecycle::Ongoing,
            "ONGOING_UPCOMING" => Lifecycle::OngoingUpcoming,
            "UPCOMING" => Lifecycle::Upcoming,
            other => Lifecycle::Other(other.to_string()),
        }
    }

    /// Only ongoing alerts affect a trip planned now.
    pub fn is_active(&self) -> bool {
        matches!(self, Lifecycle::Ongoing)
    }
}

/// A route and/or stop an alert applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InformedEntity {
    pub route: Option<RouteId>,
    pub stop: Option<StopId>,
}

/// A service alert.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub id: String,
    /// Ordinal severity, 0 (informational) to 10 (most severe).
    pub severity: u8,
    pub lifecycle: Lifecycle,
    pub informed_entities: Vec<InformedEntity>,
    pub header: Option<String>,
}

impl Alert {
    /// Routes named by this alert.
    pub fn routes(&self) -> impl Iterator<Item = &RouteId> {
        self.informed_entities.iter().filter_map(|e| e.route.as_ref())
    }

    /// Stops named by this alert.
    pub fn stops(&self) -> impl Iterator<Item = &StopId> {
        self.informed_entities.iter().filter_map(|e| e.stop.as_ref())
    }

    /// Returns true if this alert names `stop` in its informed entities.
    pub fn names_stop(&self, stop: &StopId) -> bool {
        self.stops().any(|s| s == stop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_parsing() {
        assert_eq!(Lifecycle::parse("ONGOING"), Lifecycle::Ongoing);
        assert!(Lifecycle::parse("ONGOING").is_active());
        assert!(!Lifecycle::parse("UPCOMING").is_active());
        assert!(!Lifecycle::parse("NEW").is_active());
        assert_eq!(
            Lifecycle::parse("SOMETHING"),
            Lifecycle::Other("SOMETHING".into())
        );
    }

    #[test]
    fn routes_and_stops() {
        let alert = Alert {
            id: "1".into(),
            severity: 7,
            lifecycle: Lifecycle::Ongoing,
            informed_entities: vec![
                InformedEntity {
                    route: Some(RouteId::parse("Red").unwrap()),
                    stop: None,
                },
                InformedEntity {
                    route: Some(RouteId::parse("Red").unwrap()),
                    stop: Some(StopId::parse("place-pktrm").unwrap()),
                },
            ],
            header: None,
        };

        assert_eq!(alert.routes().count(), 2);
        assert!(alert.names_stop(&StopId::parse("place-pktrm").unwrap()));
        assert!(!alert.names_stop(&StopId::parse("place-dtnxg").unwrap()));
    }
}
