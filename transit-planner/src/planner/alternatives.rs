//! Non-transit suggestions for when no itinerary is found.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::domain::{Alert, Coordinates};
use crate::geo;

use super::alerts::affected_routes;

const MILES_PER_KM: f64 = 0.621371;

/// Fixed commuter rail fare range, zone 1A to zone 10.
const COMMUTER_RAIL_FARE: &str = "$2.40-13.25";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelMode {
    Walking,
    Biking,
    Rideshare,
    Taxi,
    CommuterRail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reliability {
    High,
    Medium,
}

/// Approximate cost of a suggestion.
#[derive(Debug, Clone, PartialEq)]
pub enum Cost {
    Free,
    /// Estimated fare in dollars.
    Estimate(f64),
    /// A published fare range.
    Range(&'static str),
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cost::Free => f.write_str("free"),
            Cost::Estimate(dollars) => write!(f, "${dollars:.2}"),
            Cost::Range(range) => f.write_str(range),
        }
    }
}

impl Serialize for Cost {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One alternative way to make the trip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModeSuggestion {
    pub mode: TravelMode,
    pub description: String,
    /// `None` when it depends on a timetable.
    pub duration_minutes: Option<u32>,
    pub distance_km: f64,
    pub accessibility: &'static str,
    pub cost: Cost,
    pub reliability: Reliability,
    pub suitable_for: Vec<&'static str>,
}

fn floor_minutes(km: f64, minutes_per_km: f64) -> u32 {
    (km * minutes_per_km).floor() as u32
}

/// Suggest ways to travel from `origin` to `dest` without the subway.
///
/// Based on straight-line distance: walking up to 3 km, biking from 1 to
/// 15 km, rideshare over 2 km and taxi over 1 km. Commuter rail is offered
/// unless an alert names a commuter rail route.
pub fn suggest(
    origin: Coordinates,
    dest: Coordinates,
    alerts: &[Alert],
    wheelchair: bool,
) -> Vec<ModeSuggestion> {
    let km = geo::distance_between(origin, dest);
    let miles = km * MILES_PER_KM;
    let mut suggestions = Vec::new();

    if km <= 3.0 {
        suggestions.push(ModeSuggestion {
            mode: TravelMode::Walking,
            description: format!("Walk {miles:.1} miles"),
            // 5 km/h
            duration_minutes: Some(floor_minutes(km, 12.0)),
            distance_km: km,
            accessibility: if wheelchair {
                "wheelchair_accessible"
            } else {
                "check_route"
            },
            cost: Cost::Free,
            reliability: Reliability::High,
            suitable_for: vec!["short_trips", "exercise", "no_baggage"],
        });
    }

    if (1.0..=15.0).contains(&km) {
        suggestions.push(ModeSuggestion {
            mode: TravelMode::Biking,
            description: format!("Bike {miles:.1} miles"),
            // 15 km/h
            duration_minutes: Some(floor_minutes(km, 4.0)),
            distance_km: km,
            accessibility: if wheelchair {
                "not_suitable"
            } else {
                "requires_bike"
            },
            cost: Cost::Free,
            reliability: Reliability::High,
            suitable_for: vec!["medium_trips", "exercise", "no_baggage"],
        });
    }

    let road_accessibility = if wheelchair {
        "wheelchair_accessible"
    } else {
        "standard"
    };

    if km > 2.0 {
        suggestions.push(ModeSuggestion {
            mode: TravelMode::Rideshare,
            description: format!("Rideshare {miles:.1} miles"),
            // 24 km/h
            duration_minutes: Some(floor_minutes(km, 2.5)),
            distance_km: km,
            accessibility: road_accessibility,
            cost: Cost::Estimate(2.50 + 1.50 * miles),
            reliability: Reliability::High,
            suitable_for: vec!["any_distance", "baggage", "comfort"],
        });
    }

    if km > 1.0 {
        suggestions.push(ModeSuggestion {
            mode: TravelMode::Taxi,
            description: format!("Taxi {miles:.1} miles"),
            duration_minutes: Some(floor_minutes(km, 2.5)),
            distance_km: km,
            accessibility: road_accessibility,
            cost: Cost::Estimate(3.00 + 2.00 * miles),
            reliability: Reliability::Medium,
            suitable_for: vec!["any_distance", "baggage", "comfort"],
        });
    }

    if !affected_routes(alerts).iter().any(|r| r.is_commuter_rail()) {
        suggestions.push(ModeSuggestion {
            mode: TravelMode::CommuterRail,
            description: "Use commuter rail as alternative".to_string(),
            duration_minutes: None,
            distance_km: km,
            accessibility: if wheelchair {
                "wheelchair_accessible"
            } else {
                "check_station"
            },
            cost: Cost::Range(COMMUTER_RAIL_FARE),
            reliability: Reliability::Medium,
            suitable_for: vec!["longer_trips", "baggage", "comfort"],
        });
    }

    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{InformedEntity, Lifecycle, RouteId};

    fn kendall() -> Coordinates {
        Coordinates::new(42.3623, -71.0952).unwrap()
    }

    fn copley() -> Coordinates {
        Coordinates::new(42.3505, -71.0845).unwrap()
    }

    fn route_alert(route: &str) -> Alert {
        Alert {
            id: "a".into(),
            severity: 7,
            lifecycle: Lifecycle::Ongoing,
            informed_entities: vec![InformedEntity {
                route: Some(RouteId::parse(route).unwrap()),
                stop: None,
            }],
            header: None,
        }
    }

    fn modes(suggestions: &[ModeSuggestion]) -> Vec<TravelMode> {
        suggestions.iter().map(|s| s.mode).collect()
    }

    #[test]
    fn short_trip_across_the_river() {
        // About 1.6 km
        let suggestions = suggest(kendall(), copley(), &[], false);
        assert_eq!(
            modes(&suggestions),
            vec![
                TravelMode::Walking,
                TravelMode::Biking,
                TravelMode::Taxi,
                TravelMode::CommuterRail,
            ]
        );

        let walk = &suggestions[0];
        assert_eq!(walk.duration_minutes, Some(18));
        assert_eq!(walk.cost, Cost::Free);
        assert_eq!(walk.description, "Walk 1.0 miles");
        assert_eq!(walk.accessibility, "check_route");
        assert_eq!(suggestions[1].duration_minutes, Some(6));
    }

    #[test]
    fn long_trip_drops_walking() {
        let braintree = Coordinates::new(42.2078, -71.0011).unwrap();
        let suggestions = suggest(kendall(), braintree, &[], false);
        assert_eq!(
            modes(&suggestions),
            vec![
                TravelMode::Rideshare,
                TravelMode::Taxi,
                TravelMode::CommuterRail,
            ]
        );

        let km = suggestions[0].distance_km;
        let miles = km * MILES_PER_KM;
        assert_eq!(suggestions[0].cost, Cost::Estimate(2.50 + 1.50 * miles));
        assert_eq!(suggestions[1].cost, Cost::Estimate(3.00 + 2.00 * miles));
        assert_eq!(suggestions[1].reliability, Reliability::Medium);
    }

    #[test]
    fn durations_round_down() {
        assert_eq!(floor_minutes(1.58, 12.0), 18);
        assert_eq!(floor_minutes(1.58, 2.5), 3);
        assert_eq!(floor_minutes(0.39, 2.5), 0);
    }

    #[test]
    fn zero_distance_is_walk_only() {
        let suggestions = suggest(kendall(), kendall(), &[], false);
        assert_eq!(
            modes(&suggestions),
            vec![TravelMode::Walking, TravelMode::CommuterRail]
        );
        assert_eq!(suggestions[0].duration_minutes, Some(0));
    }

    #[test]
    fn commuter_rail_alert_removes_rail_suggestion() {
        let suggestions = suggest(kendall(), copley(), &[route_alert("CR-Worcester")], false);
        assert!(!modes(&suggestions).contains(&TravelMode::CommuterRail));

        let suggestions = suggest(kendall(), copley(), &[route_alert("Red")], false);
        assert!(modes(&suggestions).contains(&TravelMode::CommuterRail));
    }

    #[test]
    fn wheelchair_labels() {
        let suggestions = suggest(kendall(), copley(), &[], true);
        let labels: Vec<_> = suggestions.iter().map(|s| s.accessibility).collect();
        assert_eq!(
            labels,
            vec![
                "wheelchair_accessible",
                "not_suitable",
                "wheelchair_accessible",
                "wheelchair_accessible",
            ]
        );
    }

    #[test]
    fn cost_serialization() {
        assert_eq!(serde_json::to_value(Cost::Free).unwrap(), "free");
        assert_eq!(serde_json::to_value(Cost::Estimate(4.5)).unwrap(), "$4.50");
        assert_eq!(
            serde_json::to_value(Cost::Range(COMMUTER_RAIL_FARE)).unwrap(),
            "$2.40-13.25"
        );
        assert_eq!(
            serde_json::to_value(TravelMode::CommuterRail).unwrap(),
            "commuter_rail"
        );
    }
}
