//! Conversion from MBTA DTOs to domain types.
//!
//! Individual bad records are logged and skipped; one malformed prediction
//! should not hide the rest of a stop's departures.

use std::collections::HashMap;

use chrono::DateTime;
use tracing::warn;

use crate::domain::{
    Alert, Coordinates, Departure, InformedEntity, Lifecycle, RouteId, Stop, StopId, TransitMode,
    TripId,
};

use super::types::{
    AlertAttributes, Document, IncludedAttributes, Resource, RouteAttributes, StopAttributes,
    TimeAttributes,
};

/// Error during DTO to domain conversion.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConversionError {
    /// An identifier was empty or malformed
    #[error("invalid id: {0}")]
    InvalidId(String),

    /// Failed to parse a time string
    #[error("invalid time: {0}")]
    InvalidTime(String),

    /// Missing required field
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

fn parse_id<T>(
    s: &str,
    parse: impl Fn(&str) -> Result<T, crate::domain::InvalidId>,
) -> Result<T, ConversionError> {
    parse(s).map_err(|e| ConversionError::InvalidId(format!("{s:?}: {e}")))
}

/// Convert a list of stop resources, skipping invalid ones.
pub fn convert_stops(resources: &[Resource<StopAttributes>]) -> Vec<Stop> {
    resources
        .iter()
        .filter_map(|r| match convert_stop(r) {
            Ok(stop) => Some(stop),
            Err(e) => {
                warn!(stop = %r.id, error = %e, "Skipping stop");
                None
            }
        })
        .collect()
}

/// Convert one stop resource.
pub fn convert_stop(resource: &Resource<StopAttributes>) -> Result<Stop, ConversionError> {
    let attrs = &resource.attributes;
    let id = parse_id(&resource.id, StopId::parse)?;
    let coords = Coordinates::from_feed(attrs.latitude, attrs.longitude);

    let mut stop =
        Stop::new(id, attrs.name.clone(), coords).with_wheelchair(attrs.wheelchair_boarding == Some(1));

    if let Some(mode) = attrs.vehicle_type.and_then(TransitMode::from_route_type) {
        stop = stop.with_mode(mode);
    }
    if let Some(parent) = resource.relationships.parent_station_id() {
        stop = stop.with_parent(parse_id(parent, StopId::parse)?);
    }

    Ok(stop)
}

/// Lookup tables built from a document's `included` array.
struct Included<'a> {
    trip_wheelchair: HashMap<&'a str, bool>,
    stop_parent: HashMap<&'a str, &'a str>,
}

impl<'a> Included<'a> {
    fn index(included: &'a [Resource<IncludedAttributes>]) -> Self {
        let mut trip_wheelchair = HashMap::new();
        let mut stop_parent = HashMap::new();

        for r in included {
            match r.kind.as_str() {
                "trip" => {
                    trip_wheelchair
                        .insert(r.id.as_str(), r.attributes.wheelchair_accessible == Some(1));
                }
                "stop" => {
                    if let Some(parent) = r.relationships.parent_station_id() {
                        stop_parent.insert(r.id.as_str(), parent);
                    }
                }
                _ => {}
            }
        }

        Self {
            trip_wheelchair,
            stop_parent,
        }
    }
}

/// Convert a prediction or schedule document, skipping invalid entries.
///
/// Trip accessibility and parent stations are read from the included
/// `trip` and `stop` resources when present.
pub fn convert_departures(doc: &Document<Vec<Resource<TimeAttributes>>>) -> Vec<Departure> {
    let included = Included::index(&doc.included);

    doc.data
        .iter()
        .filter_map(|r| match convert_departure(r, &included) {
            Ok(d) => Some(d),
            Err(e) => {
                warn!(record = %r.id, kind = %r.kind, error = %e, "Skipping departure");
                None
            }
        })
        .collect()
}

fn convert_departure(
    resource: &Resource<TimeAttributes>,
    included: &Included<'_>,
) -> Result<Departure, ConversionError> {
    let rels = &resource.relationships;
    let stop = rels.stop_id().ok_or(ConversionError::MissingField("stop"))?;
    let route = rels.route_id().ok_or(ConversionError::MissingField("route"))?;
    let trip = rels.trip_id().ok_or(ConversionError::MissingField("trip"))?;

    let parse_time = |s: &Option<String>| -> Result<_, ConversionError> {
        s.as_deref()
            .map(|t| {
                DateTime::parse_from_rfc3339(t)
                    .map_err(|_| ConversionError::InvalidTime(t.to_string()))
            })
            .transpose()
    };

    let parent_station = included
        .stop_parent
        .get(stop)
        .map(|p| parse_id(p, StopId::parse))
        .transpose()?;

    Ok(Departure {
        stop_id: parse_id(stop, StopId::parse)?,
        parent_station,
        route_id: parse_id(route, RouteId::parse)?,
        trip_id: parse_id(trip, TripId::parse)?,
        departure_time: parse_time(&resource.attributes.departure_time)?,
        arrival_time: parse_time(&resource.attributes.arrival_time)?,
        wheelchair_accessible: included.trip_wheelchair.get(trip).copied().unwrap_or(false),
    })
}

/// Convert alert resources. Informed entities with bad ids are dropped,
/// the alert itself is kept.
pub fn convert_alerts(resources: &[Resource<AlertAttributes>]) -> Vec<Alert> {
    resources.iter().map(convert_alert).collect()
}

fn convert_alert(resource: &Resource<AlertAttributes>) -> Alert {
    let attrs = &resource.attributes;
    let informed_entities = attrs
        .informed_entity
        .iter()
        .map(|e| InformedEntity {
            route: e.route.as_deref().and_then(|r| RouteId::parse(r).ok()),
            stop: e.stop.as_deref().and_then(|s| StopId::parse(s).ok()),
        })
        .filter(|e| e.route.is_some() || e.stop.is_some())
        .collect();

    Alert {
        id: resource.id.clone(),
        severity: attrs.severity,
        lifecycle: Lifecycle::parse(attrs.lifecycle.as_deref().unwrap_or("")),
        informed_entities,
        header: attrs.header.clone(),
    }
}

/// Mode of a route resource.
pub fn convert_route_mode(resource: &Resource<RouteAttributes>) -> Option<TransitMode> {
    TransitMode::from_route_type(resource.attributes.route_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stops_doc(json: &str) -> Document<Vec<Resource<StopAttributes>>> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn stop_with_parent_and_mode() {
        let doc = stops_doc(
            r#"{"data": [{
                "id": "70072", "type": "stop",
                "attributes": {"name": "Kendall/MIT", "latitude": 42.362491,
                    "longitude": -71.086176, "wheelchair_boarding": 1, "vehicle_type": 1},
                "relationships": {"parent_station": {"data": {"id": "place-knncl", "type": "stop"}}}
            }]}"#,
        );

        let stops = convert_stops(&doc.data);
        assert_eq!(stops.len(), 1);

        let stop = &stops[0];
        assert_eq!(stop.id.as_str(), "70072");
        assert_eq!(stop.mode, Some(TransitMode::Subway));
        assert!(stop.wheelchair_accessible);
        assert_eq!(stop.parent_station.as_ref().map(|p| p.as_str()), Some("place-knncl"));
        assert!(stop.coords.is_some());
    }

    #[test]
    fn stop_without_coordinates_is_kept() {
        let doc = stops_doc(
            r#"{"data": [{"id": "door-1", "type": "stop",
                "attributes": {"name": "Entrance", "latitude": null, "longitude": null}}]}"#,
        );

        let stops = convert_stops(&doc.data);
        assert_eq!(stops.len(), 1);
        assert!(stops[0].coords.is_none());
        assert!(!stops[0].wheelchair_accessible);
    }

    #[test]
    fn invalid_stop_is_skipped() {
        let doc = stops_doc(
            r#"{"data": [
                {"id": "", "type": "stop", "attributes": {"name": "Nowhere"}},
                {"id": "place-pktrm", "type": "stop", "attributes": {"name": "Park Street"}}
            ]}"#,
        );

        let stops = convert_stops(&doc.data);
        assert_eq!(stops.len(), 1);
        assert_eq!(stops[0].id.as_str(), "place-pktrm");
    }

    #[test]
    fn departures_use_included_resources() {
        let doc: Document<Vec<Resource<TimeAttributes>>> = serde_json::from_str(
            r#"{
            "data": [
                {"id": "p1", "type": "prediction",
                 "attributes": {"departure_time": "2025-01-10T08:00:00-05:00",
                                "arrival_time": "2025-01-10T07:59:00-05:00"},
                 "relationships": {
                    "route": {"data": {"id": "Red", "type": "route"}},
                    "stop": {"data": {"id": "70072", "type": "stop"}},
                    "trip": {"data": {"id": "T1", "type": "trip"}}}},
                {"id": "p2", "type": "prediction",
                 "attributes": {"departure_time": "not a time"},
                 "relationships": {
                    "route": {"data": {"id": "Red", "type": "route"}},
                    "stop": {"data": {"id": "70072", "type": "stop"}},
                    "trip": {"data": {"id": "T2", "type": "trip"}}}},
                {"id": "p3", "type": "prediction",
                 "attributes": {"departure_time": "2025-01-10T08:05:00-05:00"},
                 "relationships": {
                    "route": {"data": {"id": "Red", "type": "route"}},
                    "stop": {"data": {"id": "70072", "type": "stop"}}}}
            ],
            "included": [
                {"id": "T1", "type": "trip", "attributes": {"wheelchair_accessible": 1}},
                {"id": "70072", "type": "stop", "attributes": {"name": "Kendall/MIT"},
                 "relationships": {"parent_station": {"data": {"id": "place-knncl", "type": "stop"}}}}
            ]}"#,
        )
        .unwrap();

        let departures = convert_departures(&doc);
        assert_eq!(departures.len(), 1, "bad time and missing trip are skipped");

        let d = &departures[0];
        assert_eq!(d.trip_id.as_str(), "T1");
        assert!(d.wheelchair_accessible);
        assert!(d.is_at(&StopId::parse("place-knncl").unwrap()));
        assert_eq!(
            d.departure_time.map(|t| t.to_rfc3339()),
            Some("2025-01-10T08:00:00-05:00".to_string())
        );
    }

    #[test]
    fn alerts_keep_valid_entities() {
        let doc: Document<Vec<Resource<AlertAttributes>>> = serde_json::from_str(
            r#"{"data": [{"id": "a1", "type": "alert", "attributes": {
                "severity": 7, "lifecycle": "ONGOING", "header": "Red Line delays",
                "informed_entity": [{"route": "Red"}, {"route_type": 1}, {"stop": "place-pktrm"}]
            }}]}"#,
        )
        .unwrap();

        let alerts = convert_alerts(&doc.data);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, 7);
        assert!(alerts[0].lifecycle.is_active());
        assert_eq!(alerts[0].informed_entities.len(), 2);
        assert!(alerts[0].names_stop(&StopId::parse("place-pktrm").unwrap()));
    }
}
