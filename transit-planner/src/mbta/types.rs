//! MBTA V3 API response DTOs.
//!
//! The API speaks JSON:API: every resource is `{id, type, attributes,
//! relationships}` and related resources requested with `include=` arrive
//! in a top-level `included` array. Fields the API may omit or null are
//! `Option`.

use serde::Deserialize;

/// A JSON:API document.
#[derive(Debug, Clone, Deserialize)]
pub struct Document<T> {
    pub data: T,

    #[serde(default)]
    pub included: Vec<Resource<IncludedAttributes>>,
}

/// A JSON:API resource object.
#[derive(Debug, Clone, Deserialize)]
pub struct Resource<A> {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: String,

    pub attributes: A,

    #[serde(default)]
    pub relationships: Relationships,
}

/// The relationships the planner reads. Others are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Relationships {
    pub route: Option<Relationship>,
    pub stop: Option<Relationship>,
    pub trip: Option<Relationship>,
    pub parent_station: Option<Relationship>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Relationship {
    pub data: Option<ResourceRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceRef {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: String,
}

impl Relationships {
    fn id_of(rel: &Option<Relationship>) -> Option<&str> {
        rel.as_ref()
            .and_then(|r| r.data.as_ref())
            .map(|d| d.id.as_str())
    }

    pub fn route_id(&self) -> Option<&str> {
        Self::id_of(&self.route)
    }

    pub fn stop_id(&self) -> Option<&str> {
        Self::id_of(&self.stop)
    }

    pub fn trip_id(&self) -> Option<&str> {
        Self::id_of(&self.trip)
    }

    pub fn parent_station_id(&self) -> Option<&str> {
        Self::id_of(&self.parent_station)
    }
}

/// `stop` attributes.
#[derive(Debug, Clone, Deserialize)]
pub struct StopAttributes {
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// 0 no information, 1 accessible, 2 inaccessible.
    pub wheelchair_boarding: Option<u8>,
    /// GTFS route type of vehicles serving the stop.
    pub vehicle_type: Option<i64>,
    /// 0 platform, 1 parent station, 2 entrance, 3 generic node.
    pub location_type: Option<u8>,
    pub description: Option<String>,
    pub municipality: Option<String>,
    pub platform_name: Option<String>,
}

/// `prediction` and `schedule` attributes.
#[derive(Debug, Clone, Deserialize)]
pub struct TimeAttributes {
    pub arrival_time: Option<String>,
    pub departure_time: Option<String>,
    pub direction_id: Option<u8>,
    pub stop_sequence: Option<u32>,
    pub status: Option<String>,
}

/// `alert` attributes.
#[derive(Debug, Clone, Deserialize)]
pub struct AlertAttributes {
    #[serde(default)]
    pub severity: u8,
    pub lifecycle: Option<String>,
    pub header: Option<String>,
    pub effect: Option<String>,
    #[serde(default)]
    pub informed_entity: Vec<InformedEntityDto>,
}

/// One `informed_entity` entry of an alert.
#[derive(Debug, Clone, Deserialize)]
pub struct InformedEntityDto {
    pub route: Option<String>,
    pub stop: Option<String>,
    pub route_type: Option<i64>,
    pub trip: Option<String>,
}

/// `route` attributes.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteAttributes {
    #[serde(rename = "type")]
    pub route_type: i64,
    pub long_name: Option<String>,
    pub short_name: Option<String>,
}

/// Attributes of any included resource. Only trip and stop fields the
/// planner uses are read.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IncludedAttributes {
    /// Trips: 0 no information, 1 accessible, 2 inaccessible.
    pub wheelchair_accessible: Option<u8>,
    /// Stops.
    pub name: Option<String>,
}
