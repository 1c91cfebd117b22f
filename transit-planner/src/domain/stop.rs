//! Stops and the coordinates they sit at.

use serde::{Deserialize, Serialize};

use super::{DomainError, StopId};

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    /// Construct coordinates, rejecting values outside the valid range.
    pub fn new(lat: f64, lon: f64) -> Result<Self, DomainError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(DomainError::InvalidCoordinates { lat, lon });
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(DomainError::InvalidCoordinates { lat, lon });
        }
        Ok(Self { lat, lon })
    }

    /// Coordinates from a feed, where `0.0` or a missing value means "unknown".
    pub fn from_feed(lat: Option<f64>, lon: Option<f64>) -> Option<Self> {
        match (lat, lon) {
            (Some(lat), Some(lon)) if lat != 0.0 && lon != 0.0 => Self::new(lat, lon).ok(),
            _ => None,
        }
    }
}

/// Transit mode of a stop or route.
///
/// Matches the GTFS `route_type` numbering used by the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitMode {
    LightRail,
    Subway,
    CommuterRail,
    Bus,
    Ferry,
}

impl TransitMode {
    /// Map a GTFS route type to a mode.
    pub fn from_route_type(route_type: i64) -> Option<Self> {
        match route_type {
            0 => Some(TransitMode::LightRail),
            1 => Some(TransitMode::Subway),
            2 => Some(TransitMode::CommuterRail),
            3 => Some(TransitMode::Bus),
            4 => Some(TransitMode::Ferry),
            _ => None,
        }
    }

    /// The GTFS route type for this mode.
    pub fn route_type(&self) -> i64 {
        match self {
            TransitMode::LightRail => 0,
            TransitMode::Subway => 1,
            TransitMode::CommuterRail => 2,
            TransitMode::Bus => 3,
            TransitMode::Ferry => 4,
        }
    }

    /// Rapid transit (subway or light rail), preferred over bus by the stop locator.
    pub fn is_rapid_transit(&self) -> bool {
        matches!(self, TransitMode::LightRail | TransitMode::Subway)
    }

    /// Any rail mode, including commuter rail.
    pub fn is_rail(&self) -> bool {
        matches!(
            self,
            TransitMode::LightRail | TransitMode::Subway | TransitMode::CommuterRail
        )
    }
}

/// A boardable stop or station.
///
/// Built fresh per request. The only post-construction mutation is
/// coordinate backfill from a parent station and the distance annotation
/// added by the stop locator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: StopId,
    pub name: String,
    /// May be missing for platform stops; see [`Stop::backfill_from_parent`].
    pub coords: Option<Coordinates>,
    pub wheelchair_accessible: bool,
    pub mode: Option<TransitMode>,
    pub parent_station: Option<StopId>,
    /// Straight-line distance from the query point, set by the stop locator.
    pub distance_km: Option<f64>,
}

impl Stop {
    /// Create a stop with no parent, mode or distance annotation.
    pub fn new(id: StopId, name: impl Into<String>, coords: Option<Coordinates>) -> Self {
        Self {
            id,
            name: name.into(),
            coords,
            wheelchair_accessible: false,
            mode: None,
            parent_station: None,
            distance_km: None,
        }
    }

    pub fn with_mode(mut self, mode: TransitMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_wheelchair(mut self, accessible: bool) -> Self {
        self.wheelchair_accessible = accessible;
        self
    }

    pub fn with_parent(mut self, parent: StopId) -> Self {
        self.parent_station = Some(parent);
        self
    }

    /// Fill in missing coordinates from the parent station.
    ///
    /// Returns true if the stop has coordinates afterwards.
    pub fn backfill_from_parent(&mut self, parent: &Stop) -> bool {
        if self.coords.is_none() {
            self.coords = parent.coords;
        }
        self.coords.is_some()
    }

    /// The parent station id if known, otherwise the stop's own id.
    pub fn station_id(&self) -> &StopId {
        self.parent_station.as_ref().unwrap_or(&self.id)
    }

    /// Returns true if `id` is this stop or its parent station.
    pub fn matches(&self, id: &StopId) -> bool {
        &self.id == id || self.parent_station.as_ref() == Some(id)
    }

    /// Returns true if the stop serves rail (rapid transit or commuter rail).
    pub fn is_rail(&self) -> bool {
        self.mode.is_some_and(|m| m.is_rail())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop_id(s: &str) -> StopId {
        StopId::parse(s).unwrap()
    }

    #[test]
    fn coordinates_validation() {
        assert!(Coordinates::new(42.36, -71.06).is_ok());
        assert!(Coordinates::new(91.0, 0.0).is_err());
        assert!(Coordinates::new(0.0, -181.0).is_err());
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn feed_coordinates_treat_zero_as_missing() {
        assert!(Coordinates::from_feed(Some(0.0), Some(-71.0)).is_none());
        assert!(Coordinates::from_feed(None, Some(-71.0)).is_none());
        assert_eq!(
            Coordinates::from_feed(Some(42.0), Some(-71.0)),
            Some(Coordinates { lat: 42.0, lon: -71.0 })
        );
    }

    #[test]
    fn mode_from_route_type() {
        assert_eq!(TransitMode::from_route_type(0), Some(TransitMode::LightRail));
        assert_eq!(TransitMode::from_route_type(1), Some(TransitMode::Subway));
        assert_eq!(TransitMode::from_route_type(2), Some(TransitMode::CommuterRail));
        assert_eq!(TransitMode::from_route_type(3), Some(TransitMode::Bus));
        assert_eq!(TransitMode::from_route_type(7), None);
        assert!(TransitMode::Subway.is_rapid_transit());
        assert!(!TransitMode::CommuterRail.is_rapid_transit());
        assert!(TransitMode::CommuterRail.is_rail());
        assert!(!TransitMode::Bus.is_rail());
    }

    #[test]
    fn backfill_only_fills_missing() {
        let parent = Stop::new(
            stop_id("place-pktrm"),
            "Park Street",
            Some(Coordinates { lat: 42.3564, lon: -71.0624 }),
        );

        let mut platform = Stop::new(stop_id("70075"), "Park Street - Red", None)
            .with_parent(stop_id("place-pktrm"));
        assert!(platform.backfill_from_parent(&parent));
        assert_eq!(platform.coords, parent.coords);

        let own = Coordinates { lat: 42.0, lon: -71.0 };
        let mut located = Stop::new(stop_id("70076"), "Park Street - Red", Some(own));
        assert!(located.backfill_from_parent(&parent));
        assert_eq!(located.coords, Some(own));
    }

    #[test]
    fn matches_self_or_parent() {
        let platform = Stop::new(stop_id("70075"), "Park Street", None)
            .with_parent(stop_id("place-pktrm"));

        assert!(platform.matches(&stop_id("70075")));
        assert!(platform.matches(&stop_id("place-pktrm")));
        assert!(!platform.matches(&stop_id("place-dtnxg")));
        assert_eq!(platform.station_id(), &stop_id("place-pktrm"));
    }
}
