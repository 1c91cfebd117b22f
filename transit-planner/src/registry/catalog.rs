//! Static catalog of major stations.
//!
//! The catalog is the first place the stop locator looks: it has reliable
//! coordinates for every major rapid transit and commuter rail station, so
//! most requests never need a live stop listing.

use std::path::Path;

use serde::Deserialize;

use crate::domain::{Coordinates, Stop, StopId, TransitMode};
use crate::geo;

/// Bundled catalog, used when no catalog file is configured.
const BUNDLED_CATALOG: &str = include_str!("../../data/major_stations.json");

/// Error loading a station catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// On-disk catalog layout.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    rapid_transit: Vec<CatalogRecord>,
    #[serde(default)]
    commuter_rail: Vec<CatalogRecord>,
}

#[derive(Debug, Deserialize)]
struct CatalogRecord {
    id: String,
    name: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    municipality: Option<String>,
    #[serde(default)]
    route_type: Option<i64>,
    /// GTFS convention: 0 unknown, 1 accessible, 2 not accessible.
    #[serde(default)]
    wheelchair_boarding: Option<u8>,
}

/// A station in the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogStation {
    pub id: StopId,
    pub name: String,
    pub coords: Coordinates,
    pub municipality: Option<String>,
    /// `None` when the catalog entry carries an unrecognised route type.
    pub mode: Option<TransitMode>,
    /// `None` when the catalog does not say.
    pub wheelchair_boarding: Option<bool>,
}

impl CatalogStation {
    /// Distance in kilometres from `at`.
    pub fn distance_km(&self, at: Coordinates) -> f64 {
        geo::distance_between(at, self.coords)
    }

    /// Convert to a stop annotated with its distance from the query point.
    ///
    /// Unknown accessibility is reported as accessible; callers that need
    /// the distinction use [`CatalogStation::wheelchair_boarding`].
    pub fn to_stop(&self, distance_km: f64) -> Stop {
        let mut stop = Stop::new(self.id.clone(), self.name.clone(), Some(self.coords))
            .with_wheelchair(self.wheelchair_boarding.unwrap_or(true));
        stop.mode = self.mode;
        stop.distance_km = Some(distance_km);
        stop
    }
}

/// The static station catalog.
#[derive(Debug, Clone, Default)]
pub struct StationCatalog {
    stations: Vec<CatalogStation>,
}

impl StationCatalog {
    /// Create a catalog from stations.
    pub fn new(stations: Vec<CatalogStation>) -> Self {
        Self { stations }
    }

    /// The catalog bundled with the crate.
    pub fn bundled() -> Result<Self, CatalogError> {
        Self::from_json(BUNDLED_CATALOG)
    }

    /// Load a catalog file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Parse a catalog from JSON.
    ///
    /// Records with an invalid id or coordinates are skipped.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;

        let stations = file
            .rapid_transit
            .into_iter()
            .chain(file.commuter_rail)
            .filter_map(|record| {
                let converted = convert_record(&record);
                if converted.is_none() {
                    tracing::warn!(id = %record.id, "Skipping invalid catalog record");
                }
                converted
            })
            .collect();

        Ok(Self { stations })
    }

    /// All stations, rapid transit first.
    pub fn stations(&self) -> &[CatalogStation] {
        &self.stations
    }

    /// Stations within `radius_km` of `at`, paired with their distance.
    pub fn within(&self, at: Coordinates, radius_km: f64) -> Vec<(&CatalogStation, f64)> {
        self.stations
            .iter()
            .map(|s| (s, s.distance_km(at)))
            .filter(|(_, d)| *d <= radius_km)
            .collect()
    }

    /// Look up a station by id.
    pub fn get(&self, id: &StopId) -> Option<&CatalogStation> {
        self.stations.iter().find(|s| &s.id == id)
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

fn convert_record(record: &CatalogRecord) -> Option<CatalogStation> {
    let id = StopId::parse(&record.id).ok()?;
    let coords = Coordinates::new(record.latitude, record.longitude).ok()?;
    let wheelchair_boarding = match record.wheelchair_boarding {
        Some(1) => Some(true),
        Some(2) => Some(false),
        _ => None,
    };

    Some(CatalogStation {
        id,
        name: record.name.clone(),
        coords,
        municipality: record.municipality.clone(),
        mode: record.route_type.and_then(TransitMode::from_route_type),
        wheelchair_boarding,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const FIXTURE: &str = r#"{
        "rapid_transit": [
            {"id": "place-knncl", "name": "Kendall/MIT", "latitude": 42.362491,
             "longitude": -71.086176, "route_type": 1, "wheelchair_boarding": 1},
            {"id": "place-coecl", "name": "Copley", "latitude": 42.349974,
             "longitude": -71.077447, "route_type": 0},
            {"id": "", "name": "Broken", "latitude": 42.0, "longitude": -71.0, "route_type": 1}
        ],
        "commuter_rail": [
            {"id": "place-WML-0012", "name": "Lansdowne", "latitude": 42.347581,
             "longitude": -71.099974, "route_type": 2, "wheelchair_boarding": 2}
        ],
        "metadata": {"source": "test"}
    }"#;

    #[test]
    fn parse_fixture_skips_invalid_records() {
        let catalog = StationCatalog::from_json(FIXTURE).unwrap();
        assert_eq!(catalog.len(), 3);

        let kendall = catalog.get(&StopId::parse("place-knncl").unwrap()).unwrap();
        assert_eq!(kendall.mode, Some(TransitMode::Subway));
        assert_eq!(kendall.wheelchair_boarding, Some(true));

        let copley = catalog.get(&StopId::parse("place-coecl").unwrap()).unwrap();
        assert_eq!(copley.mode, Some(TransitMode::LightRail));
        assert_eq!(copley.wheelchair_boarding, None);

        let lansdowne = catalog
            .get(&StopId::parse("place-WML-0012").unwrap())
            .unwrap();
        assert_eq!(lansdowne.mode, Some(TransitMode::CommuterRail));
        assert_eq!(lansdowne.wheelchair_boarding, Some(false));
    }

    #[test]
    fn within_radius() {
        let catalog = StationCatalog::from_json(FIXTURE).unwrap();
        let kendall = Coordinates::new(42.3623, -71.0860).unwrap();

        let near = catalog.within(kendall, 0.5);
        assert_eq!(near.len(), 1);
        assert_eq!(near[0].0.name, "Kendall/MIT");
        assert!(near[0].1 < 0.1);

        assert_eq!(catalog.within(kendall, 5.0).len(), 3);
    }

    #[test]
    fn to_stop_annotates_distance() {
        let catalog = StationCatalog::from_json(FIXTURE).unwrap();
        let copley = catalog.get(&StopId::parse("place-coecl").unwrap()).unwrap();

        let stop = copley.to_stop(0.25);
        assert_eq!(stop.distance_km, Some(0.25));
        assert_eq!(stop.mode, Some(TransitMode::LightRail));
        assert!(stop.wheelchair_accessible);
    }

    #[test]
    fn bundled_catalog_loads() {
        let catalog = StationCatalog::bundled().unwrap();
        assert!(catalog.len() > 30);
        assert!(catalog.get(&StopId::parse("place-pktrm").unwrap()).is_some());
        assert!(
            catalog
                .stations()
                .iter()
                .any(|s| s.mode == Some(TransitMode::CommuterRail))
        );
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FIXTURE.as_bytes()).unwrap();

        let catalog = StationCatalog::load(file.path()).unwrap();
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = StationCatalog::load(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
        assert!(err.to_string().contains("missing.json"));
    }

    #[test]
    fn load_invalid_json_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{not json").unwrap();

        let err = StationCatalog::load(file.path()).unwrap_err();
        assert!(matches!(err, CatalogError::Json(_)));
    }
}
