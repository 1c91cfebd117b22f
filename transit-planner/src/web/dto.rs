//! Data transfer objects for web requests and responses.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::domain::{Alert, Coordinates, Leg, RouteId, Stop, TransitMode, TripOption};
use crate::planner::{
    AlternativeReason, ModeSuggestion, PlanError, PlanOutcome, SearchParameters, StatsSnapshot,
    TripPlan, TripRequest,
};

fn default_walk() -> f64 {
    crate::planner::DEFAULT_MAX_WALK_M
}

fn default_transfers() -> usize {
    crate::planner::DEFAULT_MAX_TRANSFERS
}

fn default_true() -> bool {
    true
}

fn coordinates(lat: f64, lon: f64, which: &str) -> Result<Coordinates, PlanError> {
    Coordinates::new(lat, lon).map_err(|e| PlanError::InvalidRequest(format!("{which}: {e}")))
}

/// Request to plan a trip.
#[derive(Debug, Deserialize)]
pub struct PlanTripRequest {
    pub origin_lat: f64,
    pub origin_lon: f64,
    pub dest_lat: f64,
    pub dest_lon: f64,

    /// RFC 3339; defaults to now unless an arrival time is given
    pub departure_time: Option<DateTime<FixedOffset>>,

    /// RFC 3339; later itineraries are dropped
    pub arrival_time: Option<DateTime<FixedOffset>>,

    /// Metres
    #[serde(default = "default_walk")]
    pub max_walk_distance: f64,

    #[serde(default = "default_transfers")]
    pub max_transfers: usize,

    #[serde(default = "default_true")]
    pub prefer_fewer_transfers: bool,

    #[serde(default)]
    pub wheelchair_accessible: bool,
}

impl PlanTripRequest {
    /// Convert to a planner request.
    pub fn to_request(&self) -> Result<TripRequest, PlanError> {
        let mut request = TripRequest::new(
            coordinates(self.origin_lat, self.origin_lon, "origin")?,
            coordinates(self.dest_lat, self.dest_lon, "destination")?,
        )
        .with_max_walk(self.max_walk_distance)
        .with_max_transfers(self.max_transfers)
        .prefer_fewer_transfers(self.prefer_fewer_transfers)
        .wheelchair(self.wheelchair_accessible);
        request.departure_time = self.departure_time;
        request.arrival_time = self.arrival_time;
        Ok(request)
    }
}

/// A mode to exclude, by name or by GTFS route type.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ModeFilter {
    Mode(TransitMode),
    RouteType(i64),
}

impl ModeFilter {
    /// The mode this filter names, if it is one we model.
    pub fn mode(self) -> Option<TransitMode> {
        match self {
            ModeFilter::Mode(mode) => Some(mode),
            ModeFilter::RouteType(route_type) => TransitMode::from_route_type(route_type),
        }
    }
}

/// Request for route alternatives.
#[derive(Debug, Deserialize)]
pub struct RouteAlternativesRequest {
    pub origin_lat: f64,
    pub origin_lon: f64,
    pub dest_lat: f64,
    pub dest_lon: f64,

    /// Itineraries riding any of these are dropped
    #[serde(default)]
    pub excluded_modes: Vec<ModeFilter>,
}

impl RouteAlternativesRequest {
    pub fn origin(&self) -> Result<Coordinates, PlanError> {
        coordinates(self.origin_lat, self.origin_lon, "origin")
    }

    pub fn destination(&self) -> Result<Coordinates, PlanError> {
        coordinates(self.dest_lat, self.dest_lon, "destination")
    }

    /// Modes to exclude. Unknown route types are ignored.
    pub fn excluded(&self) -> Vec<TransitMode> {
        self.excluded_modes.iter().filter_map(|f| f.mode()).collect()
    }
}

/// Response to a planning request.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PlanTripResponse {
    Planned(PlannedResponse),
    NoStops(NoStopsResponse),
}

/// A completed plan: itineraries or alternatives.
#[derive(Debug, Serialize)]
pub struct PlannedResponse {
    pub origin: Coordinates,
    pub destination: Coordinates,
    pub trip_options: Vec<TripOptionResult>,
    pub service_alerts: Vec<Alert>,
    pub search_parameters: SearchParameters,
    pub diagnostics: StatsSnapshot,
}

/// No stop within walking distance of one end.
#[derive(Debug, Serialize)]
pub struct NoStopsResponse {
    pub error: String,
    pub origin_stops_found: usize,
    pub dest_stops_found: usize,
    pub service_alerts: Vec<Alert>,
    pub diagnostics: StatsSnapshot,
}

/// One entry of `trip_options`.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TripOptionResult {
    Itinerary(ItineraryResult),
    AlternativeModes {
        message: String,
        alternatives: Vec<ModeSuggestion>,
        reason: AlternativeReason,
        affected_routes: Vec<RouteId>,
    },
}

/// An itinerary.
#[derive(Debug, Serialize)]
pub struct ItineraryResult {
    pub route_path: Vec<LegResult>,
    pub final_stop: StopResult,
    pub departure_time: String,
    pub arrival_time: String,
    pub transit_time_minutes: i64,
    pub num_transfers: usize,
    pub origin_walk_minutes: u32,
    pub dest_walk_minutes: u32,
    pub total_time_minutes: i64,

    /// Timings come from fixed patterns, not schedules
    pub estimated: bool,
}

/// A leg of an itinerary.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LegResult {
    Transit {
        route_id: String,
        trip_id: Option<String>,
        from_stop_id: String,
        to_stop_id: String,
        departure_time: String,
        arrival_time: String,
        duration_minutes: i64,
        estimated: bool,
    },
    Transfer {
        station_id: String,
        station_name: String,
        walk_minutes: u32,
    },
}

/// A stop for display.
#[derive(Debug, Serialize)]
pub struct StopResult {
    pub id: String,
    pub name: String,
    pub coords: Option<Coordinates>,
    pub wheelchair_accessible: bool,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

// Conversion implementations

impl PlanTripResponse {
    /// Create from a trip plan.
    pub fn from_plan(plan: TripPlan) -> Self {
        let TripPlan {
            origin,
            destination,
            outcome,
            alerts,
            parameters,
            stats,
        } = plan;

        let trip_options = match outcome {
            PlanOutcome::Routes(routes) => routes
                .iter()
                .map(|r| TripOptionResult::Itinerary(ItineraryResult::from_option(r)))
                .collect(),
            PlanOutcome::Alternatives {
                reason,
                affected_routes,
                suggestions,
            } => vec![TripOptionResult::AlternativeModes {
                message: "No transit routes available. Consider these alternatives:".to_string(),
                alternatives: suggestions,
                reason,
                affected_routes,
            }],
            PlanOutcome::NoStops {
                origin_stops_found,
                dest_stops_found,
            } => {
                return PlanTripResponse::NoStops(NoStopsResponse {
                    error: "No transit stops found within walking distance".to_string(),
                    origin_stops_found,
                    dest_stops_found,
                    service_alerts: alerts,
                    diagnostics: stats,
                });
            }
        };

        PlanTripResponse::Planned(PlannedResponse {
            origin,
            destination,
            trip_options,
            service_alerts: alerts,
            search_parameters: parameters,
            diagnostics: stats,
        })
    }
}

impl ItineraryResult {
    /// Create from a domain TripOption.
    pub fn from_option(option: &TripOption) -> Self {
        Self {
            route_path: option.route_path().iter().map(LegResult::from_leg).collect(),
            final_stop: StopResult::from_stop(option.final_stop()),
            departure_time: format_time(&option.departure_time()),
            arrival_time: format_time(&option.arrival_time()),
            transit_time_minutes: option.transit_time_minutes(),
            num_transfers: option.num_transfers(),
            origin_walk_minutes: option.origin_walk_minutes(),
            dest_walk_minutes: option.dest_walk_minutes(),
            total_time_minutes: option.total_time_minutes(),
            estimated: option.is_estimated(),
        }
    }
}

impl LegResult {
    /// Create from a domain Leg.
    pub fn from_leg(leg: &Leg) -> Self {
        match leg {
            Leg::Transit(ride) => LegResult::Transit {
                route_id: ride.route_id().to_string(),
                trip_id: ride.trip_id().map(|t| t.to_string()),
                from_stop_id: ride.board_stop().to_string(),
                to_stop_id: ride.alight_stop().to_string(),
                departure_time: format_time(&ride.departure()),
                arrival_time: format_time(&ride.arrival()),
                duration_minutes: ride.minutes(),
                estimated: ride.is_estimated(),
            },
            Leg::Transfer(walk) => LegResult::Transfer {
                station_id: walk.station_id.to_string(),
                station_name: walk.station_name.clone(),
                walk_minutes: walk.walk_minutes,
            },
        }
    }
}

impl StopResult {
    pub fn from_stop(stop: &Stop) -> Self {
        Self {
            id: stop.id.to_string(),
            name: stop.name.clone(),
            coords: stop.coords,
            wheelchair_accessible: stop.wheelchair_accessible,
        }
    }
}

/// Format a feed time as RFC 3339.
fn format_time(time: &DateTime<FixedOffset>) -> String {
    time.to_rfc3339()
}
