//! HTTP route handlers.

use axum::body::Bytes;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::de::DeserializeOwned;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::planner::{PlanError, TransitFeed};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router<F: TransitFeed + 'static>(state: AppState<F>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/trip/plan", post(plan_trip::<F>))
        .route("/trip/alternatives", post(route_alternatives::<F>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Parse a JSON body, logging it on failure.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| {
        warn!(error = %e, body = %String::from_utf8_lossy(body), "Rejected request body");
        AppError::BadRequest {
            message: format!("Invalid JSON: {e}"),
        }
    })
}

/// Plan a trip between two points.
async fn plan_trip<F: TransitFeed + 'static>(
    State(state): State<AppState<F>>,
    body: Bytes,
) -> Result<Json<PlanTripResponse>, AppError> {
    let req: PlanTripRequest = parse_body(&body)?;
    let request = req.to_request()?;

    let plan = state.planner().plan_trip(&request).await?;
    info!(
        routes = plan.routes().len(),
        api_calls = plan.stats.api_calls,
        "Planned trip"
    );

    Ok(Json(PlanTripResponse::from_plan(plan)))
}

/// Plan a trip avoiding some modes.
async fn route_alternatives<F: TransitFeed + 'static>(
    State(state): State<AppState<F>>,
    body: Bytes,
) -> Result<Json<PlanTripResponse>, AppError> {
    let req: RouteAlternativesRequest = parse_body(&body)?;
    let origin = req.origin()?;
    let destination = req.destination()?;

    let plan = state
        .planner()
        .get_route_alternatives(origin, destination, &req.excluded())
        .await?;

    Ok(Json(PlanTripResponse::from_plan(plan)))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    Timeout { message: String },
}

impl From<PlanError> for AppError {
    fn from(e: PlanError) -> Self {
        let message = format!("Trip planning failed: {e}");
        match e {
            PlanError::InvalidRequest(_) => AppError::BadRequest { message },
            PlanError::Timeout => AppError::Timeout { message },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::Timeout { message } => (StatusCode::GATEWAY_TIMEOUT, message),
        };

        warn!(%status, %message, "Request failed");

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
