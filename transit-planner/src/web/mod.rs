//! Web layer for the trip planner.
//!
//! Provides JSON endpoints for planning trips and finding alternatives.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
