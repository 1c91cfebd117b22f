//! Domain types for the transit trip planner.
//!
//! This module contains the core domain model types that represent
//! validated transit data. All types enforce their invariants at construction
//! time, so code that receives these types can trust their validity.

mod alert;
mod departure;
mod error;
mod ids;
mod leg;
mod stop;
mod time;
mod trip;

pub use alert::{Alert, InformedEntity, Lifecycle};
pub use departure::Departure;
pub use error::DomainError;
pub use ids::{InvalidId, RouteId, StopId, TripId};
pub use leg::{Leg, TransferLeg, TransitLeg};
pub use stop::{Coordinates, Stop, TransitMode};
pub use time::{TimeError, minutes_between, parse_feed_time};
pub use trip::TripOption;
