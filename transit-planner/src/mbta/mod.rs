//! MBTA V3 API client.
//!
//! This module provides an HTTP client for the MBTA V3 API, which serves
//! live stops, predictions, schedules, routes and alerts for the Boston
//! network.
//!
//! Key characteristics of the API:
//! - Responses are JSON:API documents; related resources arrive in an
//!   `included` array when requested with `include=`
//! - Times are RFC 3339 with the local offset
//! - Platforms are child stops of a `place-` parent station
//! - The `filter[radius]` of `/stops` is in degrees, not metres

mod client;
mod convert;
mod error;
mod types;

pub use client::{MbtaClient, MbtaConfig};
pub use convert::ConversionError;
pub use error::MbtaError;
pub use types::{
    AlertAttributes, Document, IncludedAttributes, InformedEntityDto, Relationship, Relationships,
    Resource, ResourceRef, RouteAttributes, StopAttributes, TimeAttributes,
};
