//! MBTA trip planner server.
//!
//! A web service that answers: "how do I get from here to there on the
//! Boston subway, given what is running right now?"

pub mod cache;
pub mod domain;
pub mod geo;
pub mod mbta;
pub mod planner;
pub mod registry;
pub mod web;
