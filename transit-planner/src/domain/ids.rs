//! Identifier types for stops, routes and trips.
//!
//! Feed identifiers are opaque strings, but an empty or whitespace id is
//! never meaningful, so each newtype rejects those at construction.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an invalid identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} id: {reason}")]
pub struct InvalidId {
    kind: &'static str,
    reason: &'static str,
}

fn validate(kind: &'static str, s: &str) -> Result<(), InvalidId> {
    if s.is_empty() {
        return Err(InvalidId {
            kind,
            reason: "must not be empty",
        });
    }
    if s.chars().any(char::is_whitespace) {
        return Err(InvalidId {
            kind,
            reason: "must not contain whitespace",
        });
    }
    Ok(())
}

macro_rules! feed_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Parse an identifier, rejecting empty or whitespace-containing input.
            pub fn parse(s: &str) -> Result<Self, InvalidId> {
                validate($kind, s)?;
                Ok(Self(s.to_string()))
            }

            /// Wrap a literal known to be valid.
            pub(crate) fn from_static(s: &'static str) -> Self {
                debug_assert!(validate($kind, s).is_ok(), "invalid literal id {s:?}");
                Self(s.to_string())
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = InvalidId;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                validate($kind, &s)?;
                Ok(Self(s))
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.0
            }
        }
    };
}

feed_id!(
    /// A stop identifier: a platform (`70072`) or a parent station (`place-kencl`).
    StopId,
    "stop"
);

feed_id!(
    /// A route identifier such as `Red`, `Green-B` or `CR-Fitchburg`.
    RouteId,
    "route"
);

feed_id!(
    /// A trip identifier. Only meaningful for the service day it came from.
    TripId,
    "trip"
);

impl StopId {
    /// Returns true if this id names a parent station rather than a platform.
    pub fn is_parent_station(&self) -> bool {
        self.0.starts_with("place-")
    }
}

impl RouteId {
    /// The line family of a route: `Green-B` belongs to `Green`, `Red` to itself.
    pub fn family(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }

    /// Returns true for commuter rail routes (`CR-` prefix).
    pub fn is_commuter_rail(&self) -> bool {
        self.0.starts_with("CR-")
    }
}
