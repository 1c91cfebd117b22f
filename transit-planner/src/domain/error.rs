//! Domain error types.
//!
//! These errors represent validation failures in the domain layer.
//! They are distinct from feed and HTTP errors.

/// Domain-level errors for validation and data consistency.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    /// Latitude or longitude out of range
    #[error("invalid coordinates: ({lat}, {lon})")]
    InvalidCoordinates { lat: f64, lon: f64 },

    /// Invalid leg construction (e.g., arrival before departure)
    #[error("invalid leg: {0}")]
    InvalidLeg(&'static str),

    /// Itinerary has no legs
    #[error("itinerary must have at least one leg")]
    EmptyItinerary,

    /// Legs do not form a valid itinerary
    #[error("invalid route path: {0}")]
    InvalidPath(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DomainError::InvalidCoordinates {
            lat: 91.0,
            lon: 0.0,
        };
        assert_eq!(err.to_string(), "invalid coordinates: (91, 0)");

        let err = DomainError::InvalidLeg("arrival must be after departure");
        assert_eq!(
            err.to_string(),
            "invalid leg: arrival must be after departure"
        );

        let err = DomainError::EmptyItinerary;
        assert_eq!(err.to_string(), "itinerary must have at least one leg");

        let err = DomainError::InvalidPath("consecutive transfer legs");
        assert_eq!(
            err.to_string(),
            "invalid route path: consecutive transfer legs"
        );
    }
}
