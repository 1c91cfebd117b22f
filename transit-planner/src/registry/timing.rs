//! Fixed timing estimates for two-leg trips.
//!
//! Used only by the estimated transfer search, when live two-leg search
//! found nothing. Each pattern covers one origin line family, one
//! interchange and one destination line family, with per-stop ride times
//! matched by name token.

use crate::domain::RouteId;

/// Ride time guesses for one origin→interchange→destination pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingPattern {
    pub origin_family: String,
    pub transfer_name: String,
    pub dest_family: String,
    /// Origin name token and minutes to the interchange.
    pub first_leg: Vec<(String, u32)>,
    /// Destination name token and minutes from the interchange.
    pub second_leg: Vec<(String, u32)>,
    pub second_route: RouteId,
}

/// Result of a timing lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingEstimate {
    pub first_leg_minutes: u32,
    pub second_leg_minutes: u32,
    pub second_route: RouteId,
}

/// Pattern table with generic fallbacks.
#[derive(Debug, Clone)]
pub struct TimingTable {
    patterns: Vec<TimingPattern>,
    default_first_leg: u32,
    default_second_leg: u32,
    default_second_route: RouteId,
}

impl TimingTable {
    /// Create a table with the given fallbacks and no patterns.
    pub fn new(
        default_first_leg: u32,
        default_second_leg: u32,
        default_second_route: RouteId,
    ) -> Self {
        Self {
            patterns: Vec::new(),
            default_first_leg,
            default_second_leg,
            default_second_route,
        }
    }

    /// Add a pattern.
    pub fn with_pattern(mut self, pattern: TimingPattern) -> Self {
        self.patterns.push(pattern);
        self
    }

    pub fn patterns(&self) -> &[TimingPattern] {
        &self.patterns
    }

    /// Estimate both ride times for a trip through `transfer_name`.
    ///
    /// Name matching is case-insensitive. Any part that no pattern covers
    /// falls back to the table defaults.
    pub fn estimate(
        &self,
        origin_route: &RouteId,
        origin_name: &str,
        transfer_name: &str,
        dest_family: &str,
        dest_name: &str,
    ) -> TimingEstimate {
        let pattern = self.patterns.iter().find(|p| {
            p.origin_family == origin_route.family()
                && p.transfer_name.eq_ignore_ascii_case(transfer_name)
                && p.dest_family == dest_family
        });

        let Some(pattern) = pattern else {
            return TimingEstimate {
                first_leg_minutes: self.default_first_leg,
                second_leg_minutes: self.default_second_leg,
                second_route: self.default_second_route.clone(),
            };
        };

        let origin_lower = origin_name.to_lowercase();
        let dest_lower = dest_name.to_lowercase();

        let first_leg_minutes = pattern
            .first_leg
            .iter()
            .find(|(token, _)| origin_lower.contains(token.as_str()))
            .map(|(_, mins)| *mins)
            .unwrap_or(self.default_first_leg);

        let second_leg_minutes = pattern
            .second_leg
            .iter()
            .find(|(token, _)| dest_lower.contains(token.as_str()))
            .map(|(_, mins)| *mins)
            .unwrap_or(self.default_second_leg);

        TimingEstimate {
            first_leg_minutes,
            second_leg_minutes,
            second_route: pattern.second_route.clone(),
        }
    }
}

fn owned(legs: &[(&str, u32)]) -> Vec<(String, u32)> {
    legs.iter().map(|(t, m)| (t.to_string(), *m)).collect()
}

fn pattern(
    origin_family: &str,
    transfer_name: &str,
    dest_family: &str,
    first_leg: &[(&str, u32)],
    second_leg: &[(&str, u32)],
    second_route: &RouteId,
) -> TimingPattern {
    TimingPattern {
        origin_family: origin_family.to_string(),
        transfer_name: transfer_name.to_string(),
        dest_family: dest_family.to_string(),
        first_leg: owned(first_leg),
        second_leg: owned(second_leg),
        second_route: second_route.clone(),
    }
}

/// Red Line to Green Line timings through the downtown interchanges.
///
/// Fallbacks: 5 minutes first leg, 6 minutes second leg, on the B branch.
pub fn boston_timings() -> TimingTable {
    let green_b = RouteId::from_static("Green-B");

    TimingTable::new(5, 6, green_b.clone())
        .with_pattern(pattern(
            "Red",
            "Park Street",
            "Green",
            &[("kendall", 4), ("central", 2)],
            &[("copley", 3), ("hynes", 5)],
            &green_b,
        ))
        .with_pattern(pattern(
            "Red",
            "Downtown Crossing",
            "Green",
            &[("kendall", 6), ("central", 4)],
            &[("copley", 8), ("hynes", 10)],
            &green_b,
        ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(s: &str) -> RouteId {
        RouteId::parse(s).unwrap()
    }

    #[test]
    fn pattern_match() {
        let table = boston_timings();
        let est = table.estimate(&route("Red"), "Kendall/MIT", "Park Street", "Green", "Copley");
        assert_eq!(est.first_leg_minutes, 4);
        assert_eq!(est.second_leg_minutes, 3);
        assert_eq!(est.second_route, route("Green-B"));

        let est = table.estimate(
            &route("Red"),
            "Central",
            "Downtown Crossing",
            "Green",
            "Hynes Convention Center",
        );
        assert_eq!(est.first_leg_minutes, 4);
        assert_eq!(est.second_leg_minutes, 10);
    }

    #[test]
    fn partial_match_uses_defaults_for_missing_side() {
        let table = boston_timings();
        let est = table.estimate(&route("Red"), "Harvard", "park street", "Green", "Copley");
        assert_eq!(est.first_leg_minutes, 5);
        assert_eq!(est.second_leg_minutes, 3);
    }

    #[test]
    fn no_pattern_uses_generic_fallback() {
        let table = boston_timings();
        let est = table.estimate(&route("Orange"), "Ruggles", "State", "Blue", "Airport");
        assert_eq!(
            est,
            TimingEstimate {
                first_leg_minutes: 5,
                second_leg_minutes: 6,
                second_route: route("Green-B"),
            }
        );
    }

    #[test]
    fn empty_table() {
        let table = TimingTable::new(7, 8, route("Blue"));
        assert!(table.patterns().is_empty());
        let est = table.estimate(&route("Red"), "Kendall", "Park Street", "Green", "Copley");
        assert_eq!(est.first_leg_minutes, 7);
        assert_eq!(est.second_leg_minutes, 8);
        assert_eq!(est.second_route, route("Blue"));
    }
}
