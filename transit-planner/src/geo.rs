//! Great-circle distance and walk time estimation.

use crate::domain::Coordinates;

/// Mean Earth radius in kilometres.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Default walking speed in km/h.
pub const WALK_SPEED_KMH: f64 = 5.0;

/// Haversine distance in kilometres between two points given in degrees.
///
/// Symmetric, and exactly zero for identical points. The intermediate term
/// is clamped so antipodal points do not produce NaN.
///
/// # Examples
///
/// ```
/// use transit_planner::geo::distance;
///
/// let d = distance(42.3623, -71.0952, 42.3505, -71.0845);
/// assert!((d - 1.58).abs() < 0.05);
/// ```
pub fn distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Distance in kilometres between two coordinates.
pub fn distance_between(a: Coordinates, b: Coordinates) -> f64 {
    distance(a.lat, a.lon, b.lat, b.lon)
}

/// Walking time in whole minutes at `speed_kmh`, rounded up, never below 1.
pub fn walk_minutes_at(distance_km: f64, speed_kmh: f64) -> u32 {
    let minutes = (distance_km.max(0.0) / speed_kmh * 60.0).ceil();
    if minutes.is_finite() {
        (minutes as u32).max(1)
    } else {
        1
    }
}

/// Walking time at the default 5 km/h.
pub fn walk_minutes(distance_km: f64) -> u32 {
    walk_minutes_at(distance_km, WALK_SPEED_KMH)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn lat() -> impl Strategy<Value = f64> {
        -90.0f64..=90.0
    }

    fn lon() -> impl Strategy<Value = f64> {
        -180.0f64..=180.0
    }

    proptest! {
        #[test]
        fn distance_is_symmetric(lat1 in lat(), lon1 in lon(), lat2 in lat(), lon2 in lon()) {
            let ab = distance(lat1, lon1, lat2, lon2);
            let ba = distance(lat2, lon2, lat1, lon1);
            prop_assert!((ab - ba).abs() < 1e-9, "{} != {}", ab, ba);
        }

        #[test]
        fn distance_to_self_is_zero(lat1 in lat(), lon1 in lon()) {
            prop_assert_eq!(distance(lat1, lon1, lat1, lon1), 0.0);
        }

        #[test]
        fn distance_is_bounded(lat1 in lat(), lon1 in lon(), lat2 in lat(), lon2 in lon()) {
            let d = distance(lat1, lon1, lat2, lon2);
            prop_assert!(d.is_finite());
            prop_assert!(d >= 0.0);
            prop_assert!(d <= std::f64::consts::PI * EARTH_RADIUS_KM + 1e-6);
        }

        #[test]
        fn walk_minutes_is_monotone(a in 0.0f64..50.0, b in 0.0f64..50.0) {
            let (near, far) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(walk_minutes(near) <= walk_minutes(far));
            prop_assert!(walk_minutes(near) >= 1);
        }
    }
}
