//! Great-circle distance
//!
//! Haversine formula on a spherical Earth, reported in kilometers rounded
//! to two decimal places.

use crate::constants::geo::EARTH_RADIUS_KM;
use crate::coord::Position;

/// Calculate the distance between two positions in kilometers (Haversine formula)
///
/// The result is rounded to 2 decimal places and is symmetric in its
/// arguments.
pub fn distance_km(a: Position, b: Position) -> f64 {
    round2(haversine_km(a, b))
}

/// Unrounded Haversine distance in kilometers
pub fn haversine_km(a: Position, b: Position) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_same_point_is_zero() {
        let p = Position::new(-6.2383, 107.0215);
        assert_eq!(distance_km(p, p), 0.0);
    }

    #[test]
    fn test_symmetric() {
        let a = Position::new(-6.2383, 107.0215);
        let b = Position::new(-6.371355, 106.824186);
        assert_eq!(distance_km(a, b), distance_km(b, a));
    }

    #[test]
    fn test_one_degree_latitude() {
        let a = Position::new(0.0, 106.8);
        let b = Position::new(1.0, 106.8);
        assert_relative_eq!(distance_km(a, b), 111.0, max_relative = 0.01);
    }

    #[test]
    fn test_tambun_to_campus() {
        let tambun = Position::new(-6.2383, 107.0215);
        let campus = Position::new(-6.371355, 106.824186);
        let d = distance_km(tambun, campus);
        assert!(d > 20.0 && d < 35.0, "distance {} should be around 26-29 km", d);
    }

    #[test]
    fn test_rounded_to_two_decimals() {
        let d = distance_km(Position::new(0.0, 0.0), Position::new(0.0123, 0.0456));
        assert_eq!(d, (d * 100.0).round() / 100.0);
    }
}
