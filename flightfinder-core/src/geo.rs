//! Great-circle distance and search bounding boxes.
//!
//! Pure functions, no state. The bounding box is a flat-earth approximation
//! used only to narrow the primary query; exact filtering uses haversine.

use serde::Serialize;

use crate::types::{Coordinate, MILES_TO_KM};

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Approximate length of one degree of latitude in statute miles.
pub const MILES_PER_DEGREE: f64 = 69.0;

/// Rectangular lat/lon region around a search centre.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

/// Distance between two coordinates in both units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Distance {
    pub km: f64,
    pub miles: f64,
}

/// Box of `radius_miles` around `center`.
///
/// One degree of longitude is taken as `69 * cos(lat)` miles, so the box
/// widens without bound as the centre approaches a pole. Not corrected.
pub fn bounding_box(center: &Coordinate, radius_miles: f64) -> BoundingBox {
    let lat_degrees = radius_miles / MILES_PER_DEGREE;
    let lon_degrees = radius_miles / (MILES_PER_DEGREE * center.latitude().to_radians().cos());

    BoundingBox {
        min_lat: center.latitude() - lat_degrees,
        max_lat: center.latitude() + lat_degrees,
        min_lon: center.longitude() - lon_degrees,
        max_lon: center.longitude() + lon_degrees,
    }
}

/// Haversine great-circle distance.
pub fn distance(a: &Coordinate, b: &Coordinate) -> Distance {
    let dlat = (b.latitude() - a.latitude()).to_radians();
    let dlon = (b.longitude() - a.longitude()).to_radians();
    let h = (dlat / 2.0).sin().powi(2)
        + a.latitude().to_radians().cos()
            * b.latitude().to_radians().cos()
            * (dlon / 2.0).sin().powi(2);
    let km = EARTH_RADIUS_KM * 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    Distance {
        km,
        miles: km / MILES_TO_KM,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn test_distance_to_self_is_zero() {
        let a = coord(35.4362, -82.5418);
        let d = distance(&a, &a);
        assert_eq!(d.km, 0.0);
        assert_eq!(d.miles, 0.0);
    }

    #[test]
    fn test_distance_symmetric() {
        let a = coord(40.0, -74.0);
        let b = coord(51.47, -0.45);
        assert_eq!(distance(&a, &b), distance(&b, &a));
    }

    #[test]
    fn test_one_degree_latitude() {
        let d = distance(&coord(10.0, 20.0), &coord(11.0, 20.0));
        assert!((d.km - 111.2).abs() < 1.112, "got {}", d.km);
    }

    #[test]
    fn test_miles_conversion() {
        let d = distance(&coord(40.0, -74.0), &coord(40.0, -75.0));
        assert!((d.miles - d.km / MILES_TO_KM).abs() < 1e-9);
        assert!((d.miles - 52.9).abs() < 0.5, "got {}", d.miles);
    }

    #[test]
    fn test_bounding_box_equator() {
        let bb = bounding_box(&coord(0.0, 0.0), 69.0);
        assert!((bb.min_lat + 1.0).abs() < 1e-9);
        assert!((bb.max_lat - 1.0).abs() < 1e-9);
        assert!((bb.min_lon + 1.0).abs() < 1e-9);
        assert!((bb.max_lon - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_bounding_box_widens_with_latitude() {
        let bb = bounding_box(&coord(60.0, 10.0), 69.0);
        // cos(60°) = 0.5 → two degrees of longitude each side
        assert!((bb.max_lon - 12.0).abs() < 1e-9);
        assert!((bb.min_lon - 8.0).abs() < 1e-9);
        assert!((bb.max_lat - 61.0).abs() < 1e-9);
    }

    #[test]
    fn test_bounding_box_near_pole_is_very_wide() {
        let bb = bounding_box(&coord(89.99, 0.0), 100.0);
        assert!(bb.max_lon - bb.min_lon > 360.0);
    }
}
