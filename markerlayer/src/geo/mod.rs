//! Great-circle distance evaluation.
//!
//! Provides the Haversine distance between two geographic points and the
//! threshold test used by the POI store to reject markers that would sit on
//! top of each other.
//!
//! # Example
//!
//! ```
//! use markerlayer::geo::{distance, is_within, GeoPoint};
//!
//! let a = GeoPoint::new(45.0, 5.0).unwrap();
//! let b = GeoPoint::new(45.001, 5.0).unwrap();
//!
//! let meters = distance(&a, &b);
//! assert!((meters - 111.2).abs() < 0.5);
//! assert!(is_within(&a, &b, 150.0));
//! assert!(!is_within(&a, &b, 50.0));
//! ```

mod types;

pub use types::{GeoError, GeoPoint, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};

/// Mean Earth radius in meters (IUGG).
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Computes the Haversine great-circle distance between two points.
///
/// # Returns
///
/// Distance in meters along the surface of a sphere of radius
/// [`EARTH_RADIUS_M`].
#[inline]
pub fn distance(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat().to_radians();
    let lat2 = b.lat().to_radians();
    let delta_lat = (b.lat() - a.lat()).to_radians();
    let delta_lon = (b.lon() - a.lon()).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);

    // Rounding can push h a hair above 1.0 for antipodal points
    let c = 2.0 * h.sqrt().min(1.0).asin();

    EARTH_RADIUS_M * c
}

/// Returns true if `a` and `b` are no further apart than `threshold_m`.
#[inline]
pub fn is_within(a: &GeoPoint, b: &GeoPoint, threshold_m: f64) -> bool {
    distance(a, b) <= threshold_m
}

/// Computes the point reached by travelling `distance_m` from `origin` along
/// the initial bearing `bearing_deg` (clockwise from north).
///
/// Latitude is clamped at the poles and longitude wrapped into [-180, 180].
pub fn destination(origin: &GeoPoint, bearing_deg: f64, distance_m: f64) -> GeoPoint {
    let angular = distance_m / EARTH_RADIUS_M;
    let bearing = bearing_deg.to_radians();
    let lat1 = origin.lat().to_radians();
    let lon1 = origin.lon().to_radians();

    let sin_lat2 = lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing.cos();
    let lat2 = sin_lat2.clamp(-1.0, 1.0).asin();
    let lon2 = lon1
        + (bearing.sin() * angular.sin() * lat1.cos()).atan2(angular.cos() - lat1.sin() * sin_lat2);

    GeoPoint::normalized(lat2.to_degrees(), lon2.to_degrees())
}
