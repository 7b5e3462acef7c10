//! Geographic point type and validation errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum valid latitude in degrees.
pub const MIN_LAT: f64 = -90.0;

/// Maximum valid latitude in degrees.
pub const MAX_LAT: f64 = 90.0;

/// Minimum valid longitude in degrees.
pub const MIN_LON: f64 = -180.0;

/// Maximum valid longitude in degrees.
pub const MAX_LON: f64 = 180.0;

/// Errors raised when building a geographic point.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeoError {
    /// Latitude outside [-90, 90] or not finite.
    #[error("Invalid latitude: {0} (must be between -90 and 90)")]
    InvalidLatitude(f64),

    /// Longitude outside [-180, 180] or not finite.
    #[error("Invalid longitude: {0} (must be between -180 and 180)")]
    InvalidLongitude(f64),
}

/// A validated latitude/longitude pair in degrees (WGS84).
///
/// Construction through [`GeoPoint::new`] guarantees both components are
/// finite and in range, so downstream distance math never sees NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPoint", into = "RawPoint")]
pub struct GeoPoint {
    lat: f64,
    lon: f64,
}

impl GeoPoint {
    /// Creates a point after validating both coordinates.
    ///
    /// # Arguments
    ///
    /// * `lat` - Latitude in degrees (-90.0 to 90.0)
    /// * `lon` - Longitude in degrees (-180.0 to 180.0)
    pub fn new(lat: f64, lon: f64) -> Result<Self, GeoError> {
        if !lat.is_finite() || !(MIN_LAT..=MAX_LAT).contains(&lat) {
            return Err(GeoError::InvalidLatitude(lat));
        }
        if !lon.is_finite() || !(MIN_LON..=MAX_LON).contains(&lon) {
            return Err(GeoError::InvalidLongitude(lon));
        }
        Ok(Self { lat, lon })
    }

    /// Builds a point from computed coordinates, clamping latitude and
    /// wrapping longitude into range.
    pub(crate) fn normalized(lat: f64, lon: f64) -> Self {
        let lat = lat.clamp(MIN_LAT, MAX_LAT);
        let mut lon = (lon + 540.0).rem_euclid(360.0) - 180.0;
        if lon == MIN_LON {
            lon = MAX_LON;
        }
        Self { lat, lon }
    }

    /// Latitude in degrees.
    #[inline]
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in degrees.
    #[inline]
    pub fn lon(&self) -> f64 {
        self.lon
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// Wire form used by serde; validated on the way in.
#[derive(Serialize, Deserialize)]
struct RawPoint {
    lat: f64,
    lon: f64,
}

impl TryFrom<RawPoint> for GeoPoint {
    type Error = GeoError;

    fn try_from(raw: RawPoint) -> Result<Self, Self::Error> {
        GeoPoint::new(raw.lat, raw.lon)
    }
}

impl From<GeoPoint> for RawPoint {
    fn from(point: GeoPoint) -> Self {
        Self {
            lat: point.lat,
            lon: point.lon,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_point() {
        let point = GeoPoint::new(45.0, 5.0).unwrap();
        assert_eq!(point.lat(), 45.0);
        assert_eq!(point.lon(), 5.0);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        assert!(GeoPoint::new(90.0, 180.0).is_ok());
        assert!(GeoPoint::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn test_invalid_latitude() {
        assert_eq!(
            GeoPoint::new(90.5, 0.0),
            Err(GeoError::InvalidLatitude(90.5))
        );
        assert!(matches!(
            GeoPoint::new(f64::NAN, 0.0),
            Err(GeoError::InvalidLatitude(_))
        ));
    }

    #[test]
    fn test_invalid_longitude() {
        assert_eq!(
            GeoPoint::new(0.0, -181.0),
            Err(GeoError::InvalidLongitude(-181.0))
        );
        assert!(matches!(
            GeoPoint::new(0.0, f64::INFINITY),
            Err(GeoError::InvalidLongitude(_))
        ));
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: GeoPoint = serde_json::from_str(r#"{"lat": 1.5, "lon": 2.5}"#).unwrap();
        assert_eq!(ok, GeoPoint::new(1.5, 2.5).unwrap());

        let bad = serde_json::from_str::<GeoPoint>(r#"{"lat": 100.0, "lon": 2.5}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_display() {
        let point = GeoPoint::new(45.0, -5.25).unwrap();
        assert_eq!(point.to_string(), "(45.000000, -5.250000)");
    }
}
