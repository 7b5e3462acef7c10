//! Distance command - great-circle distance between two points.

use markerlayer::geo::{self, GeoPoint};

use crate::error::CliError;

/// Arguments for the distance command.
pub struct DistanceArgs {
    pub lat1: f64,
    pub lon1: f64,
    pub lat2: f64,
    pub lon2: f64,
    pub threshold: Option<f64>,
}

/// Run the distance command, returning the distance in meters.
pub fn run(args: DistanceArgs) -> Result<f64, CliError> {
    let a = GeoPoint::new(args.lat1, args.lon1)?;
    let b = GeoPoint::new(args.lat2, args.lon2)?;
    let meters = geo::distance(&a, &b);

    println!("{} -> {}", a, b);
    println!("  Distance: {}", format_distance(meters));
    if let Some(threshold) = args.threshold {
        let verdict = if geo::is_within(&a, &b, threshold) {
            "within"
        } else {
            "outside"
        };
        println!("  {} {} threshold", verdict, format_distance(threshold));
    }

    Ok(meters)
}

fn format_distance(meters: f64) -> String {
    if meters >= 1000.0 {
        format!("{:.3} km", meters / 1000.0)
    } else {
        format!("{:.2} m", meters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> DistanceArgs {
        DistanceArgs {
            lat1,
            lon1,
            lat2,
            lon2,
            threshold: Some(50.0),
        }
    }

    #[test]
    fn test_distance_between_points() {
        let meters = run(args(45.0, 5.0, 45.001, 5.0)).unwrap();
        assert!((meters - 111.19).abs() < 0.1);
    }

    #[test]
    fn test_invalid_coordinate_rejected() {
        assert!(matches!(
            run(args(95.0, 0.0, 0.0, 0.0)),
            Err(CliError::Coordinate(_))
        ));
    }

    #[test]
    fn test_format_distance() {
        assert_eq!(format_distance(3.339), "3.34 m");
        assert_eq!(format_distance(343_556.0), "343.556 km");
    }
}
