use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Mean earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct Coordinate {
    #[validate(range(min = -90.0, max = 90.0), custom = "validate_finite")]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0), custom = "validate_finite")]
    pub longitude: f64,
}

/// Rejects NaN and infinities, which `range` accepts.
pub fn validate_finite(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::new("not_finite"))
    }
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance in kilometers.
    pub fn distance_km(&self, other: &Coordinate) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        // clamp guards against a > 1 from float error on antipodal points
        let c = 2.0 * a.sqrt().min(1.0).asin();

        EARTH_RADIUS_KM * c
    }

    pub fn distance_meters(&self, other: &Coordinate) -> f64 {
        self.distance_km(other) * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_point_is_zero() {
        let p = Coordinate::new(37.7749, -122.4194);
        assert_eq!(p.distance_km(&p), 0.0);
    }

    #[test]
    fn one_hundredth_of_a_degree_of_latitude() {
        let a = Coordinate::new(37.7749, -122.4194);
        let b = Coordinate::new(37.7849, -122.4194);
        let d = a.distance_km(&b);
        assert!((d - 1.112).abs() < 0.001, "got {}", d);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Coordinate::new(37.7749, -122.4194);
        let b = Coordinate::new(37.7949, -122.3994);
        assert!((a.distance_meters(&b) - b.distance_meters(&a)).abs() < 1e-9);
    }

    #[test]
    fn rejects_out_of_range_latitude() {
        assert!(Coordinate::new(91.0, 0.0).validate().is_err());
        assert!(Coordinate::new(45.0, 120.0).validate().is_ok());
    }

    #[test]
    fn rejects_nan_and_infinite_coordinates() {
        assert!(Coordinate::new(f64::NAN, 0.0).validate().is_err());
        assert!(Coordinate::new(0.0, f64::NAN).validate().is_err());
        assert!(Coordinate::new(f64::INFINITY, 0.0).validate().is_err());
    }
}
