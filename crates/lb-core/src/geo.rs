//! Great-circle geometry on a spherical Earth.

use serde::{Deserialize, Serialize};

use crate::constants::EARTH_RADIUS_M;
use crate::error::{CoreError, Result};

/// A WGS84 position in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Finite, |lat| <= 90 and |lng| <= 180.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude.abs() <= 90.0
            && self.longitude.abs() <= 180.0
    }

    pub fn validate(self) -> Result<Self> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(CoreError::InvalidSample {
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }

    pub fn distance_to(&self, other: Coordinate) -> f64 {
        distance_meters(*self, other)
    }
}

/// Haversine distance in meters using the mean Earth radius.
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let d_phi = (b.latitude - a.latitude).to_radians();
    let d_lambda = (b.longitude - a.longitude).to_radians();

    let h = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Rounding can push h a hair past 1 near antipodes
    let h = h.min(1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn coord() -> impl Strategy<Value = Coordinate> {
        (-90.0f64..=90.0, -180.0f64..=180.0).prop_map(|(lat, lng)| Coordinate::new(lat, lng))
    }

    proptest! {
        #[test]
        fn distance_to_self_is_zero(p in coord()) {
            prop_assert_eq!(distance_meters(p, p), 0.0);
        }

        #[test]
        fn distance_is_symmetric(a in coord(), b in coord()) {
            let ab = distance_meters(a, b);
            let ba = distance_meters(b, a);
            prop_assert!((ab - ba).abs() < 1e-6, "ab={ab} ba={ba}");
        }

        #[test]
        fn distance_is_bounded_by_half_circumference(a in coord(), b in coord()) {
            let d = distance_meters(a, b);
            prop_assert!(d >= 0.0);
            prop_assert!(d <= std::f64::consts::PI * EARTH_RADIUS_M + 1e-6);
        }
    }

    #[test]
    fn test_hundredth_degree_of_latitude() {
        let a = Coordinate::new(37.0, -122.0);
        let b = Coordinate::new(37.01, -122.0);
        // R * 0.01° in radians
        let expected = EARTH_RADIUS_M * 0.01f64.to_radians();
        assert_relative_eq!(distance_meters(a, b), expected, epsilon = 1e-6);
        assert!((distance_meters(a, b) - 1111.95).abs() < 0.01);
    }

    #[test]
    fn test_known_city_pair() {
        // San Francisco to Los Angeles, roughly 559 km
        let sf = Coordinate::new(37.7749, -122.4194);
        let la = Coordinate::new(34.0522, -118.2437);
        let d = distance_meters(sf, la);
        assert!((d - 559_120.0).abs() < 1_000.0, "got {d}");
    }

    #[test]
    fn test_antipodes_do_not_nan() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(0.0, 180.0);
        let d = distance_meters(a, b);
        assert!(d.is_finite());
        assert_relative_eq!(d, std::f64::consts::PI * EARTH_RADIUS_M, epsilon = 1e-3);
    }

    #[test]
    fn test_validation() {
        assert!(Coordinate::new(90.0, 180.0).is_valid());
        assert!(Coordinate::new(-90.0, -180.0).is_valid());
        assert!(!Coordinate::new(90.1, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, -180.5).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, f64::INFINITY).is_valid());

        let err = Coordinate::new(91.0, 0.0).validate().unwrap_err();
        assert!(matches!(err, CoreError::InvalidSample { .. }));
    }
}
