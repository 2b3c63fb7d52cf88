use serde::{Deserialize, Serialize};
use std::fmt;

/// A WGS84 position in degrees
///
/// Valid points satisfy `-90 <= lat <= 90` and `-180 <= lon <= 180`. The
/// constructor does not enforce this because a failed reprojection
/// deliberately yields an out-of-range point rather than nothing; use
/// [`Point::is_valid`] where the distinction matters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lat: f64,
    pub lon: f64,
}

impl Point {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Check the WGS84 range invariant
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Squared planar distance in degrees, used for nearest-candidate ranking
    pub fn squared_distance(&self, other: &Point) -> f64 {
        let dlat = self.lat - other.lat;
        let dlon = self.lon - other.lon;
        dlat * dlat + dlon * dlon
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}
