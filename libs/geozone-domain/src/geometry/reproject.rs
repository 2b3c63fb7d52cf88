//! CRS detection and normalization to internal `[lat, lon]` points
//!
//! No provider reliably declares its CRS, so the system is inferred from the
//! magnitude of the first component of each raw pair:
//!
//! | `abs(x)`                 | system                     |
//! |--------------------------|----------------------------|
//! | `<= 180`                 | WGS84 geographic `[lon, lat]` |
//! | `> 180` and `< 600,000`  | legacy Bessel central belt (false easting 200,000) |
//! | `>= 600,000`             | UTM-K GRS80 (false easting 1,000,000) |
//!
//! This is an approximation. Coordinates near a threshold can be
//! misclassified and the table has not been checked against provider
//! documentation.

use geo::LineString;
use tracing::{debug, warn};

use super::projection::{
    ProjectionDefinition, ProjectionKind, KOREA_CENTRAL_BESSEL, UTMK_GRS80, WGS84_GEOGRAPHIC,
};
use crate::model::{Point, Ring};

/// Largest first-component magnitude still read as a longitude
pub const GEOGRAPHIC_LIMIT: f64 = 180.0;

/// Easting magnitude from which the modern grid is selected
pub const MODERN_EASTING_FLOOR: f64 = 600_000.0;

/// One row of the detection table
#[derive(Debug, Clone, Copy)]
pub struct CrsRule {
    /// Lower bound on `abs(x)` for this row to apply
    pub min_abs_x: f64,
    /// Whether `abs(x) == min_abs_x` matches this row
    pub inclusive: bool,
    pub projection: &'static ProjectionDefinition,
}

impl CrsRule {
    fn matches(&self, abs_x: f64) -> bool {
        if self.inclusive {
            abs_x >= self.min_abs_x
        } else {
            abs_x > self.min_abs_x
        }
    }
}

/// Detection table, evaluated top to bottom
pub const CRS_RULES: [CrsRule; 3] = [
    CrsRule {
        min_abs_x: MODERN_EASTING_FLOOR,
        inclusive: true,
        projection: &UTMK_GRS80,
    },
    CrsRule {
        min_abs_x: GEOGRAPHIC_LIMIT,
        inclusive: false,
        projection: &KOREA_CENTRAL_BESSEL,
    },
    CrsRule {
        min_abs_x: f64::NEG_INFINITY,
        inclusive: true,
        projection: &WGS84_GEOGRAPHIC,
    },
];

/// Normalizes raw coordinate pairs from any known system to WGS84 points
#[derive(Debug, Clone, Copy)]
pub struct CoordinateReprojector {
    rules: &'static [CrsRule],
}

impl Default for CoordinateReprojector {
    fn default() -> Self {
        Self { rules: &CRS_RULES }
    }
}

impl CoordinateReprojector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick the coordinate system for a raw first component
    pub fn detect(&self, x: f64) -> &'static ProjectionDefinition {
        let abs_x = x.abs();
        self.rules
            .iter()
            .find(|rule| rule.matches(abs_x))
            .map(|rule| rule.projection)
            .unwrap_or(&WGS84_GEOGRAPHIC)
    }

    /// Normalize one raw `[x, y]` pair
    ///
    /// Geographic pairs are only axis-swapped, even when out of range. A
    /// projected pair whose inverse lands outside WGS84 is dropped.
    pub fn normalize_position(&self, x: f64, y: f64) -> Option<Point> {
        let projection = self.detect(x);
        match projection.to_geographic(x, y) {
            Ok(point) => Some(point),
            Err(err) if matches!(projection.kind, ProjectionKind::Geographic) => {
                debug!(x, y, error = %err, "Geographic pair out of range, kept as is");
                Some(Point::new(y, x))
            }
            Err(err) => {
                warn!(
                    projection = projection.name,
                    x, y,
                    error = %err,
                    "Reprojection failed, dropping point"
                );
                None
            }
        }
    }

    /// Normalize a raw ring; points that cannot be reprojected are left out
    pub fn normalize(&self, raw_ring: &LineString<f64>) -> Ring {
        Ring::new(
            raw_ring
                .coords()
                .filter_map(|coord| self.normalize_position(coord.x, coord.y))
                .collect(),
        )
    }
}
