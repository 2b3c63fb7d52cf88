//! Coordinate reference systems used by the Korean government datasets
//!
//! Exactly three systems are known: geographic WGS84, the modern GRS80-based
//! UTM-K grid and the legacy Bessel-based central belt grid. Both grids are
//! transverse Mercator projections; the Bessel grid additionally needs a
//! seven-parameter datum shift to reach WGS84.

use std::f64::consts::PI;

use crate::error::{ResolveError, Result};
use crate::model::Point;

const ARC_SECONDS_TO_RAD: f64 = PI / (180.0 * 3600.0);

/// A reference ellipsoid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    pub name: &'static str,
    /// Semi-major axis in meters
    pub a: f64,
    /// Inverse flattening
    pub inv_f: f64,
}

impl Ellipsoid {
    /// First eccentricity squared
    pub fn e2(&self) -> f64 {
        let f = 1.0 / self.inv_f;
        f * (2.0 - f)
    }
}

pub const WGS84: Ellipsoid = Ellipsoid {
    name: "WGS84",
    a: 6_378_137.0,
    inv_f: 298.257_223_563,
};

pub const GRS80: Ellipsoid = Ellipsoid {
    name: "GRS80",
    a: 6_378_137.0,
    inv_f: 298.257_222_101,
};

pub const BESSEL_1841: Ellipsoid = Ellipsoid {
    name: "Bessel 1841",
    a: 6_377_397.155,
    inv_f: 299.152_812_8,
};

/// Seven-parameter Helmert shift to WGS84 (position-vector convention)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatumShift {
    /// Translations in meters
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,
    /// Rotations in arc-seconds
    pub rx: f64,
    pub ry: f64,
    pub rz: f64,
    /// Scale in parts per million
    pub ppm: f64,
}

/// Transverse Mercator grid parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransverseMercator {
    pub ellipsoid: Ellipsoid,
    /// Latitude of origin in degrees
    pub lat0: f64,
    /// Central meridian in degrees
    pub lon0: f64,
    pub scale: f64,
    pub false_easting: f64,
    pub false_northing: f64,
    pub to_wgs84: Option<DatumShift>,
}

/// How a definition maps raw coordinates to geographic ones
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectionKind {
    /// Already longitude/latitude degrees
    Geographic,
    TransverseMercator(TransverseMercator),
}

/// A named coordinate reference system
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionDefinition {
    pub name: &'static str,
    pub epsg: u32,
    pub kind: ProjectionKind,
}

pub const WGS84_GEOGRAPHIC: ProjectionDefinition = ProjectionDefinition {
    name: "WGS84 geographic",
    epsg: 4326,
    kind: ProjectionKind::Geographic,
};

/// Modern national grid (false easting 1,000,000)
pub const UTMK_GRS80: ProjectionDefinition = ProjectionDefinition {
    name: "UTM-K (GRS80)",
    epsg: 5179,
    kind: ProjectionKind::TransverseMercator(TransverseMercator {
        ellipsoid: GRS80,
        lat0: 38.0,
        lon0: 127.5,
        scale: 0.9996,
        false_easting: 1_000_000.0,
        false_northing: 2_000_000.0,
        to_wgs84: None,
    }),
};

/// Legacy central belt grid (false easting 200,000)
pub const KOREA_CENTRAL_BESSEL: ProjectionDefinition = ProjectionDefinition {
    name: "Korean 1985 modified central belt (Bessel)",
    epsg: 5174,
    kind: ProjectionKind::TransverseMercator(TransverseMercator {
        ellipsoid: BESSEL_1841,
        lat0: 38.0,
        lon0: 127.002_890_277_777_8,
        scale: 1.0,
        false_easting: 200_000.0,
        false_northing: 500_000.0,
        to_wgs84: Some(DatumShift {
            dx: -115.80,
            dy: 474.99,
            dz: 674.11,
            rx: 1.16,
            ry: -2.31,
            rz: -1.63,
            ppm: 6.43,
        }),
    }),
};

impl ProjectionDefinition {
    /// Convert a raw `[x, y]` pair to a WGS84 point
    ///
    /// For geographic definitions `x` is the longitude and `y` the latitude.
    pub fn to_geographic(&self, x: f64, y: f64) -> Result<Point> {
        let point = match &self.kind {
            ProjectionKind::Geographic => Point::new(y, x),
            ProjectionKind::TransverseMercator(tm) => tm.inverse(x, y)?,
        };

        if point.is_valid() {
            Ok(point)
        } else {
            Err(ResolveError::Projection(format!(
                "{} produced out-of-range point {} from [{}, {}]",
                self.name, point, x, y
            )))
        }
    }
}

impl TransverseMercator {
    fn meridian_arc(&self, phi: f64) -> f64 {
        let e2 = self.ellipsoid.e2();
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        self.ellipsoid.a
            * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
                - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
                + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
                - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
    }

    /// Grid coordinates to WGS84 (series expansion, Snyder 1987)
    pub fn inverse(&self, x: f64, y: f64) -> Result<Point> {
        if !x.is_finite() || !y.is_finite() {
            return Err(ResolveError::Projection(format!(
                "non-finite grid coordinate [{}, {}]",
                x, y
            )));
        }

        let a = self.ellipsoid.a;
        let e2 = self.ellipsoid.e2();
        let ep2 = e2 / (1.0 - e2);
        let k0 = self.scale;

        let m = self.meridian_arc(self.lat0.to_radians()) + (y - self.false_northing) / k0;
        let mu = m / (a * (1.0 - e2 / 4.0 - 3.0 * e2 * e2 / 64.0 - 5.0 * e2 * e2 * e2 / 256.0));
        let sqrt_1me2 = (1.0 - e2).sqrt();
        let e1 = (1.0 - sqrt_1me2) / (1.0 + sqrt_1me2);

        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

        let (sin1, cos1) = phi1.sin_cos();
        let tan1 = phi1.tan();
        let c1 = ep2 * cos1 * cos1;
        let t1 = tan1 * tan1;
        let w = 1.0 - e2 * sin1 * sin1;
        let n1 = a / w.sqrt();
        let r1 = a * (1.0 - e2) / w.powf(1.5);
        let d = (x - self.false_easting) / (n1 * k0);

        let phi = phi1
            - (n1 * tan1 / r1)
                * (d * d / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d.powi(4) / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * ep2 - 3.0 * c1 * c1)
                        * d.powi(6)
                        / 720.0);
        let lam = self.lon0.to_radians()
            + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
                + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1)
                    * d.powi(5)
                    / 120.0)
                / cos1;

        let (lat, lon) = match &self.to_wgs84 {
            Some(shift) => shift_to_wgs84(&self.ellipsoid, shift, phi, lam),
            None => (phi, lam),
        };

        Ok(Point::new(lat.to_degrees(), lon.to_degrees()))
    }

    /// Geographic coordinates on this grid's own datum to grid `[x, y]`
    pub fn forward(&self, lat: f64, lon: f64) -> [f64; 2] {
        let a = self.ellipsoid.a;
        let e2 = self.ellipsoid.e2();
        let ep2 = e2 / (1.0 - e2);
        let k0 = self.scale;
        let phi = lat.to_radians();

        let (sin, cos) = phi.sin_cos();
        let tan = phi.tan();
        let n = a / (1.0 - e2 * sin * sin).sqrt();
        let t = tan * tan;
        let c = ep2 * cos * cos;
        let big_a = (lon - self.lon0).to_radians() * cos;
        let m = self.meridian_arc(phi);
        let m0 = self.meridian_arc(self.lat0.to_radians());

        let x = self.false_easting
            + k0 * n
                * (big_a
                    + (1.0 - t + c) * big_a.powi(3) / 6.0
                    + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * big_a.powi(5) / 120.0);
        let y = self.false_northing
            + k0 * (m - m0
                + n * tan
                    * (big_a * big_a / 2.0
                        + (5.0 - t + 9.0 * c + 4.0 * c * c) * big_a.powi(4) / 24.0
                        + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * big_a.powi(6)
                            / 720.0));
        [x, y]
    }
}

/// Geodetic (radians, source datum) to geodetic (radians, WGS84) via ECEF
fn shift_to_wgs84(source: &Ellipsoid, shift: &DatumShift, phi: f64, lam: f64) -> (f64, f64) {
    let e2 = source.e2();
    let (sin_phi, cos_phi) = phi.sin_cos();
    let n = source.a / (1.0 - e2 * sin_phi * sin_phi).sqrt();
    let x = n * cos_phi * lam.cos();
    let y = n * cos_phi * lam.sin();
    let z = n * (1.0 - e2) * sin_phi;

    let rx = shift.rx * ARC_SECONDS_TO_RAD;
    let ry = shift.ry * ARC_SECONDS_TO_RAD;
    let rz = shift.rz * ARC_SECONDS_TO_RAD;
    let s = 1.0 + shift.ppm * 1e-6;

    let x2 = shift.dx + s * (x - rz * y + ry * z);
    let y2 = shift.dy + s * (rz * x + y - rx * z);
    let z2 = shift.dz + s * (-ry * x + rx * y + z);

    ecef_to_geodetic(&WGS84, x2, y2, z2)
}

fn ecef_to_geodetic(target: &Ellipsoid, x: f64, y: f64, z: f64) -> (f64, f64) {
    let e2 = target.e2();
    let p = (x * x + y * y).sqrt();
    let lam = y.atan2(x);
    let mut phi = z.atan2(p * (1.0 - e2));
    for _ in 0..5 {
        let sin_phi = phi.sin();
        let n = target.a / (1.0 - e2 * sin_phi * sin_phi).sqrt();
        let h = p / phi.cos() - n;
        phi = z.atan2(p * (1.0 - e2 * n / (n + h)));
    }
    (phi, lam)
}
