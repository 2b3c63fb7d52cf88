//! Geometry: WKT and GeoJSON parsing, CRS detection and reprojection

pub mod geojson;
pub mod projection;
pub mod reproject;
pub mod wkt;

pub use geojson::{largest_outer_ring, Feature, FeatureCollection};
pub use projection::{ProjectionDefinition, KOREA_CENTRAL_BESSEL, UTMK_GRS80, WGS84_GEOGRAPHIC};
pub use reproject::CoordinateReprojector;
pub use wkt::parse_wkt;
