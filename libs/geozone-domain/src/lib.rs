//! # Geozone Domain Layer
//!
//! Resolves a free-text address or a selected zone into a polygon boundary
//! and an associated store listing, reconciling three mutually inconsistent
//! government geodata sources:
//!
//! - a commerce-zone service (numeric zone ids, embedded WKT polygons)
//! - a statistics boundary service (its own admin codes, UTM-K GeoJSON)
//! - an address / geocoding service (a third coding scheme)
//!
//! ## Architecture
//!
//! - **Model**: points, zones, polygons, stores ([`model`])
//! - **Ports**: traits for network, time and the bundled dataset ([`ports`])
//! - **Geometry**: WKT / GeoJSON parsing and CRS normalization ([`geometry`])
//! - **Resolution**: the services and the [`ResolutionEngine`] facade ([`resolution`])
//!
//! This layer has no HTTP client dependency; the `geozone-http` crate
//! provides the network adapter.
//!
//! ## Example
//!
//! ```rust,no_run
//! use geozone_domain::ports::TextFetcher;
//! use geozone_domain::ResolutionEngine;
//!
//! async fn example<F: TextFetcher + 'static>(engine: ResolutionEngine<F>) {
//!     let (address, zones) = engine.zones_near_address("서울 중구 세종대로 110", 500).await.unwrap();
//!     println!("{} -> {} zone(s)", address.canonical_label, zones.len());
//!     let zone = engine.resolve_zone(zones[0].clone()).await;
//!     println!("boundary rings: {}", zone.resolved_polygon().map_or(0, |p| p.rings().len()));
//! }
//! ```

pub mod error;
pub mod geometry;
pub mod model;
pub mod ports;
pub mod resolution;
pub mod upstream;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use error::{ResolveError, Result};
pub use model::{Point, Polygon, Ring, Store, Zone, ZoneKind};
pub use ports::{BoundaryDataset, Clock, SystemClock, TextFetcher};
pub use resolution::{ResolutionEngine, ResolvedAddress};
pub use upstream::ResolverConfig;
