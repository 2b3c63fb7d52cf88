//! # Geozone HTTP Adapters
//!
//! Infrastructure implementations of the domain ports:
//!
//! - [`ResilientFetchClient`](infrastructure::ResilientFetchClient) implements
//!   `TextFetcher` over reqwest, trying an ordered list of network paths
//! - [`GeoJsonFileDataset`](infrastructure::GeoJsonFileDataset) implements
//!   `BoundaryDataset` over a bundled GeoJSON file
//!
//! Transport, I/O and JSON errors are converted to `ResolveError` here so the
//! domain never sees them.

pub mod infrastructure;

pub use infrastructure::{FetchClientConfig, GeoJsonFileDataset, NetworkPath, ResilientFetchClient};
