//! Port implementations

mod dataset;
mod fetch_client;

pub use dataset::GeoJsonFileDataset;
pub use fetch_client::{FetchClientConfig, NetworkPath, ResilientFetchClient};
