//! Resolution services
//!
//! Address → point ([`AddressResolver`]), point or hierarchy → zones
//! ([`ZoneLocator`]), zone → polygon ([`BoundaryResolver`]) and zone → stores
//! ([`StoreLocator`]). [`ResolutionEngine`] wires them around one fetcher.

pub mod address;
pub mod boundary;
pub mod cache;
pub mod engine;
pub mod paging;
pub mod stores;
pub mod token;
pub mod zone_locator;

pub use address::{AddressResolver, ResolvedAddress, SearchCategory};
pub use boundary::{
    BoundaryResolver, BoundaryStrategy, FeatureServiceBoundary, LocalDatasetBoundary,
    StatisticsBoundary,
};
pub use cache::PolygonCache;
pub use engine::{split_label, LabelParts, ResolutionEngine};
pub use paging::fetch_remaining_pages;
pub use stores::StoreLocator;
pub use token::{AuthToken, TokenManager};
pub use zone_locator::{HierarchyLevel, ZoneLocator};
