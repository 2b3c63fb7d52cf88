//! Configuration for the resolution services

use std::time::Duration;

/// Base URLs of the upstream providers
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Address / place search (geocoding) endpoint
    pub geocoder: String,
    /// Commerce-zone radius search
    pub zone_radius: String,
    /// Store listing inside a trade zone
    pub zone_stores: String,
    /// Store listing inside an administrative district
    pub district_stores: String,
    /// Administrative hierarchy (province / city / district code lists)
    pub hierarchy: String,
    /// Statistics service root; `auth`, `geocode` and `boundary` paths hang off it
    pub statistics: String,
    /// Web feature service used for boundary queries by district code
    pub feature_service: String,
    /// Feature layer holding district boundaries
    pub feature_layer: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            geocoder: "https://api.vworld.kr/req/search".to_string(),
            zone_radius: "https://apis.data.go.kr/B553077/api/open/sdsc2/storeZoneInRadius"
                .to_string(),
            zone_stores: "https://apis.data.go.kr/B553077/api/open/sdsc2/storeListInArea"
                .to_string(),
            district_stores: "https://apis.data.go.kr/B553077/api/open/sdsc2/storeListInDong"
                .to_string(),
            hierarchy: "https://api.vworld.kr/req/address/hierarchy".to_string(),
            statistics: "https://sgisapi.kostat.go.kr/OpenAPI3".to_string(),
            feature_service: "https://api.vworld.kr/req/data".to_string(),
            feature_layer: "LT_C_ADEMD_INFO".to_string(),
        }
    }
}

/// Upstream credentials
///
/// In proxied deployments these hold opaque placeholder tokens which the
/// key-redaction proxy swaps for real secrets; the engine treats both the same.
#[derive(Clone, Default)]
pub struct Credentials {
    /// Key for the geocoder, hierarchy and feature services
    pub geodata_key: Option<String>,
    /// Key for the commerce-zone and store services
    pub zone_service_key: Option<String>,
    pub statistics_key: Option<String>,
    pub statistics_secret: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |value: &Option<String>| value.as_ref().map(|_| "***");
        f.debug_struct("Credentials")
            .field("geodata_key", &mask(&self.geodata_key))
            .field("zone_service_key", &mask(&self.zone_service_key))
            .field("statistics_key", &mask(&self.statistics_key))
            .field("statistics_secret", &mask(&self.statistics_secret))
            .finish()
    }
}

/// Pagination behavior for large listings
#[derive(Debug, Clone)]
pub struct PagingConfig {
    /// Rows requested per page
    pub rows_per_page: usize,
    /// Pages fetched concurrently per batch (clamped to 3..=6)
    pub batch_size: usize,
    /// Pause between batches
    pub batch_delay: Duration,
    /// Hard cap on pages fetched for one listing
    pub max_pages: usize,
}

impl PagingConfig {
    pub const MIN_BATCH: usize = 3;
    pub const MAX_BATCH: usize = 6;

    /// Batch size within the allowed range
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.clamp(Self::MIN_BATCH, Self::MAX_BATCH)
    }
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            rows_per_page: 1000,
            batch_size: 4,
            batch_delay: Duration::from_millis(300),
            max_pages: 200,
        }
    }
}

/// Configuration for the resolution engine
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub endpoints: Endpoints,
    pub credentials: Credentials,
    pub paging: PagingConfig,
    /// A cached token is reused only while it has more than this left
    pub token_refresh_margin: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            credentials: Credentials::default(),
            paging: PagingConfig::default(),
            token_refresh_margin: Duration::from_secs(5 * 60),
        }
    }
}
