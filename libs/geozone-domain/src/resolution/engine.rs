//! Resolution engine facade
//!
//! Wires the resolvers together around one fetcher and owns the two pieces
//! of shared state, the [`PolygonCache`] and the [`TokenManager`]. Each engine
//! instance carries its own; nothing is process-global.

use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::address::{AddressResolver, ResolvedAddress};
use super::boundary::{BoundaryResolver, LocalDatasetBoundary};
use super::cache::PolygonCache;
use super::stores::StoreLocator;
use super::token::TokenManager;
use super::zone_locator::ZoneLocator;
use crate::error::{ResolveError, Result};
use crate::model::{Point, Polygon, ProgressSender, Store, Zone};
use crate::ports::{BoundaryDataset, Clock, SystemClock, TextFetcher};
use crate::upstream::ResolverConfig;

/// Administrative unit suffixes that mark a district token in an address
const DISTRICT_MARKERS: [char; 4] = ['동', '읍', '면', '가'];

/// Provinces with no city tier; their labels go straight to road or district
const CITYLESS_PROVINCE_SUFFIX: &str = "특별자치시";

/// Address, zone, boundary and store resolution behind one handle
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use geozone_domain::{ResolutionEngine, ResolverConfig, SystemClock, TextFetcher};
///
/// async fn boundary_of_first_district<F: TextFetcher + 'static>(fetcher: Arc<F>) {
///     let engine = ResolutionEngine::new(fetcher, Arc::new(SystemClock), ResolverConfig::default());
///     let (_, districts) = engine.admin_zones_for_address("서울 강남구 역삼동 737").await.unwrap();
///     let polygon = engine.zone_polygon(&districts[0]).await;
///     println!("{} point(s)", polygon.point_count());
/// }
/// ```
pub struct ResolutionEngine<F, C = SystemClock> {
    addresses: AddressResolver<F>,
    zones: ZoneLocator<F>,
    stores: StoreLocator<F>,
    tokens: Arc<TokenManager<F, C>>,
    boundaries: BoundaryResolver,
    cache: PolygonCache,
}

impl<F, C> ResolutionEngine<F, C>
where
    F: TextFetcher + 'static,
    C: Clock + 'static,
{
    /// Build an engine with the network boundary strategies
    ///
    /// Add the bundled-dataset fallback with [`with_dataset`](Self::with_dataset).
    pub fn new(fetcher: Arc<F>, clock: Arc<C>, config: ResolverConfig) -> Self {
        let ResolverConfig {
            endpoints,
            credentials,
            paging,
            token_refresh_margin,
        } = config;

        let tokens = Arc::new(TokenManager::new(
            fetcher.clone(),
            clock.clone(),
            &endpoints.statistics,
            credentials.statistics_key.clone(),
            credentials.statistics_secret.clone(),
            token_refresh_margin,
        ));
        let boundaries = BoundaryResolver::standard(
            fetcher.clone(),
            tokens.clone(),
            clock,
            &endpoints,
            credentials.geodata_key.clone(),
        );

        Self {
            addresses: AddressResolver::new(
                fetcher.clone(),
                endpoints.geocoder.clone(),
                credentials.geodata_key.clone(),
            ),
            zones: ZoneLocator::new(fetcher.clone(), endpoints.clone(), credentials.clone()),
            stores: StoreLocator::new(fetcher, endpoints, credentials, paging),
            tokens,
            boundaries,
            cache: PolygonCache::new(),
        }
    }

    /// Append the bundled dataset as the last boundary strategy
    pub fn with_dataset<D>(mut self, dataset: D) -> Self
    where
        D: BoundaryDataset + 'static,
    {
        self.boundaries =
            std::mem::take(&mut self.boundaries).with_strategy(LocalDatasetBoundary::new(dataset));
        self
    }

    /// Replace the boundary strategy chain
    pub fn with_boundaries(mut self, boundaries: BoundaryResolver) -> Self {
        self.boundaries = boundaries;
        self
    }

    pub fn cache(&self) -> &PolygonCache {
        &self.cache
    }

    pub fn tokens(&self) -> &TokenManager<F, C> {
        &self.tokens
    }

    /// Boundary strategy names in chain order
    pub fn boundary_strategies(&self) -> Vec<&'static str> {
        self.boundaries.strategy_names()
    }

    pub async fn resolve_address(&self, address_text: &str) -> Result<ResolvedAddress> {
        self.addresses.resolve(address_text).await
    }

    pub async fn zones_near(&self, point: Point, radius_meters: u32) -> Result<Vec<Zone>> {
        self.zones.find_nearby(point, radius_meters).await
    }

    /// Geocode `address_text`, then search trade zones around it
    #[instrument(skip(self))]
    pub async fn zones_near_address(
        &self,
        address_text: &str,
        radius_meters: u32,
    ) -> Result<(ResolvedAddress, Vec<Zone>)> {
        let address = self.addresses.resolve(address_text).await?;
        let zones = self.zones.find_nearby(address.point, radius_meters).await?;
        Ok((address, zones))
    }

    pub async fn admin_zones(
        &self,
        province: &str,
        city: &str,
        district_hint: &str,
    ) -> Result<Vec<Zone>> {
        self.zones
            .find_by_hierarchy(province, city, district_hint)
            .await
    }

    /// Geocode `address_text` and list the districts of its city
    ///
    /// The canonical label is split into province, city and district hint.
    /// Every returned zone is anchored at the geocoded point, which the
    /// bundled-dataset fallback uses to tell same-named districts apart.
    #[instrument(skip(self))]
    pub async fn admin_zones_for_address(
        &self,
        address_text: &str,
    ) -> Result<(ResolvedAddress, Vec<Zone>)> {
        let address = self.addresses.resolve(address_text).await?;
        let parts = split_label(&address.canonical_label).ok_or_else(|| {
            ResolveError::not_found(format!(
                "cannot derive province and city from '{}'",
                address.canonical_label
            ))
        })?;
        debug!(province = %parts.province, city = %parts.city, hint = %parts.district_hint, "Label split");

        let zones = self
            .zones
            .find_by_hierarchy(&parts.province, &parts.city, &parts.district_hint)
            .await?
            .into_iter()
            .map(|zone| zone.with_anchor(address.point))
            .collect();
        Ok((address, zones))
    }

    /// Boundary for `zone`, from the zone itself, the cache, or a fresh resolution
    ///
    /// Only non-empty polygons are cached, so a later call can still succeed
    /// after a transient upstream failure.
    #[instrument(skip(self, zone), fields(label = %zone.cache_label()))]
    pub async fn zone_polygon(&self, zone: &Zone) -> Arc<Polygon> {
        if let Some(polygon) = zone.resolved_polygon() {
            return polygon.clone();
        }

        let label = zone.cache_label();
        if let Some(polygon) = self.cache.get(&label) {
            debug!("Polygon cache hit");
            return polygon;
        }

        let polygon = Arc::new(self.boundaries.resolve_polygon(zone).await);
        if !polygon.is_empty() {
            self.cache.put(label, polygon.clone());
        }
        polygon
    }

    /// `zone` enriched with its resolved boundary
    pub async fn resolve_zone(&self, zone: Zone) -> Zone {
        let polygon = self.zone_polygon(&zone).await;
        info!(
            zone = %zone.cache_label(),
            rings = polygon.rings().len(),
            "Zone resolved"
        );
        zone.with_polygon(polygon)
    }

    /// Stores listed inside `zone`, with page-batch progress on `progress`
    pub async fn zone_stores(&self, zone: &Zone, progress: &ProgressSender) -> Result<Vec<Store>> {
        self.stores.stores_in(zone, progress).await
    }
}

impl<F> ResolutionEngine<F, SystemClock>
where
    F: TextFetcher + 'static,
{
    /// An engine on wall-clock time
    pub fn with_system_clock(fetcher: Arc<F>, config: ResolverConfig) -> Self {
        Self::new(fetcher, Arc::new(SystemClock), config)
    }
}

/// Province, city and district hint read out of a canonical address label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelParts {
    pub province: String,
    pub city: String,
    pub district_hint: String,
}

/// Split a canonical label such as `서울특별시 강남구 역삼동 737`
///
/// Cities with their own wards ("성남시 분당구") keep both tokens. A
/// 특별자치시 province has no city tier, so its city is left empty. The hint
/// is the first later token ending in an administrative unit suffix, or
/// empty for road-name labels that carry none.
pub fn split_label(label: &str) -> Option<LabelParts> {
    let tokens: Vec<&str> = label.split_whitespace().collect();
    let (province, rest) = tokens.split_first()?;

    let (city, rest) = if province.ends_with(CITYLESS_PROVINCE_SUFFIX) {
        (String::new(), rest)
    } else {
        let (city, rest) = rest.split_first()?;
        match rest.split_first() {
            Some((ward, tail)) if city.ends_with('시') && ward.ends_with('구') => {
                (format!("{} {}", city, ward), tail)
            }
            _ => (city.to_string(), rest),
        }
    };

    let district_hint = rest
        .iter()
        .find(|token| {
            token.chars().count() > 1
                && token
                    .chars()
                    .last()
                    .is_some_and(|c| DISTRICT_MARKERS.contains(&c))
        })
        .map(|token| token.to_string())
        .unwrap_or_default();

    Some(LabelParts {
        province: province.to_string(),
        city,
        district_hint,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::MockBoundaryDataset;
    use crate::ports::DistrictRecord;
    use geo::{polygon, MultiPolygon};
    use crate::testing::FakeFetcher;
    use crate::upstream::Credentials;

    const PARCEL_HIT: &str = r#"{"response": {"status": "OK", "result": {"items": [
        {"address": {"parcel": "서울특별시 강남구 역삼동 737"}, "point": {"x": "127.0286", "y": "37.5006"}}
    ]}}}"#;
    const PROVINCES: &str = r#"[{"code": "11", "name": "서울특별시"}]"#;
    const CITIES: &str = r#"[{"code": "11680", "name": "강남구"}]"#;
    const DISTRICTS: &str = r#"[
        {"code": "1168064000", "name": "역삼1동"},
        {"code": "1168065000", "name": "역삼2동"},
        {"code": "1168051000", "name": "신사동"}
    ]"#;

    fn config() -> ResolverConfig {
        ResolverConfig {
            credentials: Credentials {
                geodata_key: Some("geo".to_string()),
                zone_service_key: Some("zone".to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn engine(fetcher: FakeFetcher) -> ResolutionEngine<FakeFetcher> {
        ResolutionEngine::with_system_clock(Arc::new(fetcher), config())
    }

    fn dataset() -> MockBoundaryDataset {
        let mut dataset = MockBoundaryDataset::new();
        dataset.expect_load().times(1).returning(|| {
            Ok(vec![DistrictRecord {
                district_name: "역삼1동".to_string(),
                district_code: Some("11230680".to_string()),
                geometry: MultiPolygon(vec![polygon![
                    (x: 127.03, y: 37.49),
                    (x: 127.04, y: 37.49),
                    (x: 127.04, y: 37.50),
                ]]),
            }])
        });
        dataset
    }

    #[tokio::test]
    async fn test_admin_zones_for_address_anchors_and_filters() {
        let fetcher = FakeFetcher::new()
            .on("category=parcel", PARCEL_HIT)
            .on("category=road", r#"{"response": {"status": "NOT_FOUND"}}"#)
            .on("category=province", PROVINCES)
            .on("category=city&", CITIES)
            .on("category=district", DISTRICTS);

        let (address, zones) = engine(fetcher)
            .admin_zones_for_address("역삼동 737")
            .await
            .unwrap();

        let names: Vec<&str> = zones.iter().map(Zone::display_name).collect();
        assert_eq!(names, vec!["역삼1동", "역삼2동"]);
        assert!(zones.iter().all(|z| z.anchor_point() == Some(address.point)));
    }

    #[tokio::test]
    async fn test_boundary_falls_back_to_dataset_and_is_cached() {
        // No statistics credentials and the feature service is unreachable
        let fetcher = FakeFetcher::new();
        let engine = engine(fetcher.clone()).with_dataset(dataset());
        let zone = Zone::admin("1", "역삼1동", "서울특별시", "강남구", "1168064000");

        assert_eq!(
            engine.boundary_strategies(),
            vec!["statistics", "feature-service", "bundled-dataset"]
        );

        let first = engine.zone_polygon(&zone).await;
        let second = engine.zone_polygon(&zone).await;

        assert_eq!(first.point_count(), 4);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(engine.cache().len(), 1);
        assert_eq!(fetcher.calls_matching("GetFeature"), 1);
    }

    #[tokio::test]
    async fn test_empty_boundary_is_not_cached() {
        let engine = engine(FakeFetcher::new());
        let zone = Zone::admin("1", "역삼1동", "서울특별시", "강남구", "1168064000");

        let resolved = engine.resolve_zone(zone).await;

        assert!(resolved.resolved_polygon().unwrap().is_empty());
        assert!(engine.cache().is_empty());
    }

    #[tokio::test]
    async fn test_trade_zone_resolves_from_wkt() {
        let engine = engine(FakeFetcher::new());
        let zone = Zone::trade(
            "3110001",
            "광화문역",
            "서울특별시",
            "종로구",
            None,
            "POLYGON((126.97 37.56, 126.98 37.56, 126.98 37.57, 126.97 37.56))",
        );

        let resolved = engine.resolve_zone(zone).await;
        let polygon = resolved.resolved_polygon().unwrap();

        assert_eq!(polygon.rings()[0].len(), 4);
        assert!(engine.cache().get("서울특별시 종로구 광화문역").is_some());
    }

    #[test]
    fn test_split_parcel_label() {
        let parts = split_label("서울특별시 강남구 역삼동 737").unwrap();
        assert_eq!(parts.province, "서울특별시");
        assert_eq!(parts.city, "강남구");
        assert_eq!(parts.district_hint, "역삼동");
    }

    #[test]
    fn test_split_road_label_has_no_hint() {
        let parts = split_label("서울특별시 중구 세종대로 110").unwrap();
        assert_eq!(parts.city, "중구");
        assert_eq!(parts.district_hint, "");
    }

    #[test]
    fn test_split_keeps_ward_of_city() {
        let parts = split_label("경기도 성남시 분당구 정자동 178-1").unwrap();
        assert_eq!(parts.city, "성남시 분당구");
        assert_eq!(parts.district_hint, "정자동");
    }

    #[test]
    fn test_split_cityless_province() {
        let road = split_label("세종특별자치시 한누리대로 2130").unwrap();
        assert_eq!(road.province, "세종특별자치시");
        assert_eq!(road.city, "");
        assert_eq!(road.district_hint, "");

        let parcel = split_label("세종특별자치시 조치원읍 원리 1").unwrap();
        assert_eq!(parcel.city, "");
        assert_eq!(parcel.district_hint, "조치원읍");
    }

    #[test]
    fn test_split_needs_two_tokens() {
        assert!(split_label("서울특별시").is_none());
        assert!(split_label("  ").is_none());
    }
}
