//! Store listings inside a zone
//!
//! Trade zones are listed by zone id, admin districts by admin code. Both
//! listings are paginated: the first page announces `totalCount`, the rest
//! are fetched in batches by [`fetch_remaining_pages`].

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::paging::{fetch_remaining_pages, page_count};
use crate::error::{ResolveError, Result};
use crate::model::{Point, ProgressPhase, ProgressSender, Store, Zone, ZoneKind};
use crate::ports::TextFetcher;
use crate::upstream::{
    build_url, decode_listing, expect_json, f64_field, redact_url, str_field, Credentials,
    Endpoints, Listing, PagingConfig,
};

const ENDPOINT: &str = "store-listing";

/// One page of a listing
struct Page {
    stores: Vec<Store>,
    total_count: Option<usize>,
}

/// Where a zone's stores are listed, as `(base url, query params)`
struct ListingQuery {
    base: String,
    params: Vec<(&'static str, String)>,
}

pub struct StoreLocator<F> {
    fetcher: Arc<F>,
    endpoints: Endpoints,
    credentials: Credentials,
    paging: PagingConfig,
}

impl<F> StoreLocator<F>
where
    F: TextFetcher,
{
    pub fn new(
        fetcher: Arc<F>,
        endpoints: Endpoints,
        credentials: Credentials,
        paging: PagingConfig,
    ) -> Self {
        Self {
            fetcher,
            endpoints,
            credentials,
            paging,
        }
    }

    /// Every store listed inside `zone`
    ///
    /// An explicitly empty listing is a valid, empty result. Progress is
    /// reported per page batch on `progress`.
    ///
    /// # Errors
    ///
    /// Fails if the zone service key is missing or the first page cannot be
    /// fetched; later page failures are logged and skipped.
    #[instrument(skip(self, zone, progress), fields(zone = %zone.cache_label(), kind = ?zone.kind()))]
    pub async fn stores_in(&self, zone: &Zone, progress: &ProgressSender) -> Result<Vec<Store>> {
        let query = self.listing_query(zone)?;

        let first = self.fetch_page(&query, 1).await?;
        let total_pages = first
            .total_count
            .map(|count| page_count(count, self.paging.rows_per_page))
            .unwrap_or(1);
        progress.emit(ProgressPhase::FirstPage, 1, total_pages);
        debug!(total_pages, first_page = first.stores.len(), "First store page fetched");

        let mut stores = first.stores;
        if total_pages > 1 {
            let rest = fetch_remaining_pages(total_pages, &self.paging, progress, |page| {
                let query = &query;
                async move { self.fetch_page(query, page).await.map(|page| page.stores) }
            })
            .await;
            stores.extend(rest);
        } else {
            progress.emit(ProgressPhase::Done, 1, 1);
        }

        info!(count = stores.len(), "Stores listed");
        Ok(stores)
    }

    fn listing_query(&self, zone: &Zone) -> Result<ListingQuery> {
        let key = self
            .credentials
            .zone_service_key
            .clone()
            .ok_or_else(|| ResolveError::auth("zone service key is not configured"))?;

        let (base, mut params) = match zone.kind() {
            ZoneKind::Trade => (
                self.endpoints.zone_stores.clone(),
                vec![("key", zone.id().to_string())],
            ),
            ZoneKind::Admin => {
                let code = zone.admin_code().ok_or_else(|| {
                    ResolveError::not_found(format!("admin zone '{}' has no code", zone.id()))
                })?;
                (
                    self.endpoints.district_stores.clone(),
                    vec![("divId", "adongCd".to_string()), ("key", code.to_string())],
                )
            }
        };
        params.push(("type", "json".to_string()));
        params.push(("serviceKey", key));

        Ok(ListingQuery { base, params })
    }

    async fn fetch_page(&self, query: &ListingQuery, page: usize) -> Result<Page> {
        let rows = self.paging.rows_per_page.to_string();
        let page_no = page.to_string();
        let mut params: Vec<(&str, &str)> = query
            .params
            .iter()
            .map(|(name, value)| (*name, value.as_str()))
            .collect();
        params.push(("numOfRows", rows.as_str()));
        params.push(("pageNo", page_no.as_str()));
        let url = build_url(&query.base, &params);

        debug!(url = %redact_url(&url), page, "Fetching store page");
        let body = self.fetcher.fetch_text(&url).await?;
        let value = expect_json(&body, ENDPOINT)?;

        match decode_listing(&value, ENDPOINT)? {
            Listing::Items { items, total_count } => Ok(Page {
                stores: items.iter().filter_map(parse_store).collect(),
                total_count,
            }),
            Listing::NoData => Ok(Page {
                stores: Vec::new(),
                total_count: Some(0),
            }),
        }
    }
}

fn parse_store(item: &Value) -> Option<Store> {
    let location = match (f64_field(item, &["lat"]), f64_field(item, &["lon"])) {
        (Some(lat), Some(lon)) => Some(Point::new(lat, lon)).filter(Point::is_valid),
        _ => None,
    };
    Some(Store {
        id: str_field(item, &["bizesId", "id"])?,
        name: str_field(item, &["bizesNm", "name"])?,
        category: str_field(item, &["indsLclsNm", "category"]),
        address: str_field(item, &["rdnmAdr", "lnoAdr", "address"]),
        location,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProgressEvent;
    use crate::testing::FakeFetcher;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn page_body(ids: &[u32], total: usize) -> String {
        let items: Vec<String> = ids
            .iter()
            .map(|id| {
                format!(
                    r#"{{"bizesId": "MA{id}", "bizesNm": "가게{id}", "indsLclsNm": "음식",
                        "rdnmAdr": "서울특별시 중구 세종대로 {id}", "lon": 126.97, "lat": "37.56"}}"#
                )
            })
            .collect();
        format!(
            r#"{{"header": {{"resultCode": "00"}}, "body": {{"items": [{}], "totalCount": {}}}}}"#,
            items.join(","),
            total
        )
    }

    fn locator(fetcher: FakeFetcher) -> StoreLocator<FakeFetcher> {
        StoreLocator::new(
            Arc::new(fetcher),
            Endpoints::default(),
            Credentials {
                zone_service_key: Some("zone".to_string()),
                ..Default::default()
            },
            PagingConfig {
                rows_per_page: 2,
                batch_size: 3,
                batch_delay: Duration::ZERO,
                max_pages: 200,
            },
        )
    }

    fn trade_zone() -> Zone {
        Zone::trade("3110001", "광화문역", "서울특별시", "종로구", None, "POLYGON EMPTY")
    }

    #[tokio::test]
    async fn test_trade_zone_listing_walks_all_pages() {
        let fetcher = FakeFetcher::new()
            .on("pageNo=1", page_body(&[1, 2], 5))
            .on("pageNo=2", page_body(&[3, 4], 5))
            .on("pageNo=3", page_body(&[5], 5));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let stores = locator(fetcher.clone())
            .stores_in(&trade_zone(), &ProgressSender::new(tx))
            .await
            .unwrap();

        let ids: Vec<&str> = stores.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["MA1", "MA2", "MA3", "MA4", "MA5"]);
        assert_eq!(stores[0].category.as_deref(), Some("음식"));
        assert_eq!(stores[0].location, Some(Point::new(37.56, 126.97)));

        let first = &fetcher.calls()[0];
        assert!(first.contains("storeListInArea?key=3110001&type=json"), "{}", first);

        let mut events: Vec<ProgressEvent> = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert_eq!(events[0].phase, ProgressPhase::FirstPage);
        assert_eq!(events[0].total, 3);
        assert_eq!(events.last().unwrap().phase, ProgressPhase::Done);
    }

    #[tokio::test]
    async fn test_admin_zone_uses_district_listing() {
        let fetcher = FakeFetcher::new().on("storeListInDong", page_body(&[7], 1));
        let zone = Zone::admin("1", "역삼1동", "서울특별시", "강남구", "1168064000");

        let stores = locator(fetcher.clone())
            .stores_in(&zone, &ProgressSender::none())
            .await
            .unwrap();

        assert_eq!(stores.len(), 1);
        assert!(fetcher.calls()[0].contains("divId=adongCd&key=1168064000"));
    }

    #[tokio::test]
    async fn test_no_data_is_empty_listing() {
        let fetcher = FakeFetcher::new().on(
            "storeListInArea",
            r#"{"header": {"resultCode": "03", "resultMsg": "NODATA_ERROR"}}"#,
        );

        let stores = locator(fetcher.clone())
            .stores_in(&trade_zone(), &ProgressSender::none())
            .await
            .unwrap();

        assert!(stores.is_empty());
        assert_eq!(fetcher.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_first_page_failure_is_propagated() {
        let fetcher = FakeFetcher::new().on(
            "storeListInArea",
            r#"{"header": {"resultCode": "30", "resultMsg": "SERVICE_KEY_IS_NOT_REGISTERED_ERROR"}}"#,
        );

        let err = locator(fetcher)
            .stores_in(&trade_zone(), &ProgressSender::none())
            .await
            .unwrap_err();

        assert!(matches!(err, ResolveError::Auth(_)));
    }
}
