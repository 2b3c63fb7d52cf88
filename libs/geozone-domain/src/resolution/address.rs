//! Free-text address resolution
//!
//! Tries three search categories against the same geocoding endpoint, in a
//! fixed priority order: road-name address, parcel address, then generic
//! place search. The first non-empty result wins and later categories are
//! never queried. "Not found" answers are silent; any other failure is kept
//! for the diagnostic returned when every category comes up empty.

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::error::{ResolveError, Result};
use crate::model::Point;
use crate::ports::TextFetcher;
use crate::upstream::{build_url, expect_json, f64_field, redact_url, str_field};

const ENDPOINT: &str = "geocoder";

/// Search categories in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchCategory {
    /// Structured road-name address
    Road,
    /// Structured parcel (lot-number) address
    Parcel,
    /// Generic place-name search
    Place,
}

impl SearchCategory {
    /// Higher-precision structured matches come first
    pub const PRIORITY: [SearchCategory; 3] = [Self::Road, Self::Parcel, Self::Place];

    fn query_params(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Road => &[("type", "address"), ("category", "road")],
            Self::Parcel => &[("type", "address"), ("category", "parcel")],
            Self::Place => &[("type", "place")],
        }
    }
}

impl fmt::Display for SearchCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Road => "road",
            Self::Parcel => "parcel",
            Self::Place => "place",
        };
        f.write_str(name)
    }
}

/// A geocoded address
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedAddress {
    pub point: Point,
    /// Provider's canonical rendering of the matched address or place
    pub canonical_label: String,
}

/// Resolves free-text addresses to points
pub struct AddressResolver<F> {
    fetcher: Arc<F>,
    endpoint: String,
    key: Option<String>,
}

impl<F> AddressResolver<F>
where
    F: TextFetcher,
{
    pub fn new(fetcher: Arc<F>, endpoint: impl Into<String>, key: Option<String>) -> Self {
        Self {
            fetcher,
            endpoint: endpoint.into(),
            key,
        }
    }

    /// Resolve an address to a point and canonical label
    ///
    /// # Errors
    ///
    /// - `ResolveError::Auth` if no geocoder key is configured, or every
    ///   category was rejected for credential reasons
    /// - `ResolveError::NotFound` if no category produced a match
    #[instrument(skip(self))]
    pub async fn resolve(&self, address_text: &str) -> Result<ResolvedAddress> {
        let key = self
            .key
            .as_deref()
            .ok_or_else(|| ResolveError::auth("geocoder key is not configured"))?;

        let query = address_text.trim();
        if query.is_empty() {
            return Err(ResolveError::not_found("empty address"));
        }

        let mut failures: Vec<(SearchCategory, ResolveError)> = Vec::new();

        for category in SearchCategory::PRIORITY {
            match self.search(query, category, key).await {
                Ok(Some(found)) => {
                    info!(%category, label = %found.canonical_label, point = %found.point, "Address resolved");
                    return Ok(found);
                }
                Ok(None) => debug!(%category, "No match in category"),
                Err(err) => {
                    warn!(%category, error = %err, "Geocoder attempt failed");
                    failures.push((category, err));
                }
            }
        }

        if failures.len() == SearchCategory::PRIORITY.len()
            && failures.iter().all(|(_, err)| matches!(err, ResolveError::Auth(_)))
        {
            return Err(ResolveError::auth(diagnostic(&failures)));
        }

        if failures.is_empty() {
            Err(ResolveError::not_found(format!("no match for '{}'", query)))
        } else {
            Err(ResolveError::not_found(format!(
                "no match for '{}' ({})",
                query,
                diagnostic(&failures)
            )))
        }
    }

    /// One category attempt; `Ok(None)` means the provider found nothing
    async fn search(
        &self,
        query: &str,
        category: SearchCategory,
        key: &str,
    ) -> Result<Option<ResolvedAddress>> {
        let mut params: Vec<(&str, &str)> = vec![
            ("service", "search"),
            ("request", "search"),
            ("version", "2.0"),
            ("crs", "EPSG:4326"),
            ("size", "10"),
            ("page", "1"),
            ("query", query),
        ];
        params.extend_from_slice(category.query_params());
        params.extend_from_slice(&[("format", "json"), ("errorformat", "json"), ("key", key)]);
        let url = build_url(&self.endpoint, &params);

        debug!(url = %redact_url(&url), %category, "Querying geocoder");
        let body = self.fetcher.fetch_text(&url).await?;
        let value = expect_json(&body, ENDPOINT)?;
        let response = value.get("response").unwrap_or(&value);

        match response.get("status").and_then(Value::as_str) {
            Some("OK") => {}
            Some("NOT_FOUND") => return Ok(None),
            status => {
                let error = response.get("error");
                let code = error.and_then(|e| str_field(e, &["code"])).unwrap_or_default();
                let text = error
                    .and_then(|e| str_field(e, &["text"]))
                    .unwrap_or_else(|| format!("status {:?}", status));
                return Err(if code.to_ascii_uppercase().contains("KEY") {
                    ResolveError::auth(format!("{} ({})", text, code))
                } else {
                    ResolveError::parse(ENDPOINT, format!("{} {}", code, text).trim().to_string())
                });
            }
        }

        let items = response
            .pointer("/result/items")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        Ok(items
            .iter()
            .find_map(|item| parse_item(item, category, query)))
    }
}

fn parse_item(item: &Value, category: SearchCategory, query: &str) -> Option<ResolvedAddress> {
    let point = item.get("point")?;
    let lon = f64_field(point, &["x"])?;
    let lat = f64_field(point, &["y"])?;
    let point = Point::new(lat, lon);
    if !point.is_valid() {
        return None;
    }

    let address = item.get("address");
    let from_address = |key: &str| address.and_then(|a| str_field(a, &[key]));
    let label = match category {
        SearchCategory::Road => from_address("road"),
        SearchCategory::Parcel => from_address("parcel"),
        SearchCategory::Place => from_address("road").or_else(|| from_address("parcel")),
    }
    .or_else(|| str_field(item, &["title"]))
    .unwrap_or_else(|| query.to_string());

    Some(ResolvedAddress {
        point,
        canonical_label: label,
    })
}

fn diagnostic(failures: &[(SearchCategory, ResolveError)]) -> String {
    failures
        .iter()
        .map(|(category, err)| format!("{}: {}", category, err))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeFetcher;

    const ROAD_HIT: &str = r#"{"response": {"status": "OK", "result": {"items": [
        {"address": {"road": "서울특별시 중구 세종대로 110", "parcel": "태평로1가 31"},
         "point": {"x": "126.9779692", "y": "37.566535"}}
    ]}}}"#;
    const PARCEL_HIT: &str = r#"{"response": {"status": "OK", "result": {"items": [
        {"address": {"parcel": "서울특별시 강남구 역삼동 737"},
         "point": {"x": 127.0286, "y": 37.5006}}
    ]}}}"#;
    const NOT_FOUND: &str = r#"{"response": {"status": "NOT_FOUND"}}"#;
    const KEY_ERROR: &str = r#"{"response": {"status": "ERROR", "error": {"code": "INVALID_KEY", "text": "등록되지 않은 인증키입니다."}}}"#;

    fn resolver(fetcher: FakeFetcher) -> AddressResolver<FakeFetcher> {
        AddressResolver::new(
            Arc::new(fetcher),
            "https://geo.test/req/search",
            Some("k".to_string()),
        )
    }

    #[tokio::test]
    async fn test_road_match_stops_search() {
        let fetcher = FakeFetcher::new().on("category=road", ROAD_HIT);
        let resolver = resolver(fetcher.clone());

        let found = resolver.resolve("세종대로 110").await.unwrap();

        assert_eq!(found.canonical_label, "서울특별시 중구 세종대로 110");
        assert!((found.point.lat - 37.566535).abs() < 1e-9);
        assert_eq!(fetcher.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_falls_through_not_found_to_parcel() {
        let fetcher = FakeFetcher::new()
            .on("category=road", NOT_FOUND)
            .on("category=parcel", PARCEL_HIT);
        let resolver = resolver(fetcher.clone());

        let found = resolver.resolve("역삼동 737").await.unwrap();

        assert_eq!(found.canonical_label, "서울특별시 강남구 역삼동 737");
        assert_eq!(fetcher.calls_matching("type=place"), 0);
    }

    #[tokio::test]
    async fn test_error_then_place_hit_still_succeeds() {
        let place = r#"{"response": {"status": "OK", "result": {"items": [
            {"title": "서울시청", "point": {"x": "126.978", "y": "37.5665"}}
        ]}}}"#;
        let fetcher = FakeFetcher::new()
            .fail("category=road", ResolveError::parse("geocoder", "bad"))
            .on("category=parcel", NOT_FOUND)
            .on("type=place", place);

        let found = resolver(fetcher).resolve("서울시청").await.unwrap();
        assert_eq!(found.canonical_label, "서울시청");
    }

    #[tokio::test]
    async fn test_all_empty_is_not_found_without_diagnostic() {
        let fetcher = FakeFetcher::new().on("search", NOT_FOUND);

        let err = resolver(fetcher).resolve("없는 주소").await.unwrap_err();

        assert_eq!(err, ResolveError::not_found("no match for '없는 주소'"));
    }

    #[tokio::test]
    async fn test_failures_accumulate_into_diagnostic() {
        let fetcher = FakeFetcher::new()
            .fail(
                "category=road",
                ResolveError::AllPathsFailed {
                    url: "u".to_string(),
                    attempts: 2,
                    last: "HTTP 503".to_string(),
                },
            )
            .on("category=parcel", NOT_FOUND)
            .on("type=place", "<error><message>quota exceeded</message></error>");

        let err = resolver(fetcher).resolve("어딘가").await.unwrap_err();

        match err {
            ResolveError::NotFound(message) => {
                assert!(message.contains("road:"));
                assert!(message.contains("HTTP 503"));
                assert!(message.contains("place:"));
                assert!(message.contains("quota exceeded"));
                assert!(!message.contains("parcel:"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rejected_key_everywhere_is_auth_error() {
        let fetcher = FakeFetcher::new().on("search", KEY_ERROR);
        let err = resolver(fetcher).resolve("세종대로").await.unwrap_err();
        assert!(matches!(err, ResolveError::Auth(_)));
    }

    #[tokio::test]
    async fn test_missing_key_is_auth_error() {
        let fetcher = FakeFetcher::new();
        let resolver = AddressResolver::new(Arc::new(fetcher.clone()), "https://geo.test", None);

        let err = resolver.resolve("세종대로").await.unwrap_err();

        assert!(matches!(err, ResolveError::Auth(_)));
        assert!(fetcher.calls().is_empty());
    }
}
