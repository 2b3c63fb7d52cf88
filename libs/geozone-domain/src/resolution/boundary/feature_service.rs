//! Feature-service boundary query by district code

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument};

use super::BoundaryStrategy;
use crate::error::{ResolveError, Result};
use crate::geometry::geojson::first_feature_polygon;
use crate::geometry::{CoordinateReprojector, FeatureCollection};
use crate::model::{Polygon, Zone};
use crate::ports::TextFetcher;
use crate::upstream::{build_url, expect_json, redact_url, str_field, Endpoints};

const ENDPOINT: &str = "feature-service";

/// Providers disagree on 8- and 10-digit district codes; the layer is keyed by 8
pub const DISTRICT_CODE_DIGITS: usize = 8;

pub struct FeatureServiceBoundary<F> {
    fetcher: Arc<F>,
    endpoint: String,
    layer: String,
    key: Option<String>,
    reprojector: CoordinateReprojector,
}

impl<F> FeatureServiceBoundary<F>
where
    F: TextFetcher,
{
    pub fn new(fetcher: Arc<F>, endpoints: &Endpoints, key: Option<String>) -> Self {
        Self {
            fetcher,
            endpoint: endpoints.feature_service.clone(),
            layer: endpoints.feature_layer.clone(),
            key,
            reprojector: CoordinateReprojector::default(),
        }
    }
}

/// First eight characters of an admin code
pub fn district_code_prefix(code: &str) -> &str {
    let code = code.trim();
    match code.char_indices().nth(DISTRICT_CODE_DIGITS) {
        Some((idx, _)) => &code[..idx],
        None => code,
    }
}

#[async_trait]
impl<F> BoundaryStrategy for FeatureServiceBoundary<F>
where
    F: TextFetcher + 'static,
{
    fn name(&self) -> &'static str {
        "feature-service"
    }

    #[instrument(skip(self, zone), fields(code = ?zone.admin_code()))]
    async fn acquire(&self, zone: &Zone) -> Result<Polygon> {
        let Some(code) = zone.admin_code().map(district_code_prefix) else {
            return Ok(Polygon::empty());
        };
        let key = self
            .key
            .as_deref()
            .ok_or_else(|| ResolveError::auth("feature service key is not configured"))?;

        let filter = format!("emdCd:=:{}", code);
        let url = build_url(
            &self.endpoint,
            &[
                ("service", "data"),
                ("request", "GetFeature"),
                ("data", self.layer.as_str()),
                ("attrFilter", filter.as_str()),
                ("crs", "EPSG:4326"),
                ("geometry", "true"),
                ("attribute", "true"),
                ("size", "10"),
                ("format", "json"),
                ("errorformat", "json"),
                ("key", key),
            ],
        );
        debug!(url = %redact_url(&url), "Querying feature service");

        let body = self.fetcher.fetch_text(&url).await?;
        let value = expect_json(&body, ENDPOINT)?;

        let Some(collection) = feature_collection(value)? else {
            return Ok(Polygon::empty());
        };
        debug!(features = collection.features.len(), "Feature service answered");
        Ok(first_feature_polygon(&collection, &self.reprojector))
    }
}

/// Unwrap `response.result.featureCollection`, or accept a bare collection
fn feature_collection(mut value: Value) -> Result<Option<FeatureCollection>> {
    let Some(response) = value.get_mut("response") else {
        return FeatureCollection::from_value(value, ENDPOINT).map(Some);
    };

    match response.get("status").and_then(Value::as_str) {
        Some("OK") => {}
        Some("NOT_FOUND") => return Ok(None),
        _ => {
            let error = response.get("error");
            let code = error.and_then(|e| str_field(e, &["code"])).unwrap_or_default();
            let text = error.and_then(|e| str_field(e, &["text"])).unwrap_or_default();
            return Err(if code.to_ascii_uppercase().contains("KEY") {
                ResolveError::auth(format!("{} ({})", text, code))
            } else {
                ResolveError::parse(ENDPOINT, format!("{} {}", code, text).trim().to_string())
            });
        }
    }

    match response.pointer_mut("/result/featureCollection") {
        Some(collection) => FeatureCollection::from_value(collection.take(), ENDPOINT).map(Some),
        None => Ok(None),
    }
}
