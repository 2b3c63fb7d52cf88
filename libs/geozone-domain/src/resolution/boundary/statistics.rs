//! Statistics-service boundary: geocode the zone label to the service's own
//! admin code, then fetch that code's boundary for the current year, falling
//! back to the previous year while the yearly republication lags.

use async_trait::async_trait;
use chrono::Datelike;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use super::BoundaryStrategy;
use crate::error::{ResolveError, Result};
use crate::geometry::geojson::{first_feature_polygon, value_as_string};
use crate::geometry::{CoordinateReprojector, FeatureCollection};
use crate::model::{Polygon, Zone};
use crate::ports::{Clock, TextFetcher};
use crate::resolution::token::TokenManager;
use crate::upstream::{build_url, expect_json, redact_url, str_field};

const GEOCODE_ENDPOINT: &str = "statistics-geocode";
const BOUNDARY_ENDPOINT: &str = "statistics-boundary";

/// Provider codes carried in `errCd`
const ERR_NO_DATA: &str = "-100";
const ERR_TOKEN_EXPIRED: &str = "-401";

#[derive(Debug, PartialEq)]
enum Status {
    Ok,
    NoData,
}

pub struct StatisticsBoundary<F, C> {
    fetcher: Arc<F>,
    tokens: Arc<TokenManager<F, C>>,
    clock: Arc<C>,
    geocode_url: String,
    boundary_url: String,
    reprojector: CoordinateReprojector,
}

impl<F, C> StatisticsBoundary<F, C>
where
    F: TextFetcher,
    C: Clock,
{
    pub fn new(
        fetcher: Arc<F>,
        tokens: Arc<TokenManager<F, C>>,
        clock: Arc<C>,
        statistics_base: &str,
    ) -> Self {
        let base = statistics_base.trim_end_matches('/');
        Self {
            fetcher,
            tokens,
            clock,
            geocode_url: format!("{}/addr/geocode.json", base),
            boundary_url: format!("{}/boundary/hadmarea.geojson", base),
            reprojector: CoordinateReprojector::default(),
        }
    }

    /// The statistics service's admin code for a human label
    async fn statistics_code(&self, token: &str, label: &str) -> Result<Option<String>> {
        let url = build_url(
            &self.geocode_url,
            &[("accessToken", token), ("address", label)],
        );
        debug!(url = %redact_url(&url), "Geocoding label for statistics code");

        let body = self.fetcher.fetch_text(&url).await?;
        let value = expect_json(&body, GEOCODE_ENDPOINT)?;
        if self.check_status(&value, GEOCODE_ENDPOINT, token).await? == Status::NoData {
            return Ok(None);
        }

        Ok(value
            .pointer("/result/resultdata")
            .and_then(Value::as_array)
            .and_then(|rows| rows.first())
            .and_then(|row| str_field(row, &["adm_cd"])))
    }

    /// Boundary features for `code` in `year`; `None` when the year has no data
    async fn boundary_for_year(
        &self,
        token: &str,
        code: &str,
        year: i32,
    ) -> Result<Option<FeatureCollection>> {
        let year = year.to_string();
        let url = build_url(
            &self.boundary_url,
            &[
                ("accessToken", token),
                ("adm_cd", code),
                ("year", year.as_str()),
                ("low_search", "0"),
            ],
        );
        debug!(url = %redact_url(&url), "Fetching statistics boundary");

        let body = self.fetcher.fetch_text(&url).await?;
        let value = expect_json(&body, BOUNDARY_ENDPOINT)?;
        if self.check_status(&value, BOUNDARY_ENDPOINT, token).await? == Status::NoData {
            return Ok(None);
        }

        let collection = FeatureCollection::from_value(value, BOUNDARY_ENDPOINT)?;
        Ok((!collection.is_empty()).then_some(collection))
    }

    /// Interpret `errCd`; an expired `token` is dropped so the next call re-authenticates
    async fn check_status(&self, value: &Value, endpoint: &str, token: &str) -> Result<Status> {
        let Some(code) = value.get("errCd").and_then(value_as_string) else {
            return Ok(Status::Ok);
        };
        match code.as_str() {
            "0" => Ok(Status::Ok),
            ERR_NO_DATA => Ok(Status::NoData),
            ERR_TOKEN_EXPIRED => {
                self.tokens.invalidate(token).await;
                Err(ResolveError::auth(format!(
                    "{} rejected the access token",
                    endpoint
                )))
            }
            other => {
                let message = str_field(value, &["errMsg"]).unwrap_or_default();
                warn!(endpoint, code = other, message = %message, "Statistics service error");
                Err(ResolveError::parse(
                    endpoint,
                    format!("errCd {}: {}", other, message),
                ))
            }
        }
    }
}

#[async_trait]
impl<F, C> BoundaryStrategy for StatisticsBoundary<F, C>
where
    F: TextFetcher + 'static,
    C: Clock + 'static,
{
    fn name(&self) -> &'static str {
        "statistics"
    }

    #[instrument(skip(self, zone), fields(label = %zone.cache_label()))]
    async fn acquire(&self, zone: &Zone) -> Result<Polygon> {
        let label = zone.cache_label();
        let token = self.tokens.get_token().await?;

        let Some(code) = self.statistics_code(&token, &label).await? else {
            debug!("Statistics geocoder has no code for label");
            return Ok(Polygon::empty());
        };

        let current_year = self.clock.now().year();
        for year in [current_year, current_year - 1] {
            match self.boundary_for_year(&token, &code, year).await? {
                Some(collection) => {
                    debug!(code = %code, year, features = collection.features.len(), "Statistics boundary found");
                    return Ok(first_feature_polygon(&collection, &self.reprojector));
                }
                None => debug!(code = %code, year, "No statistics boundary for year"),
            }
        }

        Ok(Polygon::empty())
    }
}
