//! Zone search
//!
//! Two modes:
//! - **trade-zone mode**: one radius query; every item embeds its WKT boundary
//! - **admin-district mode**: province, then city, then the city's districts,
//!   optionally narrowed by a district hint

use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::error::{ResolveError, Result};
use crate::geometry::geojson::value_as_string;
use crate::model::{Point, Zone};
use crate::ports::TextFetcher;
use crate::upstream::{
    build_url, decode_listing, expect_json, f64_field, redact_url, str_field, Credentials,
    Endpoints, Listing,
};

const ZONE_ENDPOINT: &str = "zone-radius";
const HIERARCHY_ENDPOINT: &str = "admin-hierarchy";

/// Generic trailing suffixes of district names
const DISTRICT_SUFFIXES: [char; 3] = ['동', '읍', '면'];

/// Separators inside numeric qualifiers such as "1.2.3가"
const QUALIFIER_SEPARATORS: [char; 4] = ['.', ',', '·', '-'];

/// Levels of the administrative hierarchy service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HierarchyLevel {
    Province,
    City,
    District,
}

impl HierarchyLevel {
    /// The (resource, category) pair the hierarchy service expects
    pub fn resource_pair(&self) -> (&'static str, &'static str) {
        match self {
            Self::Province => ("nation", "province"),
            Self::City => ("province", "city"),
            Self::District => ("city", "district"),
        }
    }
}

/// One code/name pair from the hierarchy service
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CodeEntry {
    #[serde(alias = "cd", deserialize_with = "string_or_number")]
    pub code: String,
    #[serde(alias = "addr_name", alias = "full_addr")]
    pub name: String,
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    value_as_string(&value).ok_or_else(|| serde::de::Error::custom("expected a string or number"))
}

/// Finds trade zones and administrative districts
pub struct ZoneLocator<F> {
    fetcher: Arc<F>,
    endpoints: Endpoints,
    credentials: Credentials,
}

impl<F> ZoneLocator<F>
where
    F: TextFetcher,
{
    pub fn new(fetcher: Arc<F>, endpoints: Endpoints, credentials: Credentials) -> Self {
        Self {
            fetcher,
            endpoints,
            credentials,
        }
    }

    /// Trade zones within `radius_meters` of `point`
    ///
    /// # Errors
    ///
    /// - `ResolveError::NoResults` if the provider returns zero zones; an
    ///   empty area is information the caller must act on
    /// - `ResolveError::Auth` if the zone service key is missing or rejected
    #[instrument(skip(self), fields(point = %point))]
    pub async fn find_nearby(&self, point: Point, radius_meters: u32) -> Result<Vec<Zone>> {
        if !point.is_valid() {
            return Err(ResolveError::not_found(format!("invalid search point {}", point)));
        }
        let key = self
            .credentials
            .zone_service_key
            .as_deref()
            .ok_or_else(|| ResolveError::auth("zone service key is not configured"))?;

        let radius = radius_meters.to_string();
        let cx = point.lon.to_string();
        let cy = point.lat.to_string();
        let url = build_url(
            &self.endpoints.zone_radius,
            &[
                ("radius", radius.as_str()),
                ("cx", cx.as_str()),
                ("cy", cy.as_str()),
                ("type", "json"),
                ("serviceKey", key),
            ],
        );

        debug!(url = %redact_url(&url), "Searching trade zones");
        let body = self.fetcher.fetch_text(&url).await?;
        let value = expect_json(&body, ZONE_ENDPOINT)?;

        let items = match decode_listing(&value, ZONE_ENDPOINT)? {
            Listing::Items { items, .. } => items,
            Listing::NoData => Vec::new(),
        };

        let zones: Vec<Zone> = items
            .iter()
            .filter_map(parse_trade_zone)
            .map(|zone| zone.with_anchor(point))
            .collect();

        if zones.is_empty() {
            if !items.is_empty() {
                warn!(items = items.len(), "Zone items present but none were usable");
            }
            return Err(ResolveError::no_results(format!(
                "no trade zones within {}m of {}",
                radius_meters, point
            )));
        }

        info!(count = zones.len(), "Trade zones found");
        Ok(zones)
    }

    /// Districts of `city` in `province`, narrowed by `district_hint`
    ///
    /// An empty hint, or one matching nothing, yields the full district list
    /// so the caller can let the user pick. An empty `city` selects the only
    /// city of a province without a city tier (세종특별자치시).
    ///
    /// # Errors
    ///
    /// `ResolveError::NotFound` if the province or city cannot be resolved
    #[instrument(skip(self))]
    pub async fn find_by_hierarchy(
        &self,
        province: &str,
        city: &str,
        district_hint: &str,
    ) -> Result<Vec<Zone>> {
        let provinces = self.fetch_level(HierarchyLevel::Province, None).await?;
        let province_entry = best_match(&provinces, province)
            .ok_or_else(|| ResolveError::not_found(format!("province '{}'", province)))?;

        let cities = self
            .fetch_level(HierarchyLevel::City, Some(&province_entry.code))
            .await?;
        let city_entry = match cities.as_slice() {
            [only] if city.trim().is_empty() => {
                debug!(city = %only.name, "Province has a single city");
                only
            }
            _ => best_match(&cities, city).ok_or_else(|| {
                ResolveError::not_found(format!("city '{}' in {}", city, province_entry.name))
            })?,
        };

        let districts = self
            .fetch_level(HierarchyLevel::District, Some(&city_entry.code))
            .await?;
        if districts.is_empty() {
            return Err(ResolveError::no_results(format!(
                "no districts under {} {}",
                province_entry.name, city_entry.name
            )));
        }

        let zones: Vec<Zone> = districts
            .into_iter()
            .map(|district| {
                Zone::admin(
                    district.code.clone(),
                    district.name,
                    province_entry.name.clone(),
                    city_entry.name.clone(),
                    district.code,
                )
            })
            .collect();

        Ok(filter_by_hint(zones, district_hint))
    }

    async fn fetch_level(
        &self,
        level: HierarchyLevel,
        parent_code: Option<&str>,
    ) -> Result<Vec<CodeEntry>> {
        let (resource, category) = level.resource_pair();
        let mut params = vec![
            ("resource", resource),
            ("category", category),
            ("format", "json"),
        ];
        if let Some(code) = parent_code {
            params.push(("code", code));
        }
        if let Some(key) = self.credentials.geodata_key.as_deref() {
            params.push(("key", key));
        }
        let url = build_url(&self.endpoints.hierarchy, &params);

        debug!(url = %redact_url(&url), ?level, "Fetching hierarchy level");
        let body = self.fetcher.fetch_text(&url).await?;
        let value = expect_json(&body, HIERARCHY_ENDPOINT)?;

        let entries = match value {
            Value::Array(items) => Value::Array(items),
            Value::Object(mut map) => map.remove("items").unwrap_or(Value::Array(Vec::new())),
            other => {
                return Err(ResolveError::parse(
                    HIERARCHY_ENDPOINT,
                    format!("expected a code list, got {}", other),
                ))
            }
        };

        serde_json::from_value(entries).map_err(|err| {
            warn!(?level, error = %err, "Hierarchy response has an unexpected shape");
            ResolveError::parse(HIERARCHY_ENDPOINT, err.to_string())
        })
    }
}

fn parse_trade_zone(item: &Value) -> Option<Zone> {
    let id = str_field(item, &["id", "trarNo"])?;
    let name = str_field(item, &["name", "mainTrarNm", "trarNm"])?;
    let wkt = str_field(item, &["boundaryWkt", "coords"])?;
    Some(Zone::trade(
        id,
        name,
        str_field(item, &["province", "ctprvnNm"]).unwrap_or_default(),
        str_field(item, &["city", "signguNm"]).unwrap_or_default(),
        f64_field(item, &["area", "trarArea"]),
        wkt,
    ))
}

/// Exact name first, then bidirectional substring containment
pub fn best_match<'a>(entries: &'a [CodeEntry], query: &str) -> Option<&'a CodeEntry> {
    let query = query.trim();
    if query.is_empty() {
        return None;
    }
    entries
        .iter()
        .find(|entry| entry.name.trim() == query)
        .or_else(|| {
            entries.iter().find(|entry| {
                let name = entry.name.trim();
                !name.is_empty() && (name.contains(query) || query.contains(name))
            })
        })
}

/// Strip the generic suffix and trailing numeric qualifiers of a district name
///
/// `역삼1동` and `역삼동` both normalize to `역삼`; `종로1.2.3가동` to `종로`.
pub fn normalize_district_name(name: &str) -> String {
    let compact: String = name.chars().filter(|c| !c.is_whitespace()).collect();
    let mut chars: Vec<char> = compact.chars().collect();

    if chars.len() > 1 && chars.last().is_some_and(|c| DISTRICT_SUFFIXES.contains(c)) {
        chars.pop();
    }
    // '가' counts only before a digit run ("3가") and '제' only after one ("제10")
    let mut stripped_digit = false;
    while let [.., before, last] = chars[..] {
        let strip = last.is_ascii_digit()
            || QUALIFIER_SEPARATORS.contains(&last)
            || (last == '가' && before.is_ascii_digit())
            || (last == '제' && stripped_digit);
        if !strip {
            break;
        }
        stripped_digit = last.is_ascii_digit();
        chars.pop();
    }

    chars.into_iter().collect()
}

fn hint_matches(district: &str, hint: &str) -> bool {
    let district = district.trim();
    if district.contains(hint) || hint.contains(district) {
        return true;
    }
    let normalized_hint = normalize_district_name(hint);
    !normalized_hint.is_empty() && normalize_district_name(district) == normalized_hint
}

/// Narrow zones by hint, falling back to the full list when nothing matches
pub fn filter_by_hint(zones: Vec<Zone>, hint: &str) -> Vec<Zone> {
    let hint = hint.trim();
    if hint.is_empty() {
        return zones;
    }

    let matched: Vec<Zone> = zones
        .iter()
        .filter(|zone| hint_matches(zone.display_name(), hint))
        .cloned()
        .collect();

    if matched.is_empty() {
        info!(hint, total = zones.len(), "District hint matched nothing, returning full list");
        zones
    } else {
        debug!(hint, matched = matched.len(), "District hint applied");
        matched
    }
}
