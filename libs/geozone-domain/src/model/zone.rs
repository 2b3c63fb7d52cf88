//! Zone entity
//!
//! A zone is either a commerce trade zone (published with its own numeric id
//! and an embedded WKT boundary) or an administrative district (identified by
//! an admin code whose boundary must be fetched separately).

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{Point, Polygon};

/// Which family of identifiers a zone belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneKind {
    Trade,
    Admin,
}

/// A candidate area returned by the zone locator
///
/// Zones are constructed by the locator, enriched with a resolved polygon
/// once the boundary is known, and discarded when the search context changes.
///
/// # Example
///
/// ```rust
/// use geozone_domain::model::{Point, Zone, ZoneKind};
///
/// let zone = Zone::admin("11680640", "역삼1동", "서울특별시", "강남구", "1168064000")
///     .with_anchor(Point::new(37.495, 127.033));
/// assert_eq!(zone.kind(), ZoneKind::Admin);
/// assert_eq!(zone.cache_label(), "서울특별시 강남구 역삼1동");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    /// Provider-specific, opaque identifier
    id: String,
    display_name: String,
    province_name: String,
    city_name: String,
    /// Area in square meters, when the provider publishes one
    area_size: Option<f64>,
    kind: ZoneKind,
    /// Present only for admin zones
    admin_code: Option<String>,
    /// WKT boundary, present only for trade zones
    raw_boundary: Option<String>,
    /// Point the zone was searched from, kept for centroid matching
    anchor_point: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    resolved_polygon: Option<Arc<Polygon>>,
}

impl Zone {
    /// Create a trade zone carrying its own WKT boundary
    pub fn trade(
        id: impl Into<String>,
        display_name: impl Into<String>,
        province_name: impl Into<String>,
        city_name: impl Into<String>,
        area_size: Option<f64>,
        raw_boundary: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            province_name: province_name.into(),
            city_name: city_name.into(),
            area_size,
            kind: ZoneKind::Trade,
            admin_code: None,
            raw_boundary: Some(raw_boundary.into()),
            anchor_point: None,
            resolved_polygon: None,
        }
    }

    /// Create an administrative district zone
    pub fn admin(
        id: impl Into<String>,
        display_name: impl Into<String>,
        province_name: impl Into<String>,
        city_name: impl Into<String>,
        admin_code: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            province_name: province_name.into(),
            city_name: city_name.into(),
            area_size: None,
            kind: ZoneKind::Admin,
            admin_code: Some(admin_code.into()),
            raw_boundary: None,
            anchor_point: None,
            resolved_polygon: None,
        }
    }

    /// Attach the point used to search for this zone
    pub fn with_anchor(mut self, anchor: Point) -> Self {
        self.anchor_point = Some(anchor);
        self
    }

    /// Attach the resolved boundary
    pub fn with_polygon(mut self, polygon: Arc<Polygon>) -> Self {
        self.resolved_polygon = Some(polygon);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn province_name(&self) -> &str {
        &self.province_name
    }

    pub fn city_name(&self) -> &str {
        &self.city_name
    }

    pub fn area_size(&self) -> Option<f64> {
        self.area_size
    }

    pub fn kind(&self) -> ZoneKind {
        self.kind
    }

    pub fn admin_code(&self) -> Option<&str> {
        self.admin_code.as_deref()
    }

    pub fn raw_boundary(&self) -> Option<&str> {
        self.raw_boundary.as_deref()
    }

    pub fn anchor_point(&self) -> Option<Point> {
        self.anchor_point
    }

    pub fn resolved_polygon(&self) -> Option<&Arc<Polygon>> {
        self.resolved_polygon.as_ref()
    }

    /// Full human label, "province city name" with whitespace collapsed
    ///
    /// Provider identifiers are mutually incompatible, so this label is what
    /// the polygon cache and the statistics geocoder key on. Including the
    /// province and city keeps same-named districts apart.
    pub fn cache_label(&self) -> String {
        [
            self.province_name.as_str(),
            self.city_name.as_str(),
            self.display_name.as_str(),
        ]
        .iter()
        .flat_map(|part| part.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
    }
}
