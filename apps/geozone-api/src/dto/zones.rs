//! DTOs for address, zone, boundary and store endpoints

use geozone_domain::model::{ProgressEvent, ProgressPhase};
use geozone_domain::{Point, Polygon, ResolvedAddress, Ring, Store, Zone, ZoneKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

fn default_radius() -> u32 {
    500
}

/// A WGS84 position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PointDto {
    #[schema(example = 37.5665)]
    pub lat: f64,
    #[schema(example = 126.978)]
    pub lon: f64,
}

impl From<Point> for PointDto {
    fn from(point: Point) -> Self {
        Self {
            lat: point.lat,
            lon: point.lon,
        }
    }
}

impl From<PointDto> for Point {
    fn from(dto: PointDto) -> Self {
        Point::new(dto.lat, dto.lon)
    }
}

/// Request body for address resolution
#[derive(Debug, Deserialize, ToSchema)]
pub struct ResolveAddressRequest {
    #[schema(example = "서울특별시 중구 세종대로 110")]
    pub address: String,
}

/// A geocoded address
#[derive(Debug, Serialize, ToSchema)]
pub struct ResolvedAddressResponse {
    pub point: PointDto,
    #[schema(example = "서울특별시 중구 세종대로 110")]
    pub canonical_label: String,
}

impl From<ResolvedAddress> for ResolvedAddressResponse {
    fn from(address: ResolvedAddress) -> Self {
        Self {
            point: address.point.into(),
            canonical_label: address.canonical_label,
        }
    }
}

/// Trade-zone search around an address or a point; `address` wins when both are set
#[derive(Debug, Deserialize, ToSchema)]
pub struct NearbyZonesRequest {
    pub address: Option<String>,
    pub point: Option<PointDto>,
    #[serde(default = "default_radius")]
    #[schema(example = 500)]
    pub radius_meters: u32,
}

/// Admin-district search by address, or by explicit province and city
#[derive(Debug, Deserialize, ToSchema)]
pub struct AdminZonesRequest {
    #[schema(example = "서울특별시 강남구 역삼동 737")]
    pub address: Option<String>,
    pub province: Option<String>,
    pub city: Option<String>,
    #[serde(default)]
    pub district_hint: String,
}

/// Candidate zones, with the geocoded address when the search started from one
#[derive(Debug, Serialize, ToSchema)]
pub struct ZonesResponse {
    pub address: Option<ResolvedAddressResponse>,
    pub zones: Vec<ZoneDto>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ZoneKindDto {
    Trade,
    Admin,
}

impl From<ZoneKind> for ZoneKindDto {
    fn from(kind: ZoneKind) -> Self {
        match kind {
            ZoneKind::Trade => Self::Trade,
            ZoneKind::Admin => Self::Admin,
        }
    }
}

/// A zone as exchanged with clients
///
/// Clients send a zone back exactly as they received it to ask for its
/// boundary or stores.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ZoneDto {
    #[schema(example = "1168064000")]
    pub id: String,
    pub kind: ZoneKindDto,
    #[schema(example = "역삼1동")]
    pub display_name: String,
    #[serde(default)]
    pub province_name: String,
    #[serde(default)]
    pub city_name: String,
    #[serde(default)]
    pub area_size: Option<f64>,
    #[serde(default)]
    pub admin_code: Option<String>,
    /// WKT boundary of a trade zone
    #[serde(default)]
    pub raw_boundary: Option<String>,
    #[serde(default)]
    pub anchor: Option<PointDto>,
    /// Resolved boundary rings; empty when no boundary is available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polygon: Option<Vec<Vec<PointDto>>>,
}

fn polygon_rings(polygon: &Polygon) -> Vec<Vec<PointDto>> {
    polygon
        .rings()
        .iter()
        .map(|ring| ring.points().iter().copied().map(PointDto::from).collect())
        .collect()
}

impl From<&Zone> for ZoneDto {
    fn from(zone: &Zone) -> Self {
        Self {
            id: zone.id().to_string(),
            kind: zone.kind().into(),
            display_name: zone.display_name().to_string(),
            province_name: zone.province_name().to_string(),
            city_name: zone.city_name().to_string(),
            area_size: zone.area_size(),
            admin_code: zone.admin_code().map(str::to_string),
            raw_boundary: zone.raw_boundary().map(str::to_string),
            anchor: zone.anchor_point().map(PointDto::from),
            polygon: zone.resolved_polygon().map(|polygon| polygon_rings(polygon)),
        }
    }
}

impl TryFrom<ZoneDto> for Zone {
    type Error = String;

    fn try_from(dto: ZoneDto) -> Result<Self, Self::Error> {
        let zone = match dto.kind {
            ZoneKindDto::Trade => {
                let wkt = dto
                    .raw_boundary
                    .ok_or_else(|| format!("trade zone '{}' needs raw_boundary", dto.id))?;
                Zone::trade(
                    dto.id,
                    dto.display_name,
                    dto.province_name,
                    dto.city_name,
                    dto.area_size,
                    wkt,
                )
            }
            ZoneKindDto::Admin => {
                let code = dto
                    .admin_code
                    .ok_or_else(|| format!("admin zone '{}' needs admin_code", dto.id))?;
                Zone::admin(dto.id, dto.display_name, dto.province_name, dto.city_name, code)
            }
        };

        let zone = match dto.anchor {
            Some(anchor) => zone.with_anchor(anchor.into()),
            None => zone,
        };
        Ok(match dto.polygon {
            Some(rings) if !rings.is_empty() => zone.with_polygon(Arc::new(Polygon::new(
                rings
                    .into_iter()
                    .map(|ring| Ring::new(ring.into_iter().map(Point::from).collect()))
                    .collect(),
            ))),
            _ => zone,
        })
    }
}

/// Request body naming a previously returned zone
#[derive(Debug, Deserialize, ToSchema)]
pub struct ZoneRequest {
    pub zone: ZoneDto,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StoreDto {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
    pub address: Option<String>,
    pub location: Option<PointDto>,
}

impl From<Store> for StoreDto {
    fn from(store: Store) -> Self {
        Self {
            id: store.id,
            name: store.name,
            category: store.category,
            address: store.address,
            location: store.location.map(PointDto::from),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProgressPhaseDto {
    FirstPage,
    PageBatch,
    StoppedEarly,
    Done,
}

/// One page-batch progress update observed while listing
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProgressDto {
    pub phase: ProgressPhaseDto,
    pub current: usize,
    pub total: usize,
}

impl From<ProgressEvent> for ProgressDto {
    fn from(event: ProgressEvent) -> Self {
        let phase = match event.phase {
            ProgressPhase::FirstPage => ProgressPhaseDto::FirstPage,
            ProgressPhase::PageBatch => ProgressPhaseDto::PageBatch,
            ProgressPhase::StoppedEarly => ProgressPhaseDto::StoppedEarly,
            ProgressPhase::Done => ProgressPhaseDto::Done,
        };
        Self {
            phase,
            current: event.current,
            total: event.total,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StoresResponse {
    pub count: usize,
    pub stores: Vec<StoreDto>,
    pub progress: Vec<ProgressDto>,
}
