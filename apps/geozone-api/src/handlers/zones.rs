//! Zone search, boundary and store handlers

use axum::{extract::State, response::IntoResponse, Json};
use geozone_domain::model::ProgressSender;
use geozone_domain::{Point, Zone};
use tokio::sync::mpsc;
use tracing::info;

use super::{bad_request, error_response};
use crate::{
    dto::{
        error::ErrorResponse,
        zones::{
            AdminZonesRequest, NearbyZonesRequest, ProgressDto, ResolvedAddressResponse, StoreDto,
            StoresResponse, ZoneDto, ZoneRequest, ZonesResponse,
        },
    },
    AppState,
};

fn zones_response(address: Option<ResolvedAddressResponse>, zones: &[Zone]) -> ZonesResponse {
    ZonesResponse {
        address,
        zones: zones.iter().map(ZoneDto::from).collect(),
    }
}

/// Trade zones around an address or a point
#[utoipa::path(
    post,
    path = "/zones/nearby",
    request_body = NearbyZonesRequest,
    responses(
        (status = 200, description = "Trade zones within the radius", body = ZonesResponse),
        (status = 400, description = "Neither address nor point given", body = ErrorResponse),
        (status = 401, description = "Zone service key missing or rejected", body = ErrorResponse),
        (status = 404, description = "Address not found or no zone in range", body = ErrorResponse),
        (status = 502, description = "Upstream unreachable", body = ErrorResponse)
    ),
    tag = "zones"
)]
pub async fn nearby_zones_handler(
    State(state): State<AppState>,
    Json(payload): Json<NearbyZonesRequest>,
) -> impl IntoResponse {
    let address = payload
        .address
        .as_deref()
        .map(str::trim)
        .filter(|address| !address.is_empty());

    let result = match (address, payload.point) {
        (Some(address), _) => {
            info!(address = %address, radius = payload.radius_meters, "Nearby zones by address");
            state
                .engine
                .zones_near_address(address, payload.radius_meters)
                .await
                .map(|(address, zones)| zones_response(Some(address.into()), &zones))
        }
        (None, Some(point)) => {
            info!(lat = point.lat, lon = point.lon, radius = payload.radius_meters, "Nearby zones by point");
            state
                .engine
                .zones_near(Point::from(point), payload.radius_meters)
                .await
                .map(|zones| zones_response(None, &zones))
        }
        (None, None) => return bad_request("either address or point is required"),
    };

    match result {
        Ok(response) => Json(response).into_response(),
        Err(err) => error_response(err),
    }
}

/// Administrative districts of an address's city, or of an explicit province and city
#[utoipa::path(
    post,
    path = "/zones/admin",
    request_body = AdminZonesRequest,
    responses(
        (status = 200, description = "Districts of the city", body = ZonesResponse),
        (status = 400, description = "Neither address nor province and city given", body = ErrorResponse),
        (status = 401, description = "Statistics credentials missing or rejected", body = ErrorResponse),
        (status = 404, description = "Unknown province or city", body = ErrorResponse),
        (status = 502, description = "Upstream unreachable", body = ErrorResponse)
    ),
    tag = "zones"
)]
pub async fn admin_zones_handler(
    State(state): State<AppState>,
    Json(payload): Json<AdminZonesRequest>,
) -> impl IntoResponse {
    let address = payload
        .address
        .as_deref()
        .map(str::trim)
        .filter(|address| !address.is_empty());

    let result = match (address, payload.province.as_deref(), payload.city.as_deref()) {
        (Some(address), _, _) => {
            info!(address = %address, "Admin zones by address");
            state
                .engine
                .admin_zones_for_address(address)
                .await
                .map(|(address, zones)| zones_response(Some(address.into()), &zones))
        }
        (None, Some(province), Some(city)) => {
            info!(province = %province, city = %city, hint = %payload.district_hint, "Admin zones by hierarchy");
            state
                .engine
                .admin_zones(province, city, &payload.district_hint)
                .await
                .map(|zones| zones_response(None, &zones))
        }
        _ => return bad_request("either address or both province and city are required"),
    };

    match result {
        Ok(response) => Json(response).into_response(),
        Err(err) => error_response(err),
    }
}

/// Resolve the boundary of a zone
///
/// Never fails on upstream trouble: the zone comes back with an empty polygon
/// when every boundary source is exhausted.
#[utoipa::path(
    post,
    path = "/zones/boundary",
    request_body = ZoneRequest,
    responses(
        (status = 200, description = "Zone with its boundary", body = ZoneDto),
        (status = 400, description = "Zone is missing its WKT or admin code", body = ErrorResponse)
    ),
    tag = "zones"
)]
pub async fn zone_boundary_handler(
    State(state): State<AppState>,
    Json(payload): Json<ZoneRequest>,
) -> impl IntoResponse {
    let zone = match Zone::try_from(payload.zone) {
        Ok(zone) => zone,
        Err(message) => return bad_request(message),
    };

    let zone = state.engine.resolve_zone(zone).await;
    Json(ZoneDto::from(&zone)).into_response()
}

/// List the stores inside a zone
#[utoipa::path(
    post,
    path = "/zones/stores",
    request_body = ZoneRequest,
    responses(
        (status = 200, description = "Stores with the paging progress observed", body = StoresResponse),
        (status = 400, description = "Zone is missing its WKT or admin code", body = ErrorResponse),
        (status = 401, description = "Zone service key missing or rejected", body = ErrorResponse),
        (status = 502, description = "Upstream unreachable", body = ErrorResponse)
    ),
    tag = "zones"
)]
pub async fn zone_stores_handler(
    State(state): State<AppState>,
    Json(payload): Json<ZoneRequest>,
) -> impl IntoResponse {
    let zone = match Zone::try_from(payload.zone) {
        Ok(zone) => zone,
        Err(message) => return bad_request(message),
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    let result = state
        .engine
        .zone_stores(&zone, &ProgressSender::new(tx))
        .await;

    let mut progress = Vec::new();
    while let Ok(event) = rx.try_recv() {
        progress.push(ProgressDto::from(event));
    }

    match result {
        Ok(stores) => {
            info!(zone = %zone.cache_label(), stores = stores.len(), "Stores listed");
            Json(StoresResponse {
                count: stores.len(),
                stores: stores.into_iter().map(StoreDto::from).collect(),
                progress,
            })
            .into_response()
        }
        Err(err) => error_response(err),
    }
}
