//! API routes

pub mod address;
pub mod zones;

use axum::Router;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    dto::{
        error::ErrorResponse,
        zones::{
            AdminZonesRequest, NearbyZonesRequest, PointDto, ProgressDto, ProgressPhaseDto,
            ResolveAddressRequest, ResolvedAddressResponse, StoreDto, StoresResponse, ZoneDto,
            ZoneKindDto, ZoneRequest, ZonesResponse,
        },
    },
    handlers, AppState,
};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::address::resolve_address_handler,
        handlers::zones::nearby_zones_handler,
        handlers::zones::admin_zones_handler,
        handlers::zones::zone_boundary_handler,
        handlers::zones::zone_stores_handler,
        health_handler
    ),
    components(
        schemas(
            PointDto, ResolveAddressRequest, ResolvedAddressResponse,
            NearbyZonesRequest, AdminZonesRequest, ZonesResponse,
            ZoneKindDto, ZoneDto, ZoneRequest,
            StoreDto, ProgressPhaseDto, ProgressDto, StoresResponse,
            ErrorResponse
        )
    ),
    tags(
        (name = "address", description = "Address geocoding"),
        (name = "zones", description = "Zone search, boundaries and store listings"),
        (name = "health", description = "Health check endpoints")
    ),
    info(
        title = "Geozone API",
        version = "0.1.0",
        description = "Address, zone and boundary resolution over Korean government geodata"
    )
)]
pub struct ApiDoc;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(address::routes())
        .merge(zones::routes())
        .route("/health", axum::routing::get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = String)
    ),
    tag = "health"
)]
async fn health_handler() -> &'static str {
    "OK"
}
