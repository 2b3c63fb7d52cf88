//! Zone routes

use axum::{routing::post, Router};

use crate::{
    handlers::zones::{
        admin_zones_handler, nearby_zones_handler, zone_boundary_handler, zone_stores_handler,
    },
    AppState,
};

/// Create zone routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/zones/nearby", post(nearby_zones_handler))
        .route("/zones/admin", post(admin_zones_handler))
        .route("/zones/boundary", post(zone_boundary_handler))
        .route("/zones/stores", post(zone_stores_handler))
}
