//! Address resolution handler

use axum::{extract::State, response::IntoResponse, Json};
use tracing::info;

use super::{bad_request, error_response};
use crate::{
    dto::{
        error::ErrorResponse,
        zones::{ResolveAddressRequest, ResolvedAddressResponse},
    },
    AppState,
};

/// Geocode a free-text address
#[utoipa::path(
    post,
    path = "/address/resolve",
    request_body = ResolveAddressRequest,
    responses(
        (status = 200, description = "Address resolved", body = ResolvedAddressResponse),
        (status = 400, description = "Empty address", body = ErrorResponse),
        (status = 401, description = "Geocoder credential missing or rejected", body = ErrorResponse),
        (status = 404, description = "No search category matched", body = ErrorResponse),
        (status = 502, description = "Geocoder unreachable or returned an unexpected body", body = ErrorResponse)
    ),
    tag = "address"
)]
pub async fn resolve_address_handler(
    State(state): State<AppState>,
    Json(payload): Json<ResolveAddressRequest>,
) -> impl IntoResponse {
    if payload.address.trim().is_empty() {
        return bad_request("address cannot be empty");
    }
    info!(address = %payload.address, "Received address resolution request");

    match state.engine.resolve_address(&payload.address).await {
        Ok(address) => Json(ResolvedAddressResponse::from(address)).into_response(),
        Err(err) => error_response(err),
    }
}
