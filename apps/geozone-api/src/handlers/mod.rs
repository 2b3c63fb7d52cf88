//! HTTP handlers

pub mod address;
pub mod zones;

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use geozone_domain::ResolveError;
use tracing::{error, warn};

use crate::dto::error::ErrorResponse;

/// Status code and category for a domain error
pub fn classify(err: &ResolveError) -> (StatusCode, &'static str) {
    match err {
        ResolveError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        ResolveError::NoResults(_) => (StatusCode::NOT_FOUND, "no_results"),
        ResolveError::Auth(_) => (StatusCode::UNAUTHORIZED, "auth"),
        ResolveError::Parse { .. } => (StatusCode::BAD_GATEWAY, "upstream_format"),
        ResolveError::AllPathsFailed { .. } => (StatusCode::BAD_GATEWAY, "upstream_unreachable"),
        ResolveError::Projection(_) => (StatusCode::INTERNAL_SERVER_ERROR, "projection"),
        ResolveError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config"),
    }
}

/// Render a domain error as a JSON error response
pub fn error_response(err: ResolveError) -> Response {
    let (status, kind) = classify(&err);
    if status.is_server_error() {
        error!(error = %err, kind, "Request failed");
    } else {
        warn!(error = %err, kind, "Request failed");
    }
    (
        status,
        Json(ErrorResponse {
            kind: kind.to_string(),
            error: err.to_string(),
        }),
    )
        .into_response()
}

/// Reject a request body that is well-formed JSON but semantically incomplete
pub fn bad_request(message: impl Into<String>) -> Response {
    let message = message.into();
    warn!(error = %message, "Bad request");
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            kind: "bad_request".to_string(),
            error: message,
        }),
    )
        .into_response()
}
