//! Address routes

use axum::{routing::post, Router};

use crate::{handlers::address::resolve_address_handler, AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/address/resolve", post(resolve_address_handler))
}
