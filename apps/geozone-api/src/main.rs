//! Geozone API
//!
//! HTTP service resolving addresses into zones, zone boundaries and store
//! listings over the Korean government geodata services.

mod config;
mod dto;
mod handlers;
mod routes;

use anyhow::Result;
use geozone_domain::ResolutionEngine;
use geozone_http::{GeoJsonFileDataset, ResilientFetchClient};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ResolutionEngine<ResilientFetchClient>>,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables before anything reads them
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    init_tracing(config.log_json);

    info!("Starting geozone API");
    config.log_unset();
    let addr = config.bind_addr();

    let fetcher = ResilientFetchClient::new(config.fetch)?;
    let mut engine = ResolutionEngine::with_system_clock(Arc::new(fetcher), config.resolver);
    if let Some(path) = config.dataset_path {
        info!(path = %path.display(), "Bundled boundary dataset enabled");
        engine = engine.with_dataset(GeoJsonFileDataset::new(path));
    }
    info!(strategies = ?engine.boundary_strategies(), "Boundary strategy chain");

    let state = AppState {
        engine: Arc::new(engine),
    };

    // Build HTTP router
    let app = routes::create_router(state);

    info!(addr = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
