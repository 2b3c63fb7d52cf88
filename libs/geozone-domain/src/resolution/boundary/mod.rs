//! Boundary acquisition for resolved zones
//!
//! Trade zones carry their own WKT boundary. Admin districts go through an
//! ordered chain of [`BoundaryStrategy`] implementations; the first one that
//! produces a non-empty polygon wins. The order is the policy and the loop in
//! [`BoundaryResolver::resolve_polygon`] is the mechanism.
//!
//! Default chain:
//! 1. [`StatisticsBoundary`]: geocode the label, then fetch the boundary by
//!    statistics code (current year, then previous year)
//! 2. [`FeatureServiceBoundary`]: feature-service query by 8-digit district code
//! 3. [`LocalDatasetBoundary`]: bundled dataset, disambiguated by centroid
//!    distance to the zone's anchor point

mod feature_service;
mod local_dataset;
mod statistics;

pub use feature_service::FeatureServiceBoundary;
pub use local_dataset::{closest_to_anchor, LocalDatasetBoundary};
pub use statistics::StatisticsBoundary;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::token::TokenManager;
use crate::error::Result;
use crate::geometry::parse_wkt;
use crate::model::{Polygon, Zone, ZoneKind};
use crate::ports::{Clock, TextFetcher};
use crate::upstream::Endpoints;

/// One way of obtaining a district boundary
///
/// An empty polygon and an error both mean "try the next strategy"; errors
/// are logged with their source.
#[async_trait]
pub trait BoundaryStrategy: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    async fn acquire(&self, zone: &Zone) -> Result<Polygon>;
}

/// Runs the strategy chain for admin zones and parses WKT for trade zones
#[derive(Default)]
pub struct BoundaryResolver {
    strategies: Vec<Box<dyn BoundaryStrategy>>,
}

impl BoundaryResolver {
    /// A resolver with no admin-zone strategies
    pub fn new() -> Self {
        Self::default()
    }

    /// The network strategies in their default order
    ///
    /// The bundled-dataset fallback needs a [`BoundaryDataset`](crate::ports::BoundaryDataset)
    /// and is appended separately with [`with_strategy`](Self::with_strategy).
    pub fn standard<F, C>(
        fetcher: Arc<F>,
        tokens: Arc<TokenManager<F, C>>,
        clock: Arc<C>,
        endpoints: &Endpoints,
        geodata_key: Option<String>,
    ) -> Self
    where
        F: TextFetcher + 'static,
        C: Clock + 'static,
    {
        Self::new()
            .with_strategy(StatisticsBoundary::new(
                fetcher.clone(),
                tokens,
                clock,
                &endpoints.statistics,
            ))
            .with_strategy(FeatureServiceBoundary::new(fetcher, endpoints, geodata_key))
    }

    /// Append a strategy to the end of the chain
    pub fn with_strategy(mut self, strategy: impl BoundaryStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Strategy names in chain order
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Boundary for `zone`, empty when no source has one
    ///
    /// Never fails: downstream rendering must keep working without boundaries.
    #[instrument(skip(self, zone), fields(zone = %zone.cache_label(), kind = ?zone.kind()))]
    pub async fn resolve_polygon(&self, zone: &Zone) -> Polygon {
        match zone.kind() {
            ZoneKind::Trade => match zone.raw_boundary() {
                Some(wkt) => {
                    let polygon = parse_wkt(wkt);
                    if polygon.is_empty() {
                        warn!("Trade zone WKT produced no usable ring");
                    }
                    polygon
                }
                None => {
                    warn!("Trade zone has no embedded boundary");
                    Polygon::empty()
                }
            },
            ZoneKind::Admin => self.run_chain(zone).await,
        }
    }

    async fn run_chain(&self, zone: &Zone) -> Polygon {
        for strategy in &self.strategies {
            match strategy.acquire(zone).await {
                Ok(polygon) if !polygon.is_empty() => {
                    info!(
                        strategy = strategy.name(),
                        points = polygon.point_count(),
                        "Boundary acquired"
                    );
                    return polygon;
                }
                Ok(_) => debug!(strategy = strategy.name(), "Strategy found no boundary"),
                Err(err) => warn!(strategy = strategy.name(), error = %err, "Strategy failed"),
            }
        }

        warn!(
            strategies = self.strategies.len(),
            "No boundary available, returning empty polygon"
        );
        Polygon::empty()
    }
}
