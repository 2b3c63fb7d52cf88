//! Last-resort boundary from the bundled dataset
//!
//! The dataset is loaded on first use, on the blocking thread pool, and kept
//! for the life of the strategy.
//! District names repeat across provinces (there is a 신사동 in Seoul's
//! Gangnam-gu and another in Gwanak-gu), so same-named candidates are
//! disambiguated by centroid distance to the zone's anchor point.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, instrument};

use super::BoundaryStrategy;
use crate::error::{ResolveError, Result};
use crate::geometry::{largest_outer_ring, CoordinateReprojector};
use crate::model::{Point, Polygon, Zone};
use crate::ports::{BoundaryDataset, DistrictRecord};

pub struct LocalDatasetBoundary<D> {
    dataset: Arc<D>,
    records: OnceCell<Vec<DistrictRecord>>,
    reprojector: CoordinateReprojector,
}

impl<D> LocalDatasetBoundary<D>
where
    D: BoundaryDataset + 'static,
{
    pub fn new(dataset: D) -> Self {
        Self {
            dataset: Arc::new(dataset),
            records: OnceCell::new(),
            reprojector: CoordinateReprojector::default(),
        }
    }

    async fn records(&self) -> Result<&[DistrictRecord]> {
        let records = self
            .records
            .get_or_try_init(|| async {
                let dataset = self.dataset.clone();
                let records = tokio::task::spawn_blocking(move || dataset.load())
                    .await
                    .map_err(|err| {
                        error!(error = %err, "Boundary dataset loader did not finish");
                        ResolveError::config(format!("boundary dataset loader: {}", err))
                    })??;
                info!(districts = records.len(), "Bundled boundary dataset loaded");
                Ok::<_, ResolveError>(records)
            })
            .await?;
        Ok(records.as_slice())
    }
}

/// Whether a dataset name refers to `district`
///
/// Dataset names may be full labels ("서울특별시 강남구 역삼1동"); only the
/// last token is compared.
fn name_matches(record_name: &str, district: &str) -> bool {
    record_name
        .split_whitespace()
        .last()
        .is_some_and(|last| last == district)
}

/// The candidate whose centroid is nearest to `anchor`
///
/// Without an anchor the first candidate wins. Empty candidates are ignored.
pub fn closest_to_anchor(candidates: Vec<Polygon>, anchor: Option<Point>) -> Option<Polygon> {
    let mut usable = candidates.into_iter().filter(|polygon| !polygon.is_empty());
    let Some(anchor) = anchor else {
        return usable.next();
    };

    usable
        .filter_map(|polygon| {
            let distance = polygon.centroid()?.squared_distance(&anchor);
            Some((distance, polygon))
        })
        .min_by(|(a, _), (b, _)| a.total_cmp(b))
        .map(|(_, polygon)| polygon)
}

#[async_trait]
impl<D> BoundaryStrategy for LocalDatasetBoundary<D>
where
    D: BoundaryDataset + 'static,
{
    fn name(&self) -> &'static str {
        "bundled-dataset"
    }

    #[instrument(skip(self, zone), fields(district = %zone.display_name()))]
    async fn acquire(&self, zone: &Zone) -> Result<Polygon> {
        let district = zone.display_name().trim();
        let candidates: Vec<Polygon> = self
            .records()
            .await?
            .iter()
            .filter(|record| name_matches(&record.district_name, district))
            .filter_map(|record| largest_outer_ring(&record.geometry))
            .map(|raw| Polygon::single(self.reprojector.normalize(raw)))
            .collect();

        debug!(candidates = candidates.len(), "Dataset candidates by name");
        Ok(closest_to_anchor(candidates, zone.anchor_point()).unwrap_or_default())
    }
}
