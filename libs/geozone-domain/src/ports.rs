//! Ports (trait definitions) for external dependencies
//!
//! The domain defines what it needs and adapter crates provide it. Network
//! access goes through [`TextFetcher`], time through [`Clock`] and the bundled
//! boundary file through [`BoundaryDataset`].
//!
//! ## Static Dispatch
//!
//! `TextFetcher` uses native `impl Future` return types so services stay
//! generic over the fetcher without trait objects. Boundary strategies are
//! the one place that needs an object-safe async trait; see
//! [`crate::resolution::BoundaryStrategy`].

use chrono::{DateTime, Utc};
use geo::MultiPolygon;
use std::future::Future;

use crate::error::ResolveError;

/// Port for "fetch text from URL"
///
/// Implementations decide how the request travels (direct call, relay paths,
/// a key-redaction proxy). They must:
/// - treat any non-2xx status as a failure
/// - return the body as raw text, without assuming JSON
/// - convert transport errors to [`ResolveError`]
pub trait TextFetcher: Send + Sync {
    /// Fetch the body at `url` as text
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::AllPathsFailed` when every network path failed
    fn fetch_text(&self, url: &str) -> impl Future<Output = Result<String, ResolveError>> + Send;
}

/// Port for the current time
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// One district of the bundled boundary dataset
#[derive(Debug, Clone)]
pub struct DistrictRecord {
    pub district_name: String,
    pub district_code: Option<String>,
    /// Raw coordinates, in whatever CRS the dataset was published in
    pub geometry: MultiPolygon<f64>,
}

/// Port for the bundled, last-resort boundary dataset
///
/// Called at most once per successful load; the boundary strategy caches the
/// result for the rest of the process.
#[cfg_attr(test, mockall::automock)]
pub trait BoundaryDataset: Send + Sync {
    /// Load every district record
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::Config` if the dataset is missing and
    /// `ResolveError::Parse` if it is malformed
    fn load(&self) -> Result<Vec<DistrictRecord>, ResolveError>;
}
