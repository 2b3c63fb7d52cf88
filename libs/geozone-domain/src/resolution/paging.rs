//! Batched pagination for large listings
//!
//! The first page is fetched by the caller, which learns the page count from
//! it. Remaining pages are fetched here in small concurrent batches with a
//! pause between batches. Two consecutive batches that yield nothing stop
//! the walk: the provider is either exhausted or throttling us.

use futures_util::future::join_all;
use std::future::Future;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::model::{ProgressPhase, ProgressSender};
use crate::upstream::PagingConfig;

/// Consecutive empty batches tolerated before giving up
const EMPTY_BATCH_LIMIT: usize = 2;

/// Fetch pages `2..=total_pages`, concatenating their items in page order
///
/// Failed pages count as empty; they are logged and skipped.
pub async fn fetch_remaining_pages<T, F, Fut>(
    total_pages: usize,
    paging: &PagingConfig,
    progress: &ProgressSender,
    mut fetch_page: F,
) -> Vec<T>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    let last_page = total_pages.min(paging.max_pages);
    if last_page < total_pages {
        warn!(total_pages, max_pages = paging.max_pages, "Listing truncated to page cap");
    }

    let batch_size = paging.effective_batch_size();
    let mut collected = Vec::new();
    let mut empty_batches = 0;
    let mut next_page = 2;

    while next_page <= last_page {
        let batch_end = (next_page + batch_size - 1).min(last_page);
        debug!(from = next_page, to = batch_end, total = last_page, "Fetching page batch");

        let results = join_all((next_page..=batch_end).map(&mut fetch_page)).await;

        let mut batch_items = 0;
        for (page, result) in (next_page..=batch_end).zip(results) {
            match result {
                Ok(items) => {
                    batch_items += items.len();
                    collected.extend(items);
                }
                Err(err) => warn!(page, error = %err, "Page fetch failed"),
            }
        }

        progress.emit(ProgressPhase::PageBatch, batch_end, last_page);

        if batch_items == 0 {
            empty_batches += 1;
            if empty_batches >= EMPTY_BATCH_LIMIT {
                info!(
                    stopped_at = batch_end,
                    total = last_page,
                    "Stopping pagination after repeated empty batches"
                );
                progress.emit(ProgressPhase::StoppedEarly, batch_end, last_page);
                return collected;
            }
        } else {
            empty_batches = 0;
        }

        next_page = batch_end + 1;
        if next_page <= last_page && !paging.batch_delay.is_zero() {
            tokio::time::sleep(paging.batch_delay).await;
        }
    }

    progress.emit(ProgressPhase::Done, last_page, last_page);
    collected
}

/// Number of pages needed for `total_count` rows
pub fn page_count(total_count: usize, rows_per_page: usize) -> usize {
    if rows_per_page == 0 {
        return 1;
    }
    total_count.div_ceil(rows_per_page).max(1)
}
