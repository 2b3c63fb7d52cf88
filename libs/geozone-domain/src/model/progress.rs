//! Progress events for long-running, batched fetches

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::trace;

/// Which part of the pipeline reported progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressPhase {
    /// First page fetched, total known
    FirstPage,
    /// A batch of follow-up pages completed
    PageBatch,
    /// Pagination stopped after repeated empty batches
    StoppedEarly,
    /// All pages fetched
    Done,
}

/// A structured progress update
///
/// `current` is the last page covered so far and `total` the number of pages
/// the provider announced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    pub phase: ProgressPhase,
    pub current: usize,
    pub total: usize,
}

/// Optional sink for progress events
///
/// A dropped receiver is not an error; callers abandon progress by dropping it.
#[derive(Debug, Clone, Default)]
pub struct ProgressSender(Option<UnboundedSender<ProgressEvent>>);

impl ProgressSender {
    pub fn new(sender: UnboundedSender<ProgressEvent>) -> Self {
        Self(Some(sender))
    }

    /// A sender that discards every event
    pub fn none() -> Self {
        Self(None)
    }

    pub fn emit(&self, phase: ProgressPhase, current: usize, total: usize) {
        if let Some(sender) = &self.0 {
            let event = ProgressEvent {
                phase,
                current,
                total,
            };
            if sender.send(event).is_err() {
                trace!(?event, "Progress receiver dropped");
            }
        }
    }
}

impl From<UnboundedSender<ProgressEvent>> for ProgressSender {
    fn from(sender: UnboundedSender<ProgressEvent>) -> Self {
        Self::new(sender)
    }
}
