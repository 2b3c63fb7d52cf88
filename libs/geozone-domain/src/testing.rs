//! In-memory fakes shared by the unit tests

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::ResolveError;
use crate::ports::TextFetcher;

/// Fetcher answering from canned responses keyed by URL substring
///
/// The first registered pattern contained in the URL wins, so register
/// specific patterns before general ones.
#[derive(Clone, Default)]
pub(crate) struct FakeFetcher {
    routes: Vec<(String, Result<String, ResolveError>)>,
    calls: Arc<Mutex<Vec<String>>>,
    delay: Option<Duration>,
}

impl FakeFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on(mut self, pattern: &str, body: impl Into<String>) -> Self {
        self.routes.push((pattern.to_string(), Ok(body.into())));
        self
    }

    pub(crate) fn fail(mut self, pattern: &str, err: ResolveError) -> Self {
        self.routes.push((pattern.to_string(), Err(err)));
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn calls_matching(&self, pattern: &str) -> usize {
        self.calls().iter().filter(|url| url.contains(pattern)).count()
    }
}

impl TextFetcher for FakeFetcher {
    fn fetch_text(&self, url: &str) -> impl Future<Output = Result<String, ResolveError>> + Send {
        self.calls.lock().unwrap().push(url.to_string());
        let response = self
            .routes
            .iter()
            .find(|(pattern, _)| url.contains(pattern.as_str()))
            .map(|(_, response)| response.clone())
            .unwrap_or_else(|| {
                Err(ResolveError::AllPathsFailed {
                    url: url.to_string(),
                    attempts: 1,
                    last: "no canned response".to_string(),
                })
            });
        let delay = self.delay;

        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            response
        }
    }
}
