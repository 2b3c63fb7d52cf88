//! Resilient text fetcher
//!
//! Implements the `TextFetcher` port with reqwest. Each request is tried over
//! an ordered list of network paths: a direct call, or relays that forward
//! the upstream URL. The path that last succeeded is tried first on the next
//! call; other paths keep their configured order behind it.

use geozone_domain::ports::TextFetcher;
use geozone_domain::upstream::redact_url;
use geozone_domain::ResolveError;
use reqwest::Client;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use url::form_urlencoded;

/// Placeholder replaced by the percent-encoded upstream URL in relay templates
pub const URL_PLACEHOLDER: &str = "{url}";

/// One way of reaching an upstream URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkPath {
    /// Call the upstream URL as is
    Direct,
    /// Call a relay, e.g. `https://relay.example/fetch?url={url}`
    Relay { template: String },
}

impl NetworkPath {
    pub fn relay(template: impl Into<String>) -> Self {
        Self::Relay {
            template: template.into(),
        }
    }

    /// The URL actually requested for `upstream` on this path
    pub fn request_url(&self, upstream: &str) -> String {
        match self {
            Self::Direct => upstream.to_string(),
            Self::Relay { template } => {
                let encoded: String = form_urlencoded::byte_serialize(upstream.as_bytes()).collect();
                template.replace(URL_PLACEHOLDER, &encoded)
            }
        }
    }

    /// Short label for logs; relay templates are redacted
    pub fn label(&self) -> String {
        match self {
            Self::Direct => "direct".to_string(),
            Self::Relay { template } => format!("relay {}", redact_url(template)),
        }
    }
}

/// Configuration for [`ResilientFetchClient`]
#[derive(Debug, Clone)]
pub struct FetchClientConfig {
    /// Paths in priority order
    pub paths: Vec<NetworkPath>,
    /// Per-attempt timeout
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for FetchClientConfig {
    fn default() -> Self {
        Self {
            paths: vec![NetworkPath::Direct],
            timeout: Duration::from_secs(15),
            user_agent: concat!("geozone/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl FetchClientConfig {
    /// Direct access followed by the given relay templates
    pub fn with_relays<I, S>(relays: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut config = Self::default();
        config
            .paths
            .extend(relays.into_iter().map(NetworkPath::relay));
        config
    }
}

/// `TextFetcher` that falls back across network paths
///
/// Cloning is cheap and clones share the preferred-path memory.
#[derive(Clone)]
pub struct ResilientFetchClient {
    client: Client,
    paths: Arc<Vec<NetworkPath>>,
    preferred: Arc<AtomicUsize>,
}

impl ResilientFetchClient {
    /// Build a client from `config`
    ///
    /// # Errors
    ///
    /// `ResolveError::Config` if a relay template lacks the `{url}`
    /// placeholder or the HTTP client cannot be built
    pub fn new(config: FetchClientConfig) -> Result<Self, ResolveError> {
        let mut paths = config.paths;
        if paths.is_empty() {
            paths.push(NetworkPath::Direct);
        }
        if let Some(NetworkPath::Relay { template }) = paths.iter().find(|path| {
            matches!(path, NetworkPath::Relay { template } if !template.contains(URL_PLACEHOLDER))
        }) {
            return Err(ResolveError::config(format!(
                "relay template '{}' has no {} placeholder",
                redact_url(template),
                URL_PLACEHOLDER
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()
            .map_err(|err| ResolveError::config(format!("HTTP client: {}", err)))?;

        info!(
            paths = ?paths.iter().map(NetworkPath::label).collect::<Vec<_>>(),
            timeout_ms = config.timeout.as_millis() as u64,
            "Initializing ResilientFetchClient"
        );

        Ok(Self {
            client,
            paths: Arc::new(paths),
            preferred: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn paths(&self) -> &[NetworkPath] {
        &self.paths
    }

    /// Index of the path that will be tried first
    pub fn preferred_path(&self) -> usize {
        self.preferred.load(Ordering::Relaxed)
    }

    /// Path indices in attempt order: preferred first, then configured order
    fn attempt_order(paths: usize, preferred: usize) -> Vec<usize> {
        let preferred = if preferred < paths { preferred } else { 0 };
        std::iter::once(preferred)
            .chain((0..paths).filter(|&idx| idx != preferred))
            .collect()
    }
}

/// One attempt over one path; non-2xx is a failure
async fn attempt(client: &Client, request_url: &str) -> Result<String, String> {
    let response = client
        .get(request_url)
        .send()
        .await
        .map_err(|err| err.without_url().to_string())?;

    let status = response.status();
    if !status.is_success() {
        return Err(format!("HTTP {}", status));
    }

    response
        .text()
        .await
        .map_err(|err| format!("reading body: {}", err.without_url()))
}

impl TextFetcher for ResilientFetchClient {
    #[instrument(skip(self, url), fields(url = %redact_url(url)))]
    fn fetch_text(
        &self,
        url: &str,
    ) -> impl std::future::Future<Output = Result<String, ResolveError>> + Send {
        let client = self.client.clone();
        let paths = self.paths.clone();
        let preferred = self.preferred.clone();
        let url = url.to_string();

        async move {
            let order = Self::attempt_order(paths.len(), preferred.load(Ordering::Relaxed));
            let mut last = String::from("no network path attempted");

            for (attempt_no, idx) in order.iter().copied().enumerate() {
                let path = &paths[idx];
                let request_url = path.request_url(&url);
                debug!(path = %path.label(), attempt = attempt_no + 1, "Fetching");

                match attempt(&client, &request_url).await {
                    Ok(body) => {
                        if preferred.swap(idx, Ordering::Relaxed) != idx {
                            info!(path = %path.label(), "Preferred network path changed");
                        }
                        debug!(path = %path.label(), bytes = body.len(), "Fetched");
                        return Ok(body);
                    }
                    Err(reason) => {
                        warn!(path = %path.label(), error = %reason, "Network path failed");
                        last = reason;
                    }
                }
            }

            error!(url = %redact_url(&url), attempts = order.len(), last = %last, "All network paths failed");
            Err(ResolveError::AllPathsFailed {
                url: redact_url(&url),
                attempts: order.len(),
                last,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_url_encodes_upstream() {
        let path = NetworkPath::relay("https://relay.test/fetch?target={url}");
        assert_eq!(
            path.request_url("https://api.test/a?b=1&c=한"),
            "https://relay.test/fetch?target=https%3A%2F%2Fapi.test%2Fa%3Fb%3D1%26c%3D%ED%95%9C"
        );
        assert_eq!(NetworkPath::Direct.request_url("https://api.test/x"), "https://api.test/x");
    }

    #[test]
    fn test_attempt_order_prefers_last_success() {
        assert_eq!(ResilientFetchClient::attempt_order(3, 0), vec![0, 1, 2]);
        assert_eq!(ResilientFetchClient::attempt_order(3, 2), vec![2, 0, 1]);
        assert_eq!(ResilientFetchClient::attempt_order(2, 7), vec![0, 1]);
    }

    #[test]
    fn test_template_without_placeholder_is_rejected() {
        let config = FetchClientConfig::with_relays(["https://relay.test/fetch"]);
        let err = ResilientFetchClient::new(config).err().unwrap();
        assert!(matches!(err, ResolveError::Config(_)));
    }

    #[test]
    fn test_empty_paths_default_to_direct() {
        let config = FetchClientConfig {
            paths: Vec::new(),
            ..Default::default()
        };
        let client = ResilientFetchClient::new(config).unwrap();
        assert_eq!(client.paths(), &[NetworkPath::Direct]);
    }
}
