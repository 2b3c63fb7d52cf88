//! Environment-driven configuration

use anyhow::{Context, Result};
use geozone_domain::upstream::Credentials;
use geozone_domain::ResolverConfig;
use geozone_http::FetchClientConfig;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Service configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub resolver: ResolverConfig,
    pub fetch: FetchClientConfig,
    /// Bundled boundary dataset; the last-resort boundary strategy is off without it
    pub dataset_path: Option<PathBuf>,
    pub log_json: bool,
}

impl AppConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`; blank values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let host = get("GEOZONE_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match get("GEOZONE_PORT") {
            Some(port) => port
                .parse()
                .with_context(|| format!("GEOZONE_PORT '{}' is not a port number", port))?,
            None => 3000,
        };

        let credentials = Credentials {
            geodata_key: get("GEOZONE_VWORLD_KEY"),
            zone_service_key: get("GEOZONE_DATA_GO_KR_KEY"),
            statistics_key: get("GEOZONE_SGIS_KEY"),
            statistics_secret: get("GEOZONE_SGIS_SECRET"),
        };
        let mut resolver = ResolverConfig {
            credentials,
            ..Default::default()
        };
        if let Some(batch) = get("GEOZONE_PAGE_BATCH") {
            resolver.paging.batch_size = batch
                .parse()
                .with_context(|| format!("GEOZONE_PAGE_BATCH '{}' is not a number", batch))?;
        }

        let relays: Vec<String> = get("GEOZONE_RELAYS")
            .map(|relays| {
                relays
                    .split(',')
                    .map(str::trim)
                    .filter(|relay| !relay.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let mut fetch = FetchClientConfig::with_relays(relays);
        if let Some(secs) = get("GEOZONE_HTTP_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .with_context(|| format!("GEOZONE_HTTP_TIMEOUT_SECS '{}' is not a number", secs))?;
            fetch.timeout = Duration::from_secs(secs);
        }

        let dataset_path = get("GEOZONE_DATASET_PATH").map(PathBuf::from);

        let log_json = get("GEOZONE_LOG_JSON")
            .is_some_and(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"));

        Ok(Self {
            host,
            port,
            resolver,
            fetch,
            dataset_path,
            log_json,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Log the optional settings left unset; called once tracing is up
    pub fn log_unset(&self) {
        let credentials = &self.resolver.credentials;
        for (name, value) in [
            ("GEOZONE_VWORLD_KEY", &credentials.geodata_key),
            ("GEOZONE_DATA_GO_KR_KEY", &credentials.zone_service_key),
            ("GEOZONE_SGIS_KEY", &credentials.statistics_key),
            ("GEOZONE_SGIS_SECRET", &credentials.statistics_secret),
        ] {
            if value.is_none() {
                info!(variable = name, "Credential not set, dependent lookups will fail with 401");
            }
        }
        if self.dataset_path.is_none() {
            info!("GEOZONE_DATASET_PATH not set, bundled boundary fallback disabled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geozone_http::NetworkPath;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();

        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
        assert_eq!(config.fetch.paths, vec![NetworkPath::Direct]);
        assert!(config.resolver.credentials.geodata_key.is_none());
        assert!(config.dataset_path.is_none());
        assert!(!config.log_json);
    }

    #[test]
    fn test_full_environment() {
        let config = config(&[
            ("GEOZONE_PORT", "8080"),
            ("GEOZONE_VWORLD_KEY", "vw"),
            ("GEOZONE_SGIS_SECRET", "secret"),
            ("GEOZONE_RELAYS", "https://a.test/?u={url}, ,https://b.test/{url}"),
            ("GEOZONE_HTTP_TIMEOUT_SECS", "7"),
            ("GEOZONE_PAGE_BATCH", "5"),
            ("GEOZONE_DATASET_PATH", "/data/boundaries.geojson"),
            ("GEOZONE_LOG_JSON", "true"),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.resolver.credentials.geodata_key.as_deref(), Some("vw"));
        assert_eq!(config.resolver.credentials.statistics_secret.as_deref(), Some("secret"));
        assert_eq!(config.fetch.paths.len(), 3);
        assert_eq!(config.fetch.paths[2], NetworkPath::relay("https://b.test/{url}"));
        assert_eq!(config.fetch.timeout, Duration::from_secs(7));
        assert_eq!(config.resolver.paging.batch_size, 5);
        assert!(config.dataset_path.is_some());
        assert!(config.log_json);
    }

    #[test]
    fn test_blank_values_are_unset() {
        let config = config(&[("GEOZONE_VWORLD_KEY", "  "), ("GEOZONE_HOST", "")]).unwrap();
        assert!(config.resolver.credentials.geodata_key.is_none());
        assert_eq!(config.host, "0.0.0.0");
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        assert!(config(&[("GEOZONE_PORT", "http")]).is_err());
    }
}
