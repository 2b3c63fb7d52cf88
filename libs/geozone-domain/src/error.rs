//! Domain errors for resolution operations
//!
//! Every adapter converts its infrastructure failures (HTTP client, I/O, JSON)
//! into one of these variants at the port boundary, so no infrastructure error
//! types reach the services.

use thiserror::Error;

/// Errors that can occur while resolving addresses, zones and boundaries
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    /// No result after exhausting every in-policy fallback
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request was valid but the provider returned an explicitly empty result
    #[error("No results: {0}")]
    NoResults(String),

    /// Missing or rejected credential
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Response body was not in an expected shape
    #[error("Unexpected response from {endpoint}: {detail}")]
    Parse { endpoint: String, detail: String },

    /// Every configured network path failed for a request
    #[error("All {attempts} network path(s) failed for {url}: {last}")]
    AllPathsFailed {
        url: String,
        attempts: usize,
        last: String,
    },

    /// Coordinates could not be reprojected
    #[error("Projection error: {0}")]
    Projection(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ResolveError {
    /// Create a not-found error with a message
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a no-results error with a message
    pub fn no_results(msg: impl Into<String>) -> Self {
        Self::NoResults(msg.into())
    }

    /// Create an authentication error with a message
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// Create a parse error for the given endpoint
    pub fn parse(endpoint: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Parse {
            endpoint: endpoint.into(),
            detail: detail.into(),
        }
    }

    /// Create a config error with a message
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the failure belongs to the retryable network category
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::AllPathsFailed { .. })
    }
}

/// Result type alias for resolution operations
pub type Result<T> = std::result::Result<T, ResolveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ResolveError::parse("zone-search", "missing items");
        assert_eq!(
            err.to_string(),
            "Unexpected response from zone-search: missing items"
        );
    }

    #[test]
    fn test_all_paths_failed_is_retryable() {
        let err = ResolveError::AllPathsFailed {
            url: "https://example.test".to_string(),
            attempts: 3,
            last: "HTTP 503".to_string(),
        };
        assert!(err.is_retryable());
        assert!(err.to_string().contains("3 network path(s)"));
        assert!(!ResolveError::not_found("x").is_retryable());
    }
}
