//! Bearer-token management for the statistics service
//!
//! The token is cached until it is within the refresh margin of its expiry.
//! Refreshes are single-flight: the cache lock is held across the
//! authentication call, so concurrent callers wait for the one in-flight
//! refresh and then reuse its token.

use chrono::{DateTime, Duration as TimeDelta, TimeZone, Utc};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::error::{ResolveError, Result};
use crate::geometry::geojson::value_as_string;
use crate::ports::{Clock, TextFetcher};
use crate::upstream::{build_url, expect_json, redact_url, str_field};

const ENDPOINT: &str = "statistics-auth";

/// Timeouts above this are absolute epoch milliseconds, below it relative seconds
const EPOCH_MILLIS_FLOOR: i64 = 100_000_000_000;

/// An opaque bearer credential with its expiry
#[derive(Clone, PartialEq)]
pub struct AuthToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl AuthToken {
    pub fn new(value: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Whether the token stays valid for longer than `margin` after `now`
    pub fn is_fresh(&self, now: DateTime<Utc>, margin: TimeDelta) -> bool {
        self.expires_at - now > margin
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("value", &"***")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Owns the statistics-service token for one engine instance
pub struct TokenManager<F, C> {
    fetcher: Arc<F>,
    clock: Arc<C>,
    auth_url: String,
    consumer_key: Option<String>,
    consumer_secret: Option<String>,
    refresh_margin: TimeDelta,
    token: Mutex<Option<AuthToken>>,
}

impl<F, C> TokenManager<F, C>
where
    F: TextFetcher,
    C: Clock,
{
    pub fn new(
        fetcher: Arc<F>,
        clock: Arc<C>,
        statistics_base: &str,
        consumer_key: Option<String>,
        consumer_secret: Option<String>,
        refresh_margin: Duration,
    ) -> Self {
        Self {
            fetcher,
            clock,
            auth_url: format!(
                "{}/auth/authentication.json",
                statistics_base.trim_end_matches('/')
            ),
            consumer_key,
            consumer_secret,
            refresh_margin: TimeDelta::from_std(refresh_margin)
                .unwrap_or_else(|_| TimeDelta::minutes(5)),
            token: Mutex::new(None),
        }
    }

    /// Return a token valid beyond the refresh margin, authenticating if needed
    ///
    /// # Errors
    ///
    /// `ResolveError::Auth` if credentials are missing or rejected
    #[instrument(skip(self))]
    pub async fn get_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        let now = self.clock.now();

        if let Some(token) = cached.as_ref() {
            if token.is_fresh(now, self.refresh_margin) {
                debug!(expires_at = %token.expires_at, "Reusing cached token");
                return Ok(token.value.clone());
            }
            debug!(expires_at = %token.expires_at, "Cached token is about to expire");
        }

        let fresh = self.authenticate(now).await?;
        info!(expires_at = %fresh.expires_at, "Statistics token refreshed");
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    /// Drop the cached token if it is still `rejected`
    ///
    /// A token refreshed by another caller after `rejected` was handed out is
    /// kept. Returns whether the cache was cleared.
    pub async fn invalidate(&self, rejected: &str) -> bool {
        let mut cached = self.token.lock().await;
        if cached.as_ref().is_some_and(|token| token.value == rejected) {
            *cached = None;
            warn!("Statistics token invalidated");
            true
        } else {
            debug!("Rejected token already replaced");
            false
        }
    }

    /// The currently cached token, if any
    pub async fn current(&self) -> Option<AuthToken> {
        self.token.lock().await.clone()
    }

    async fn authenticate(&self, now: DateTime<Utc>) -> Result<AuthToken> {
        let (Some(key), Some(secret)) = (
            self.consumer_key.as_deref(),
            self.consumer_secret.as_deref(),
        ) else {
            return Err(ResolveError::auth(
                "statistics consumer key/secret are not configured",
            ));
        };

        let url = build_url(
            &self.auth_url,
            &[("consumer_key", key), ("consumer_secret", secret)],
        );
        debug!(url = %redact_url(&url), "Authenticating with statistics service");

        let body = self.fetcher.fetch_text(&url).await?;
        let value = expect_json(&body, ENDPOINT)?;

        let code = value.get("errCd").and_then(value_as_string);
        if code.as_deref().is_some_and(|code| code != "0") {
            let message = str_field(&value, &["errMsg"]).unwrap_or_default();
            return Err(ResolveError::auth(format!(
                "statistics authentication rejected: {} ({})",
                message,
                code.unwrap_or_default()
            )));
        }

        let result = value
            .get("result")
            .ok_or_else(|| ResolveError::parse(ENDPOINT, "missing result"))?;
        let access_token = str_field(result, &["accessToken"])
            .ok_or_else(|| ResolveError::parse(ENDPOINT, "missing accessToken"))?;
        let expires_at = result
            .get("accessTimeout")
            .and_then(|timeout| expiry_from_timeout(timeout, now))
            .ok_or_else(|| ResolveError::parse(ENDPOINT, "missing or invalid accessTimeout"))?;

        Ok(AuthToken::new(access_token, expires_at))
    }
}

/// Interpret the provider's timeout as an expiry instant
///
/// Large values are absolute epoch milliseconds; small ones are a lifetime in
/// seconds counted from `now`.
fn expiry_from_timeout(timeout: &Value, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let raw = value_as_string(timeout)?.parse::<i64>().ok()?;
    if raw >= EPOCH_MILLIS_FLOOR {
        Utc.timestamp_millis_opt(raw).single()
    } else if raw > 0 {
        Some(now + TimeDelta::seconds(raw))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::MockClock;
    use crate::testing::FakeFetcher;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn clock_at(now: DateTime<Utc>) -> MockClock {
        let mut clock = MockClock::new();
        clock.expect_now().returning(move || now);
        clock
    }

    fn auth_body(expires_at: DateTime<Utc>) -> String {
        format!(
            r#"{{"errCd": 0, "errMsg": "Success", "result": {{"accessToken": "tok-1", "accessTimeout": "{}"}}}}"#,
            expires_at.timestamp_millis()
        )
    }

    fn manager(fetcher: FakeFetcher, clock: MockClock) -> TokenManager<FakeFetcher, MockClock> {
        TokenManager::new(
            Arc::new(fetcher),
            Arc::new(clock),
            "https://sgis.test/OpenAPI3",
            Some("key".to_string()),
            Some("secret".to_string()),
            Duration::from_secs(300),
        )
    }

    #[tokio::test]
    async fn test_token_is_cached_while_fresh() {
        let now = fixed_now();
        let fetcher = FakeFetcher::new().on("authentication", auth_body(now + TimeDelta::hours(4)));
        let tokens = manager(fetcher.clone(), clock_at(now));

        assert_eq!(tokens.get_token().await.unwrap(), "tok-1");
        assert_eq!(tokens.get_token().await.unwrap(), "tok-1");

        assert_eq!(fetcher.calls_matching("authentication"), 1);
    }

    #[tokio::test]
    async fn test_token_inside_margin_is_refreshed() {
        let now = fixed_now();
        let fetcher =
            FakeFetcher::new().on("authentication", auth_body(now + TimeDelta::minutes(4)));
        let tokens = manager(fetcher.clone(), clock_at(now));

        tokens.get_token().await.unwrap();
        tokens.get_token().await.unwrap();

        assert_eq!(fetcher.calls_matching("authentication"), 2);
    }

    #[tokio::test]
    async fn test_relative_timeout_in_seconds() {
        let now = fixed_now();
        let body = r#"{"errCd": "0", "result": {"accessToken": "tok-2", "accessTimeout": 14400}}"#;
        let tokens = manager(FakeFetcher::new().on("authentication", body), clock_at(now));

        tokens.get_token().await.unwrap();
        let token = tokens.current().await.unwrap();

        assert_eq!(token.value(), "tok-2");
        assert_eq!(token.expires_at(), now + TimeDelta::hours(4));
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_refresh() {
        let now = fixed_now();
        let fetcher = FakeFetcher::new()
            .on("authentication", auth_body(now + TimeDelta::hours(4)))
            .with_delay(Duration::from_millis(20));
        let tokens = Arc::new(manager(fetcher.clone(), clock_at(now)));

        let (a, b, c) = tokio::join!(tokens.get_token(), tokens.get_token(), tokens.get_token());

        assert_eq!(a.unwrap(), "tok-1");
        assert_eq!(b.unwrap(), "tok-1");
        assert_eq!(c.unwrap(), "tok-1");
        assert_eq!(fetcher.calls_matching("authentication"), 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_reauthentication() {
        let now = fixed_now();
        let fetcher = FakeFetcher::new().on("authentication", auth_body(now + TimeDelta::hours(4)));
        let tokens = manager(fetcher.clone(), clock_at(now));

        let token = tokens.get_token().await.unwrap();
        assert!(tokens.invalidate(&token).await);
        assert!(tokens.current().await.is_none());
        tokens.get_token().await.unwrap();

        assert_eq!(fetcher.calls_matching("authentication"), 2);
    }

    #[tokio::test]
    async fn test_invalidate_keeps_a_newer_token() {
        let now = fixed_now();
        let fetcher = FakeFetcher::new().on("authentication", auth_body(now + TimeDelta::hours(4)));
        let tokens = manager(fetcher.clone(), clock_at(now));

        let fresh = tokens.get_token().await.unwrap();
        assert!(!tokens.invalidate("stale-token").await);

        assert_eq!(tokens.current().await.map(|token| token.value().to_string()), Some(fresh));
        tokens.get_token().await.unwrap();
        assert_eq!(fetcher.calls_matching("authentication"), 1);
    }

    #[tokio::test]
    async fn test_rejected_credentials() {
        let body = r#"{"errCd": -401, "errMsg": "인증 정보가 존재하지 않습니다"}"#;
        let tokens = manager(FakeFetcher::new().on("authentication", body), clock_at(fixed_now()));

        let err = tokens.get_token().await.unwrap_err();
        assert!(matches!(err, ResolveError::Auth(_)));
    }

    #[tokio::test]
    async fn test_missing_credentials_skip_network() {
        let fetcher = FakeFetcher::new();
        let tokens: TokenManager<FakeFetcher, MockClock> = TokenManager::new(
            Arc::new(fetcher.clone()),
            Arc::new(clock_at(fixed_now())),
            "https://sgis.test/OpenAPI3/",
            None,
            Some("secret".to_string()),
            Duration::from_secs(300),
        );

        assert!(matches!(tokens.get_token().await, Err(ResolveError::Auth(_))));
        assert!(fetcher.calls().is_empty());
    }

    #[test]
    fn test_token_debug_is_masked() {
        let token = AuthToken::new("secret-token", fixed_now());
        assert!(!format!("{:?}", token).contains("secret-token"));
    }
}
