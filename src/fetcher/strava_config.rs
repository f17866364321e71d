//! Strava API configuration
//!
//! Endpoint constants plus the immutable [`ClientConfig`] an HTTP client is
//! built from. The config is constructed once per client and never mutated.

use std::time::Duration;

use crate::fetcher::{FetcherError, FetcherResult};

/// Production API base URL
pub const STRAVA_API_BASE_URL: &str = "https://www.strava.com/api/v3";

/// Activity listing endpoint path
pub const ACTIVITIES_ENDPOINT: &str = "/athlete/activities";

/// Authenticated athlete endpoint path
pub const ATHLETE_ENDPOINT: &str = "/athlete";

/// Upstream maximum for `per_page`
pub const MAX_PER_PAGE: u32 = 200;

/// Per-request timeout when none is configured
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// How far back the health check's activity check looks
pub const HEALTH_CHECK_LOOKBACK_DAYS: i64 = 90;

/// Configuration for a [`StravaHttpClient`](crate::fetcher::strava_http::StravaHttpClient)
#[derive(Clone)]
pub struct ClientConfig {
    base_url: String,
    access_token: String,
    request_timeout: Duration,
    user_agent: String,
}

impl ClientConfig {
    /// Config for the production API with default timeout
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            base_url: STRAVA_API_BASE_URL.to_string(),
            access_token: access_token.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: format!("strava-extractor/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Override the base URL (trailing slashes are dropped)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Override the User-Agent header
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Base URL without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Bearer token
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Per-request timeout
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// User-Agent header value
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Reject an empty token, a zero timeout or an unparsable base URL
    pub fn validate(&self) -> FetcherResult<()> {
        if self.access_token.trim().is_empty() {
            return Err(FetcherError::InvalidConfig(
                "access token must not be empty".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(FetcherError::InvalidConfig(
                "request timeout must be greater than zero".to_string(),
            ));
        }
        reqwest::Url::parse(&self.base_url).map_err(|e| {
            FetcherError::InvalidConfig(format!("invalid base URL '{}': {}", self.base_url, e))
        })?;
        Ok(())
    }
}

// Token stays out of logs.
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("access_token", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
