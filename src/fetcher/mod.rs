//! Activity sources and the paginated fetch engine

use crate::ActivityRecord;
use async_trait::async_trait;
use std::fmt;

pub mod pagination;
pub mod strava_config;
pub mod strava_http;

/// Fetcher errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetcherError {
    /// Access token rejected (HTTP 401)
    #[error("authentication rejected by upstream: {body}")]
    Unauthorized {
        /// Response body, kept for diagnostics
        body: String,
    },

    /// Request quota exhausted (HTTP 429)
    #[error("rate limit exceeded")]
    RateLimited,

    /// Any other non-success status
    #[error("HTTP error {status}: {body}")]
    Http {
        /// Status code
        status: u16,
        /// Response body, kept for diagnostics
        body: String,
    },

    /// Connection failure or timeout
    #[error("network error: {0}")]
    Network(String),

    /// Response body did not have the expected shape
    #[error("parse error: {0}")]
    Parse(String),

    /// Client could not be built from the supplied configuration
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl FetcherError {
    /// Short hint telling the user what to do about this error
    pub fn remediation(&self) -> &'static str {
        match self {
            FetcherError::Unauthorized { .. } => {
                "Re-authenticate and export a fresh STRAVA_ACCESS_TOKEN"
            }
            FetcherError::RateLimited => "Wait for the rate-limit window to reset, then retry",
            FetcherError::Http { .. } | FetcherError::Network(_) | FetcherError::Parse(_) => {
                "Check network connectivity and the API base URL, then retry"
            }
            FetcherError::InvalidConfig(_) => "Fix the client configuration and retry",
        }
    }
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;

/// Query for one page of the activity listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    /// Lower bound, Unix seconds
    pub after: i64,
    /// Upper bound, Unix seconds
    pub before: Option<i64>,
    /// 1-based page number
    pub page: u32,
    /// Records per page
    pub per_page: u32,
}

impl PageQuery {
    /// Query parameters in the order they are sent upstream
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("after", self.after.to_string())];
        if let Some(before) = self.before {
            params.push(("before", before.to_string()));
        }
        params.push(("page", self.page.to_string()));
        params.push(("per_page", self.per_page.to_string()));
        params
    }
}

/// A source of activity pages
///
/// The HTTP client implements this; tests substitute scripted sources.
#[async_trait]
pub trait ActivitySource: Send + Sync {
    /// Fetch a single page of activities
    ///
    /// # Errors
    /// Returns a [`FetcherError`] classifying why the page could not be read.
    async fn fetch_page(&self, query: &PageQuery) -> FetcherResult<Vec<ActivityRecord>>;
}

#[async_trait]
impl<T: ActivitySource + ?Sized> ActivitySource for std::sync::Arc<T> {
    async fn fetch_page(&self, query: &PageQuery) -> FetcherResult<Vec<ActivityRecord>> {
        (**self).fetch_page(query).await
    }
}

/// Result of one paginated fetch
///
/// Network-layer failures never escape the engine; they end up here along
/// with whatever records were gathered before the failure.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Pages were exhausted or the record cap was reached
    Complete(Vec<ActivityRecord>),
    /// Credentials rejected; earlier pages are discarded
    AuthFailed,
    /// Upstream throttled the client; records from prior pages
    RateLimited(Vec<ActivityRecord>),
    /// Connection, timeout, unexpected status or malformed body
    TransientFailure {
        /// Records from prior pages
        records: Vec<ActivityRecord>,
        /// Error that stopped the fetch
        error: FetcherError,
    },
}

impl FetchOutcome {
    /// Records carried by this outcome (empty for `AuthFailed`)
    pub fn records(&self) -> &[ActivityRecord] {
        match self {
            FetchOutcome::Complete(records) | FetchOutcome::RateLimited(records) => records,
            FetchOutcome::TransientFailure { records, .. } => records,
            FetchOutcome::AuthFailed => &[],
        }
    }

    /// Consume the outcome and return its records
    pub fn into_records(self) -> Vec<ActivityRecord> {
        match self {
            FetchOutcome::Complete(records) | FetchOutcome::RateLimited(records) => records,
            FetchOutcome::TransientFailure { records, .. } => records,
            FetchOutcome::AuthFailed => Vec::new(),
        }
    }

    /// Number of records carried
    pub fn record_count(&self) -> usize {
        self.records().len()
    }

    /// Variant tag without the payload
    pub fn kind(&self) -> OutcomeKind {
        match self {
            FetchOutcome::Complete(_) => OutcomeKind::Complete,
            FetchOutcome::AuthFailed => OutcomeKind::AuthFailed,
            FetchOutcome::RateLimited(_) => OutcomeKind::RateLimited,
            FetchOutcome::TransientFailure { .. } => OutcomeKind::TransientFailure,
        }
    }

    /// True when the fetch stopped early but still returned records
    pub fn is_partial(&self) -> bool {
        matches!(
            self,
            FetchOutcome::RateLimited(_) | FetchOutcome::TransientFailure { .. }
        ) && self.record_count() > 0
    }
}

/// Payload-free tag of a [`FetchOutcome`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// Fetch finished normally
    Complete,
    /// Credentials rejected
    AuthFailed,
    /// Throttled by upstream
    RateLimited,
    /// Network or protocol failure
    TransientFailure,
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OutcomeKind::Complete => "complete",
            OutcomeKind::AuthFailed => "auth_failed",
            OutcomeKind::RateLimited => "rate_limited",
            OutcomeKind::TransientFailure => "transient_failure",
        };
        write!(f, "{}", s)
    }
}
